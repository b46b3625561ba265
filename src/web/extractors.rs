use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

/// 验证的JSON提取器
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: for<'de> Deserialize<'de> + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| ValidationError::JsonParse(err.body_text()))?;

        value.validate().map_err(ValidationError::Validation)?;

        Ok(ValidatedJson(value))
    }
}

/// 验证trait
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// 验证错误类型
#[derive(Debug)]
pub enum ValidationError {
    JsonParse(String),
    Validation(String),
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        tracing::warn!("Request rejected: {}", self);

        let body = serde_json::json!({
            "error": {
                "code": "VALIDATION_ERROR",
                "message": self.to_string()
            }
        });

        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::JsonParse(msg) => write!(f, "JSON parse error: {}", msg),
            ValidationError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl Validate for crate::web::handlers::SelectImageRequest {
    fn validate(&self) -> Result<(), String> {
        if self.image.trim().is_empty() {
            return Err("Image data cannot be empty".to_string());
        }

        if let Some(ref media_type) = self.media_type {
            if media_type.trim().is_empty() {
                return Err("Media type cannot be blank".to_string());
            }
        }

        Ok(())
    }
}

/// 请求ID提取器，优先使用 `X-Request-ID` 头
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get("X-Request-ID")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(RequestId(request_id))
    }
}
