use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// 面向用户的通用推理失败提示
pub const GENERIC_FAILURE_NOTICE: &str =
    "An error occurred while classifying the image. Please try again.";

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No image selected")]
    NoImageSelected,

    #[error("Classification already in progress")]
    ClassificationInProgress,

    #[error("File too large: {0} bytes, max allowed: {1} bytes")]
    FileTooLarge(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ClassifyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClassifyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ClassifyError::NoImageSelected => StatusCode::BAD_REQUEST,
            ClassifyError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            ClassifyError::Base64(_) => StatusCode::BAD_REQUEST,
            ClassifyError::Json(_) => StatusCode::BAD_REQUEST,
            ClassifyError::FileTooLarge(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            ClassifyError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ClassifyError::ClassificationInProgress => StatusCode::CONFLICT,
            ClassifyError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            ClassifyError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ClassifyError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            ClassifyError::ModelUnavailable => "MODEL_UNAVAILABLE",
            ClassifyError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            ClassifyError::Inference(_) => "INFERENCE_ERROR",
            ClassifyError::InvalidInput(_) => "INVALID_INPUT",
            ClassifyError::NoImageSelected => "NO_IMAGE_SELECTED",
            ClassifyError::ClassificationInProgress => "CLASSIFICATION_IN_PROGRESS",
            ClassifyError::FileTooLarge(_, _) => "FILE_TOO_LARGE",
            ClassifyError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ClassifyError::Config(_) => "CONFIG_ERROR",
            ClassifyError::Io(_) => "IO_ERROR",
            ClassifyError::Json(_) => "JSON_ERROR",
            ClassifyError::Base64(_) => "BASE64_DECODE_ERROR",
            ClassifyError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            ClassifyError::Http(_) => "HTTP_ERROR",
            ClassifyError::Shape(_) => "TENSOR_SHAPE_ERROR",
            ClassifyError::Ort(_) => "ORT_ERROR",
            ClassifyError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 页面上展示给用户的提示文本
    ///
    /// 推理阶段的各类失败统一折叠为通用提示，细节只进日志。
    pub fn user_message(&self) -> String {
        match self {
            ClassifyError::UnsupportedFormat(_)
            | ClassifyError::InvalidInput(_)
            | ClassifyError::ImageDecode(_)
            | ClassifyError::Base64(_) => "Please select an image file".to_string(),
            ClassifyError::FileTooLarge(_, max) => {
                format!("File is too large, the limit is {} MB", max / 1024 / 1024)
            }
            ClassifyError::NoImageSelected => "Please select an image first".to_string(),
            ClassifyError::ModelUnavailable => {
                "Model not loaded yet. Please wait and try again.".to_string()
            }
            ClassifyError::ModelLoad(_) => {
                "Failed to load the AI model. Please refresh and try again.".to_string()
            }
            ClassifyError::ClassificationInProgress => {
                "A classification is already in progress".to_string()
            }
            _ => GENERIC_FAILURE_NOTICE.to_string(),
        }
    }
}

impl IntoResponse for ClassifyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.user_message(),
                "detail": self.to_string(),
            }
        });

        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self, status);
        } else {
            tracing::warn!("Request rejected: {} ({})", self, status);
        }

        (status, axum::Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_failures_collapse_to_generic_notice() {
        let errors = [
            ClassifyError::Inference("bad output".to_string()),
            ClassifyError::Internal("join".to_string()),
            ClassifyError::ImageProcessing("resize".to_string()),
        ];
        for err in errors {
            assert_eq!(err.user_message(), GENERIC_FAILURE_NOTICE);
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn rejection_codes_are_client_errors() {
        let err = ClassifyError::UnsupportedFormat("text/plain".to_string());
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
        assert_eq!(err.user_message(), "Please select an image file");

        assert_eq!(
            ClassifyError::ClassificationInProgress.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ClassifyError::ModelUnavailable.user_message(),
            "Model not loaded yet. Please wait and try again."
        );
    }
}
