use crate::{
    classify::ViewState,
    image::ImageLoader,
    utils::error::ClassifyError,
    web::extractors::{RequestId, ValidatedJson},
    AppState, Result,
};
use axum::{
    extract::{Multipart, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct SelectImageRequest {
    /// Base64编码的图像数据，可带数据URL前缀
    pub image: String,

    /// 媒体类型，缺省时取数据URL头部，再缺省时按字节嗅探
    #[serde(default)]
    pub media_type: Option<String>,

    /// 文件名
    #[serde(default)]
    pub name: Option<String>,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// 当前页面状态
pub async fn state_handler(
    State(state): State<Arc<AppState>>,
    RequestId(request_id): RequestId,
) -> Json<ApiResponse<ViewState>> {
    Json(ApiResponse::success(state.view(), request_id))
}

/// Multipart文件选择 / 拖放
pub async fn select_upload_handler(
    State(state): State<Arc<AppState>>,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ViewState>>> {
    tracing::info!("Processing image selection: request_id={}", request_id);

    let mut selected: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ClassifyError::InvalidInput(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();

        if field_name != "file" {
            tracing::debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let name = field.file_name().unwrap_or("upload").to_string();
        let media_type = field.content_type().unwrap_or_default().to_string();

        // 先校验类型，非图像不读取内容
        if !ImageLoader::is_image_media_type(&media_type) {
            return Err(reject(&state, ClassifyError::UnsupportedFormat(media_type)));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ClassifyError::InvalidInput(format!("Failed to read file data: {}", e)))?;

        tracing::debug!("Received file: {} ({}), {} bytes", name, media_type, data.len());
        selected = Some((name, media_type, data.to_vec()));
        break;
    }

    let (name, media_type, data) =
        selected.ok_or_else(|| ClassifyError::InvalidInput("No image file provided".to_string()))?;

    let view = state.select_image(name, media_type, data).await?;
    Ok(Json(ApiResponse::success(view, request_id)))
}

/// JSON base64 选择
pub async fn select_base64_handler(
    State(state): State<Arc<AppState>>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<SelectImageRequest>,
) -> Result<Json<ApiResponse<ViewState>>> {
    tracing::info!("Processing base64 image selection: request_id={}", request_id);

    let bytes = match ImageLoader::decode_base64(&request.image) {
        Ok(bytes) => bytes,
        Err(err) => return Err(reject(&state, err)),
    };

    let media_type = request
        .media_type
        .or_else(|| ImageLoader::media_type_from_data_url(&request.image))
        .or_else(|| {
            ImageLoader::detect_format(&bytes).map(|format| format.to_mime_type().to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let name = request.name.unwrap_or_else(|| "upload".to_string());

    let view = state.select_image(name, media_type, bytes).await?;
    Ok(Json(ApiResponse::success(view, request_id)))
}

/// 分类动作
pub async fn classify_handler(
    State(state): State<Arc<AppState>>,
    RequestId(request_id): RequestId,
) -> Result<Json<ApiResponse<ViewState>>> {
    let start_time = Instant::now();
    tracing::info!("Processing classify request: request_id={}", request_id);

    let view = state.classify().await?;

    tracing::info!(
        "Classify request completed: request_id={}, state={:?}, time={:.3}s",
        request_id,
        view.state,
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(view, request_id)))
}

fn reject(state: &AppState, err: ClassifyError) -> ClassifyError {
    state.record_rejection(&err);
    err
}
