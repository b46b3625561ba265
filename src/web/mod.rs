pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{utils::error::ClassifyError, AppState, Config, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

pub async fn serve(config: Config) -> Result<()> {
    // 解析绑定地址
    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .map_err(|e| ClassifyError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e)))?;

    let state = Arc::new(AppState::new(config));

    // 后台加载模型与类别名，页面在加载期间即可访问
    let loader = Arc::clone(&state);
    tokio::spawn(async move {
        loader.initialize().await;
    });

    let app = create_app(Arc::clone(&state));

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /                  - Web UI");
    tracing::info!("  GET  /api/state         - Current page state");
    tracing::info!("  POST /api/image         - Multipart image selection");
    tracing::info!("  POST /api/image/base64  - JSON base64 image selection");
    tracing::info!("  POST /api/classify      - Classify the selected image");
    tracing::info!("  GET  /health            - Health check");
    tracing::info!("  GET  /api/info          - Service information");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ClassifyError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ClassifyError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

pub fn create_app(state: Arc<AppState>) -> Router {
    let server_config = state.config().server_config.clone();

    Router::new()
        // 页面
        .route("/", get(ui::index_handler))
        // 分类API
        .route("/api/state", get(handlers::state_handler))
        .route("/api/image", post(handlers::select_upload_handler))
        .route("/api/image/base64", post(handlers::select_base64_handler))
        .route("/api/classify", post(handlers::classify_handler))
        // 系统路由
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 健康检查端点
async fn health_handler(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>> {
    state.health_check()?;
    let startup = state.startup_status();
    let status = if startup.loading { "starting" } else { "healthy" };

    Ok(Json(json!({
        "status": status,
        "model_ready": startup.model_ready,
        "labels_loaded": startup.labels_loaded,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.stats();

    Json(json!({
        "service": "ImageNet Classifier",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": stats,
        "input": {
            "shape": [1, crate::config::INPUT_SIZE, crate::config::INPUT_SIZE, 3],
            "range": [-1.0, 1.0],
            "resize": "nearest"
        },
        "top_k": crate::config::TOP_K
    }))
}
