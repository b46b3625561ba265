use crate::classify::InputTensor;
use crate::config::{Config, ResourceLocation};
use crate::models::{OnnxClassifier, ScoreModel};
use crate::utils::error::ClassifyError;
use crate::utils::fetch_bytes;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;

/// 已加载模型的句柄
#[derive(Clone)]
pub struct ModelHandle {
    model: Arc<dyn ScoreModel>,
    info: ModelInfo,
}

/// 模型信息
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub source: String,
    pub size_bytes: usize,
}

impl ModelHandle {
    /// 拉取并反序列化模型，会话构建放到阻塞线程池
    pub async fn load(client: &reqwest::Client, config: &Config) -> Result<Self> {
        let location = config.model.clone();
        tracing::info!("Loading classification model from: {}", location);

        let bytes = fetch_bytes(client, &location)
            .await
            .map_err(|e| ClassifyError::ModelLoad(format!("failed to fetch {}: {}", location, e)))?;

        let name = Self::model_name(&location);
        let size_bytes = bytes.len();
        let onnx_config = config.onnx_config.clone();
        let layout = config.layout;

        let session_name = name.clone();
        let classifier = tokio::task::spawn_blocking(move || {
            OnnxClassifier::from_bytes(session_name, &bytes, &onnx_config, layout)
        })
        .await
        .map_err(|e| ClassifyError::Internal(format!("model load task failed: {}", e)))?
        .map_err(|e| match e {
            ClassifyError::ModelLoad(_) => e,
            other => ClassifyError::ModelLoad(other.to_string()),
        })?;

        tracing::info!("Classification model '{}' loaded successfully", name);

        Ok(Self {
            model: Arc::new(classifier),
            info: ModelInfo {
                name,
                source: location.to_string(),
                size_bytes,
            },
        })
    }

    /// 包装任意实现了 [`ScoreModel`] 的模型
    pub fn from_model(model: Arc<dyn ScoreModel>) -> Self {
        let info = ModelInfo {
            name: model.name().to_string(),
            source: "in-process".to_string(),
            size_bytes: 0,
        };
        Self { model, info }
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn predict(&self, input: InputTensor) -> Result<Vec<f32>> {
        self.model.predict(input)
    }

    fn model_name(location: &ResourceLocation) -> String {
        let raw = location.to_string();
        raw.rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("model")
            .to_string()
    }
}
