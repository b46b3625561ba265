use crate::classify::{ClassifyPipeline, Completion, StartupStatus, UiController, ViewState};
use crate::image::ImageLoader;
use crate::models::{LabelCatalog, LabelList, ModelHandle, ModelInfo};
use crate::utils::error::ClassifyError;
use crate::{Config, Result};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// 应用状态：模型与类别名在启动时各设置一次，之后只读
pub struct AppState {
    config: Config,
    client: reqwest::Client,
    labels: OnceCell<Arc<LabelList>>,
    model: OnceCell<ModelHandle>,
    model_error: OnceCell<String>,
    controller: Arc<Mutex<UiController>>,
}

/// 服务统计信息
#[derive(Debug, Clone, Serialize)]
pub struct AppStats {
    pub model_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_error: Option<String>,
    pub labels_loaded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_source: Option<crate::models::LabelSource>,
    pub layout: crate::config::TensorLayout,
    pub intra_threads: usize,
    pub optimization_level: i32,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            labels: OnceCell::new(),
            model: OnceCell::new(),
            model_error: OnceCell::new(),
            controller: Arc::new(Mutex::new(UiController::new())),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 并行加载类别名与模型，两者都结束后才写入
    pub async fn initialize(&self) {
        tracing::info!("Loading class labels and model...");

        let catalog = LabelCatalog::new(self.client.clone(), self.config.labels.clone());
        let (labels, model) = tokio::join!(
            catalog.load(),
            ModelHandle::load(&self.client, &self.config)
        );

        let model = model.map_err(|e| {
            tracing::error!("Error loading the model: {}", e);
            e.to_string()
        });
        self.install(labels, model);
    }

    /// 写入启动结果；重复调用不会覆盖已有值
    pub fn install(&self, labels: LabelList, model: std::result::Result<ModelHandle, String>) {
        tracing::info!("Loaded {} ImageNet classes ({:?})", labels.len(), labels.source());
        if self.labels.set(Arc::new(labels)).is_err() {
            tracing::warn!("Label list already installed, ignoring");
        }

        let installed = match model {
            Ok(handle) => self.model.set(handle).is_ok(),
            Err(message) => self.model_error.set(message).is_ok(),
        };
        if !installed {
            tracing::warn!("Model state already installed, ignoring");
        }
    }

    pub fn startup_status(&self) -> StartupStatus {
        let settled = self.labels.get().is_some()
            && (self.model.get().is_some() || self.model_error.get().is_some());
        StartupStatus {
            loading: !settled,
            model_ready: self.model.get().is_some(),
            labels_loaded: self.labels.get().map(|l| l.len()).unwrap_or(0),
        }
    }

    pub fn view(&self) -> ViewState {
        let startup = self.startup_status();
        let controller = self.controller.lock();
        ViewState::project(&controller, startup)
    }

    /// 记录入口处的拒绝（例如上传字段类型不符）
    pub fn record_rejection(&self, err: &ClassifyError) {
        self.controller.lock().reject(err);
    }

    /// 文件选择 / 拖放：非图像类型直接拒绝，状态不变
    pub async fn select_image(&self, name: String, media_type: String, bytes: Vec<u8>) -> Result<ViewState> {
        if let Err(err) = ImageLoader::check_media_type(&media_type) {
            self.record_rejection(&err);
            return Err(err);
        }

        let decoded = tokio::task::spawn_blocking(move || ImageLoader::from_bytes(&bytes))
            .await
            .map_err(|e| ClassifyError::Internal(format!("decode task failed: {}", e)))
            .and_then(|r| r);

        match decoded {
            Ok(image) => {
                self.controller.lock().select(name, media_type, image);
                Ok(self.view())
            }
            Err(err) => {
                self.controller.lock().reject(&err);
                Err(err)
            }
        }
    }

    /// 分类动作
    pub async fn classify(&self) -> Result<ViewState> {
        let (model, ticket) = {
            let mut controller = self.controller.lock();

            let model = match self.model.get() {
                Some(model) => model.clone(),
                None => {
                    let err = match self.model_error.get() {
                        Some(message) => ClassifyError::ModelLoad(message.clone()),
                        None => ClassifyError::ModelUnavailable,
                    };
                    controller.reject(&err);
                    return Err(err);
                }
            };

            (model, controller.begin_classify()?)
        };

        let labels = self
            .labels
            .get()
            .cloned()
            .unwrap_or_else(|| Arc::new(LabelList::fallback()));

        // 推理与状态回写放在独立任务中，请求被取消（超时、断开）时仍会离开 Classifying
        let generation = ticket.generation;
        let controller = Arc::clone(&self.controller);
        let task = tokio::spawn(async move {
            let outcome = ClassifyPipeline::run(Some(model), labels, ticket.image).await;

            let mut controller = controller.lock();
            match outcome {
                Ok(result) => {
                    controller.complete(generation, result);
                    Ok(())
                }
                Err(err) => {
                    if controller.fail(generation, &err) == Completion::Applied {
                        Err(err)
                    } else {
                        Ok(())
                    }
                }
            }
        });

        match task.await {
            Ok(settled) => settled?,
            Err(e) => {
                let err = ClassifyError::Internal(format!("classification task failed: {}", e));
                self.controller.lock().fail(generation, &err);
                return Err(err);
            }
        }

        Ok(self.view())
    }

    pub fn stats(&self) -> AppStats {
        let labels = self.labels.get();
        AppStats {
            model_ready: self.model.get().is_some(),
            model: self.model.get().map(|m| m.info().clone()),
            model_error: self.model_error.get().cloned(),
            labels_loaded: labels.map(|l| l.len()).unwrap_or(0),
            label_source: labels.map(|l| l.source()),
            layout: self.config.layout,
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
        }
    }

    /// 健康检查：模型加载失败视为不健康
    pub fn health_check(&self) -> Result<()> {
        match self.model_error.get() {
            Some(message) => Err(ClassifyError::ModelLoad(message.clone())),
            None => Ok(()),
        }
    }
}
