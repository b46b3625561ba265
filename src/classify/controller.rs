use crate::classify::{ClassificationResult, RankedPrediction, UiState};
use crate::utils::error::ClassifyError;
use crate::Result;
use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use std::sync::Arc;

/// 当前选中的图片
#[derive(Debug, Clone)]
pub struct Selection {
    pub generation: u64,
    pub name: String,
    pub media_type: String,
    pub image: Arc<DynamicImage>,
}

/// 一次分类请求的凭据，记录发起时的图片代数
#[derive(Debug, Clone)]
pub struct ClassifyTicket {
    pub generation: u64,
    pub image: Arc<DynamicImage>,
}

/// 推理完成后的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// 期间已选择新图片，结果被丢弃
    Discarded,
}

/// 单图分类页面的状态机
///
/// ```text
/// Idle/Previewing/Showing --select--> Previewing
/// Previewing/Showing --classify--> Classifying
/// Classifying --complete--> Showing
/// Classifying --fail--> Previewing
/// ```
#[derive(Debug)]
pub struct UiController {
    state: UiState,
    selection: Option<Selection>,
    generation: u64,
    result: Option<ClassificationResult>,
    notice: Option<String>,
}

impl Default for UiController {
    fn default() -> Self {
        Self::new()
    }
}

impl UiController {
    pub fn new() -> Self {
        Self {
            state: UiState::Idle,
            selection: None,
            generation: 0,
            result: None,
            notice: None,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        self.result.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// 选择新图片：任意状态 → Previewing，清空已有结果
    ///
    /// 返回新图片的代数；进行中的推理完成时会因代数不符而被丢弃。
    pub fn select(&mut self, name: String, media_type: String, image: DynamicImage) -> u64 {
        self.generation += 1;

        if self.state == UiState::Classifying {
            tracing::warn!(
                "New image selected while classification in flight, generation {} supersedes {}",
                self.generation,
                self.generation - 1
            );
        }

        tracing::debug!(
            "Image selected: name={}, type={}, generation={}",
            name,
            media_type,
            self.generation
        );

        self.selection = Some(Selection {
            generation: self.generation,
            name,
            media_type,
            image: Arc::new(image),
        });
        self.result = None;
        self.notice = None;
        self.state = UiState::Previewing;
        self.generation
    }

    /// 记录拒绝原因，不改变状态
    pub fn reject(&mut self, err: &ClassifyError) {
        tracing::warn!("Action rejected in state {:?}: {}", self.state, err);
        self.notice = Some(err.user_message());
    }

    /// 发起分类：Previewing/Showing → Classifying
    ///
    /// 无图片或已有推理进行中时拒绝。
    pub fn begin_classify(&mut self) -> Result<ClassifyTicket> {
        let outcome = match (self.state, self.selection.as_ref()) {
            (UiState::Classifying, _) => Err(ClassifyError::ClassificationInProgress),
            (_, None) => Err(ClassifyError::NoImageSelected),
            (_, Some(selection)) => Ok(ClassifyTicket {
                generation: selection.generation,
                image: Arc::clone(&selection.image),
            }),
        };

        match outcome {
            Ok(ticket) => {
                self.state = UiState::Classifying;
                self.result = None;
                self.notice = None;
                Ok(ticket)
            }
            Err(err) => {
                self.reject(&err);
                Err(err)
            }
        }
    }

    /// 推理成功：Classifying → Showing
    pub fn complete(&mut self, generation: u64, result: ClassificationResult) -> Completion {
        if !self.is_current(generation) {
            tracing::debug!(
                "Discarding stale classification result: generation {} (current {})",
                generation,
                self.generation
            );
            return Completion::Discarded;
        }

        self.result = Some(result);
        self.state = UiState::Showing;
        Completion::Applied
    }

    /// 推理失败：Classifying → Previewing，不保留任何部分结果
    pub fn fail(&mut self, generation: u64, err: &ClassifyError) -> Completion {
        if !self.is_current(generation) {
            tracing::debug!(
                "Discarding stale classification failure: generation {} (current {}): {}",
                generation,
                self.generation,
                err
            );
            return Completion::Discarded;
        }

        tracing::error!("Error classifying image: {}", err);
        self.result = None;
        self.notice = Some(err.user_message());
        self.state = UiState::Previewing;
        Completion::Applied
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state == UiState::Classifying && generation == self.generation
    }
}

/// 启动阶段资源状态
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StartupStatus {
    pub loading: bool,
    pub model_ready: bool,
    pub labels_loaded: usize,
}

/// 已选图片的元信息
#[derive(Debug, Clone, Serialize)]
pub struct PreviewView {
    pub generation: u64,
    pub name: String,
    pub media_type: String,
    pub width: u32,
    pub height: u32,
}

/// 渲染用的单条预测
#[derive(Debug, Clone, Serialize)]
pub struct PredictionView {
    pub label: String,
    pub probability: f32,
    pub percentage: String,
}

impl From<&RankedPrediction> for PredictionView {
    fn from(prediction: &RankedPrediction) -> Self {
        Self {
            label: prediction.label.clone(),
            probability: prediction.probability,
            percentage: prediction.percentage(),
        }
    }
}

/// 页面状态投影，页面元素的显隐和可用性完全由它决定
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub state: UiState,
    pub classify_enabled: bool,
    pub loading: bool,
    pub preview: Option<PreviewView>,
    pub results_visible: bool,
    pub predictions: Vec<PredictionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f32>,
    pub notice: Option<String>,
    pub model_ready: bool,
    pub labels_loaded: usize,
}

impl ViewState {
    pub fn project(controller: &UiController, startup: StartupStatus) -> Self {
        let state = controller.state();
        let showing = state == UiState::Showing;

        let preview = controller.selection().map(|selection| {
            let (width, height) = selection.image.dimensions();
            PreviewView {
                generation: selection.generation,
                name: selection.name.clone(),
                media_type: selection.media_type.clone(),
                width,
                height,
            }
        });

        let (predictions, processing_time) = match controller.result() {
            Some(result) if showing => (
                result.predictions.iter().map(PredictionView::from).collect(),
                Some(result.processing_time),
            ),
            _ => (Vec::new(), None),
        };

        Self {
            state,
            classify_enabled: matches!(state, UiState::Previewing | UiState::Showing),
            loading: state == UiState::Classifying || startup.loading,
            preview,
            results_visible: showing,
            predictions,
            processing_time,
            notice: controller.notice().map(str::to_string),
            model_ready: startup.model_ready,
            labels_loaded: startup.labels_loaded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn image() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(8, 6))
    }

    fn result(label: &str) -> ClassificationResult {
        ClassificationResult {
            processing_time: 0.01,
            predictions: vec![RankedPrediction {
                class_id: 0,
                label: label.to_string(),
                probability: 0.5,
            }],
        }
    }

    fn selected() -> UiController {
        let mut ui = UiController::new();
        ui.select("cat.png".to_string(), "image/png".to_string(), image());
        ui
    }

    #[test]
    fn starts_idle_with_classify_disabled() {
        let ui = UiController::new();
        let view = ViewState::project(&ui, StartupStatus::default());

        assert_eq!(ui.state(), UiState::Idle);
        assert!(!view.classify_enabled);
        assert!(view.preview.is_none());
        assert!(!view.results_visible);
    }

    #[test]
    fn selection_enables_classify() {
        let ui = selected();
        let view = ViewState::project(&ui, StartupStatus::default());

        assert_eq!(ui.state(), UiState::Previewing);
        assert!(view.classify_enabled);
        let preview = view.preview.unwrap();
        assert_eq!((preview.width, preview.height), (8, 6));
        assert_eq!(preview.generation, 1);
    }

    #[test]
    fn classify_from_idle_is_rejected() {
        let mut ui = UiController::new();
        assert!(matches!(ui.begin_classify(), Err(ClassifyError::NoImageSelected)));
        assert_eq!(ui.state(), UiState::Idle);
        assert_eq!(ui.notice(), Some("Please select an image first"));
    }

    #[test]
    fn happy_path_reaches_showing() {
        let mut ui = selected();
        let ticket = ui.begin_classify().unwrap();
        assert_eq!(ui.state(), UiState::Classifying);

        let view = ViewState::project(&ui, StartupStatus::default());
        assert!(!view.classify_enabled);
        assert!(view.loading);

        assert_eq!(ui.complete(ticket.generation, result("tabby")), Completion::Applied);
        let view = ViewState::project(&ui, StartupStatus::default());
        assert_eq!(view.state, UiState::Showing);
        assert!(view.classify_enabled);
        assert!(view.results_visible);
        assert!(!view.loading);
        assert_eq!(view.predictions[0].label, "tabby");
        assert_eq!(view.predictions[0].percentage, "50.00%");
    }

    #[test]
    fn second_classify_while_in_flight_is_rejected() {
        let mut ui = selected();
        let _ticket = ui.begin_classify().unwrap();

        assert!(matches!(
            ui.begin_classify(),
            Err(ClassifyError::ClassificationInProgress)
        ));
        assert_eq!(ui.state(), UiState::Classifying);
    }

    #[test]
    fn failure_returns_to_previewing_without_results() {
        let mut ui = selected();
        let ticket = ui.begin_classify().unwrap();

        let err = ClassifyError::Inference("bad shape".to_string());
        assert_eq!(ui.fail(ticket.generation, &err), Completion::Applied);

        let view = ViewState::project(&ui, StartupStatus::default());
        assert_eq!(view.state, UiState::Previewing);
        assert!(view.classify_enabled);
        assert!(view.predictions.is_empty());
        assert_eq!(
            view.notice.as_deref(),
            Some(crate::utils::error::GENERIC_FAILURE_NOTICE)
        );
    }

    #[test]
    fn stale_result_after_new_selection_is_discarded() {
        let mut ui = selected();
        let stale = ui.begin_classify().unwrap();

        ui.select("dog.png".to_string(), "image/png".to_string(), image());
        assert_eq!(ui.state(), UiState::Previewing);

        assert_eq!(ui.complete(stale.generation, result("tabby")), Completion::Discarded);
        assert_eq!(ui.state(), UiState::Previewing);
        assert!(ui.result().is_none());

        // 新图片的分类不受影响
        let fresh = ui.begin_classify().unwrap();
        assert_eq!(
            ui.fail(stale.generation, &ClassifyError::Inference("late".into())),
            Completion::Discarded
        );
        assert_eq!(ui.state(), UiState::Classifying);
        assert_eq!(ui.complete(fresh.generation, result("beagle")), Completion::Applied);
        assert_eq!(ui.result().unwrap().predictions[0].label, "beagle");
    }

    #[test]
    fn new_selection_clears_shown_results() {
        let mut ui = selected();
        let ticket = ui.begin_classify().unwrap();
        ui.complete(ticket.generation, result("tabby"));
        assert_eq!(ui.state(), UiState::Showing);

        ui.select("next.png".to_string(), "image/png".to_string(), image());
        let view = ViewState::project(&ui, StartupStatus::default());
        assert_eq!(view.state, UiState::Previewing);
        assert!(!view.results_visible);
        assert!(view.predictions.is_empty());
    }

    #[test]
    fn reject_keeps_state_and_sets_notice() {
        let mut ui = selected();
        ui.reject(&ClassifyError::UnsupportedFormat("text/plain".to_string()));

        assert_eq!(ui.state(), UiState::Previewing);
        assert_eq!(ui.notice(), Some("Please select an image file"));
        assert!(ui.selection().is_some());
    }

    #[test]
    fn startup_loading_shows_spinner() {
        let ui = UiController::new();
        let view = ViewState::project(
            &ui,
            StartupStatus {
                loading: true,
                model_ready: false,
                labels_loaded: 0,
            },
        );
        assert!(view.loading);
        assert!(!view.model_ready);
    }
}
