use crate::{
    classify::ClassificationResult,
    config::TOP_K,
    image::{ImagePreprocessor, ResultRanker},
    models::{InferenceRunner, LabelList, ModelHandle},
    utils::error::ClassifyError,
    Result,
};
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;

/// 分类流水线：预处理 → 推理 → 排序
pub struct ClassifyPipeline;

impl ClassifyPipeline {
    pub async fn run(
        model: Option<ModelHandle>,
        labels: Arc<LabelList>,
        image: Arc<DynamicImage>,
    ) -> Result<ClassificationResult> {
        let start_time = Instant::now();

        let tensor = tokio::task::spawn_blocking(move || ImagePreprocessor::preprocess(&image))
            .await
            .map_err(|e| ClassifyError::ImageProcessing(format!("preprocessing task failed: {}", e)))?;
        let preprocessing_time = start_time.elapsed();

        let inference_start = Instant::now();
        let scores = InferenceRunner::infer(model, tensor).await?;
        let inference_time = inference_start.elapsed();

        let predictions = ResultRanker::rank(&scores, &labels, TOP_K);
        let total_time = start_time.elapsed();

        tracing::info!(
            "Classification completed: classes={}, top={:?}, preprocess={:.3}s, inference={:.3}s, total={:.3}s",
            scores.len(),
            predictions.first().map(|p| p.label.as_str()),
            preprocessing_time.as_secs_f32(),
            inference_time.as_secs_f32(),
            total_time.as_secs_f32()
        );

        Ok(ClassificationResult {
            processing_time: total_time.as_secs_f32(),
            predictions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::InputTensor;
    use crate::models::ScoreModel;
    use image::{Rgb, RgbImage};

    struct Linear;

    impl ScoreModel for Linear {
        fn name(&self) -> &str {
            "linear"
        }

        fn predict(&self, _input: InputTensor) -> Result<Vec<f32>> {
            Ok(vec![0.05, 0.4, 0.1, 0.2, 0.05, 0.15, 0.05])
        }
    }

    fn image() -> Arc<DynamicImage> {
        Arc::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 40, Rgb([1, 2, 3]))))
    }

    #[tokio::test]
    async fn top_five_come_back_sorted() {
        let labels = Arc::new(LabelList::parse("a\nb\nc\nd\ne\nf\ng"));
        let model = ModelHandle::from_model(Arc::new(Linear));

        let result = ClassifyPipeline::run(Some(model), labels, image()).await.unwrap();
        let names: Vec<&str> = result.predictions.iter().map(|p| p.label.as_str()).collect();

        assert_eq!(names, vec!["b", "d", "f", "c", "a"]);
        assert!(result.processing_time >= 0.0);
    }

    #[tokio::test]
    async fn missing_model_fails_before_ranking() {
        let result = ClassifyPipeline::run(None, Arc::new(LabelList::fallback()), image()).await;
        assert!(matches!(result, Err(ClassifyError::ModelUnavailable)));
    }
}
