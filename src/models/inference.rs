use crate::classify::{InputTensor, PredictionScore};
use crate::models::ModelHandle;
use crate::utils::error::ClassifyError;
use crate::Result;

/// 概率和与 1 的允许偏差
const DISTRIBUTION_TOLERANCE: f32 = 1e-2;

/// 单次前向推理
pub struct InferenceRunner;

impl InferenceRunner {
    /// 运行一次前向推理，返回按类别下标排列的概率
    ///
    /// 模型未加载时返回 [`ClassifyError::ModelUnavailable`]。
    pub async fn infer(model: Option<ModelHandle>, tensor: InputTensor) -> Result<Vec<PredictionScore>> {
        let model = model.ok_or(ClassifyError::ModelUnavailable)?;

        let raw = tokio::task::spawn_blocking(move || model.predict(tensor))
            .await
            .map_err(|e| ClassifyError::Internal(format!("inference task failed: {}", e)))??;

        if raw.is_empty() {
            return Err(ClassifyError::Inference("model returned no scores".to_string()));
        }

        Ok(Self::to_probabilities(raw)?
            .into_iter()
            .enumerate()
            .map(|(class_id, probability)| PredictionScore { class_id, probability })
            .collect())
    }

    /// 已是概率分布则原样返回，否则视为 logits 做 softmax
    ///
    /// 含 NaN / ±inf 的输出无法排序，直接报推理错误。
    pub fn to_probabilities(raw: Vec<f32>) -> Result<Vec<f32>> {
        if let Some(index) = raw.iter().position(|v| !v.is_finite()) {
            return Err(ClassifyError::Inference(format!(
                "model returned non-finite score {} at class {}",
                raw[index], index
            )));
        }

        if Self::is_distribution(&raw) {
            return Ok(raw);
        }

        tracing::debug!("Model output is not a distribution, applying softmax");
        // 减去最大值后至少有一项为 exp(0) = 1，和不会为 0
        let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = raw.iter().map(|v| (v - max).exp()).collect();
        let sum: f32 = exps.iter().sum();

        Ok(exps.into_iter().map(|v| v / sum).collect())
    }

    fn is_distribution(values: &[f32]) -> bool {
        if !values.iter().all(|v| (0.0..=1.0).contains(v)) {
            return false;
        }
        let sum: f32 = values.iter().sum();
        (sum - 1.0).abs() <= DISTRIBUTION_TOLERANCE
    }
}
