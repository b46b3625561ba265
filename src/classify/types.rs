use ndarray::Array4;
use serde::{Deserialize, Serialize};

/// 模型输入张量：1×224×224×3，取值范围 [-1, 1]
pub type InputTensor = Array4<f32>;

/// 单个类别的原始得分
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionScore {
    pub class_id: usize,
    /// 概率 (0.0 - 1.0)
    pub probability: f32,
}

/// 排序后带类别名的预测
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPrediction {
    pub class_id: usize,
    pub label: String,
    pub probability: f32,
}

impl RankedPrediction {
    /// 百分比，保留两位小数
    pub fn percentage(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }
}

/// 一次分类的完整结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// 处理耗时（秒）
    pub processing_time: f32,
    pub predictions: Vec<RankedPrediction>,
}

/// 页面所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiState {
    /// 尚未选择图片
    Idle,
    /// 已选择，未分类
    Previewing,
    /// 推理进行中
    Classifying,
    /// 结果已展示
    Showing,
}
