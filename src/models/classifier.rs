use crate::classify::InputTensor;
use crate::config::{OnnxConfig, TensorLayout};
use crate::utils::error::ClassifyError;
use crate::Result;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;

/// 前向推理接口：输入 1×224×224×3 张量，按类别下标顺序输出原始得分
pub trait ScoreModel: Send + Sync {
    /// 模型名称（日志与 /api/info 使用）
    fn name(&self) -> &str;

    fn predict(&self, input: InputTensor) -> Result<Vec<f32>>;
}

/// 基于 ONNX Runtime 的分类模型
pub struct OnnxClassifier {
    session: Mutex<Session>,
    name: String,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
    layout: TensorLayout,
}

impl OnnxClassifier {
    /// 从序列化的模型字节构建会话
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: &[u8],
        config: &OnnxConfig,
        layout: TensorLayout,
    ) -> Result<Self> {
        let name = name.into();
        tracing::info!("Building ONNX session for {} ({} bytes)", name, bytes.len());

        let session = Session::builder()?
            .with_optimization_level(Self::optimization_level(config.optimization_level))?
            .with_intra_threads(config.intra_threads)?
            .commit_from_memory(bytes)?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(ClassifyError::ModelLoad(
                    "Classification model has no inputs".to_string(),
                ))
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(ClassifyError::ModelLoad(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model input: '{}' ({:?}), output: '{}'",
            input_name,
            layout,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            name,
            input_name,
            output_name,
            layout,
        })
    }

    fn optimization_level(level: i32) -> GraphOptimizationLevel {
        match level {
            i32::MIN..=0 => GraphOptimizationLevel::Disable,
            1 => GraphOptimizationLevel::Level1,
            2 => GraphOptimizationLevel::Level2,
            _ => GraphOptimizationLevel::Level3,
        }
    }
}

impl ScoreModel for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, input: InputTensor) -> Result<Vec<f32>> {
        let input = match self.layout {
            TensorLayout::Nhwc => input,
            TensorLayout::Nchw => input
                .permuted_axes([0, 3, 1, 2])
                .as_standard_layout()
                .into_owned(),
        };

        let input_tensor = Tensor::from_array(input)?;
        let mut session = self.session.lock();
        let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

        match outputs.get(&self.output_name) {
            Some(output) => {
                let scores = output.try_extract_array::<f32>()?;
                Ok(scores.iter().copied().collect())
            }
            None => {
                let available_outputs: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                Err(ClassifyError::Inference(format!(
                    "Classification output '{}' not found. Available outputs: {:?}",
                    self.output_name, available_outputs
                )))
            }
        }
    }
}
