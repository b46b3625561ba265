pub mod classifier;
pub mod handle;
pub mod inference;
pub mod labels;

pub use classifier::{OnnxClassifier, ScoreModel};
pub use handle::{ModelHandle, ModelInfo};
pub use inference::InferenceRunner;
pub use labels::{LabelCatalog, LabelList, LabelSource};
