pub mod controller;
pub mod pipeline;
pub mod types;

pub use controller::{ClassifyTicket, Completion, StartupStatus, UiController, ViewState};
pub use pipeline::ClassifyPipeline;
pub use types::*;
