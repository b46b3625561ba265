pub mod error;
pub mod fetch;

pub use error::ClassifyError;
pub use fetch::{fetch_bytes, fetch_text};
