pub mod config;
pub mod storage;
pub mod tensor;

// Re-export commonly used types
pub use config::{LossConfig, OutputFormat};
pub use tensor::{DType, Shape, Tensor};
