// src/lib.rs

pub mod core;

pub mod engine;
pub mod utils;

pub use crate::core::config;
pub use crate::core::storage;
pub use crate::core::tensor;

// Re-exports para tener una API limpia desde fuera del crate
pub use config::{LossConfig, OutputFormat};
pub use engine::{
    compute, infer_output_shape, normalize_axis, validate, CosineDistanceLoss, ErrorKind,
    LossError, OutputSpec, Reduction,
};
// Tensor runtime primitives
pub use engine::kernels as ops;
pub use storage::{load_tensor, parse_tensor, save_tensor, StorageError};
pub use tensor::{DType, Shape, Tensor};
