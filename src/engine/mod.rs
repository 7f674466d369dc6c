pub mod context;
pub mod cosine_distance;
pub mod error;
pub mod kernels;
pub mod operations;

pub use cosine_distance::{
    compute, infer_output_shape, normalize_axis, validate, CosineDistanceLoss, OutputSpec,
};
pub use error::{ErrorKind, LossError};
pub use operations::Reduction;
