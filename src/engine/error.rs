use thiserror::Error;

use crate::core::tensor::{DType, Shape};

/// Errores del operador de pérdida
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LossError {
    #[error("labels and predictions must have the same shapes, but got {labels} and {predictions}")]
    ShapeMismatch { labels: Shape, predictions: Shape },

    #[error("weights must be a scalar or have the same rank as labels, but got rank {weights_rank} and {labels_rank}")]
    WeightsRankMismatch {
        weights_rank: usize,
        labels_rank: usize,
    },

    #[error("weights shape {weights} is not broadcastable to {target}")]
    WeightsNotBroadcastable { weights: Shape, target: Shape },

    #[error("reduction axis {axis} (normalized {normalized}) must be in [0, {rank})")]
    AxisOutOfRange {
        axis: i64,
        normalized: i64,
        rank: usize,
    },

    #[error("reduction mode must be one of 0, 1, 2, 3, but got {0}")]
    InvalidReductionMode(i64),

    #[error("{role} must be a floating point tensor, but got {dtype}")]
    UnsupportedDType { role: &'static str, dtype: DType },

    #[error("output tensor has shape {actual}, expected {expected}")]
    OutputShapeMismatch { expected: Shape, actual: Shape },

    #[error("Invalid tensor: {0}")]
    InvalidTensor(String),

    #[error("Kernel error: {0}")]
    Kernel(String),
}

/// Coarse classification of [`LossError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ShapeMismatch,
    WeightsIncompatible,
    AxisOutOfRange,
    InvalidReductionMode,
    InvalidInput,
    ContractViolation,
}

impl LossError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LossError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            LossError::WeightsRankMismatch { .. } | LossError::WeightsNotBroadcastable { .. } => {
                ErrorKind::WeightsIncompatible
            }
            LossError::AxisOutOfRange { .. } => ErrorKind::AxisOutOfRange,
            LossError::InvalidReductionMode(_) => ErrorKind::InvalidReductionMode,
            LossError::UnsupportedDType { .. } | LossError::InvalidTensor(_) => {
                ErrorKind::InvalidInput
            }
            LossError::OutputShapeMismatch { .. } | LossError::Kernel(_) => {
                ErrorKind::ContractViolation
            }
        }
    }
}
