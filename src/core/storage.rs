use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::core::tensor::{DType, Shape, Tensor};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid tensor: {0}")]
    InvalidTensor(String),
}

/// On-disk form of a tensor: either a bare number (scalar) or
/// `{"shape": [..], "data": [..], "dtype": ".."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TensorFile {
    Scalar(f32),
    Dense {
        shape: Vec<usize>,
        data: Vec<f64>,
        #[serde(default)]
        dtype: DType,
    },
}

impl TensorFile {
    fn into_tensor(self) -> Result<Tensor, StorageError> {
        match self {
            TensorFile::Scalar(v) => Ok(Tensor::scalar(v)),
            TensorFile::Dense { shape, data, dtype } => {
                let data = data
                    .into_iter()
                    .map(|v| coerce(v, dtype))
                    .collect::<Result<Vec<f32>, String>>()
                    .map_err(StorageError::InvalidTensor)?;
                Tensor::with_dtype(Shape::new(shape), dtype, data)
                    .map_err(StorageError::InvalidTensor)
            }
        }
    }
}

/// Valores enteros se truncan al tipo declarado antes de pasar a f32;
/// los que quedan fuera de su rango se rechazan
fn coerce(value: f64, dtype: DType) -> Result<f32, String> {
    let (min, max) = match dtype {
        DType::Float32 => return Ok(value as f32),
        DType::Bool => return Ok(if value != 0.0 { 1.0 } else { 0.0 }),
        DType::Int32 => (i32::MIN as f64, i32::MAX as f64),
        DType::Int64 => (i64::MIN as f64, i64::MAX as f64),
        DType::UInt8 => (u8::MIN as f64, u8::MAX as f64),
    };
    let truncated = value.trunc();
    if !(min..=max).contains(&truncated) {
        return Err(format!("value {} out of range for dtype {}", value, dtype));
    }
    Ok(truncated as f32)
}

pub fn parse_tensor(text: &str) -> Result<Tensor, StorageError> {
    let file: TensorFile = serde_json::from_str(text)?;
    file.into_tensor()
}

pub fn load_tensor(path: impl AsRef<Path>) -> Result<Tensor, StorageError> {
    let content = fs::read_to_string(path)?;
    parse_tensor(&content)
}

pub fn save_tensor(path: impl AsRef<Path>, tensor: &Tensor) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(tensor)?;
    fs::write(path, json)?;
    Ok(())
}
