// src/core/tensor.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Representa la forma (shape) de un tensor.
/// []        -> escalar (rank 0)
/// [3]       -> vector 3D (rank 1)
/// [2, 3]    -> matriz 2x3 (rank 2)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape {
    pub dims: Vec<usize>,
}

impl Shape {
    /// Crea un nuevo shape a partir de una lista de dimensiones
    pub fn new<D: Into<Vec<usize>>>(dims: D) -> Self {
        Self { dims: dims.into() }
    }

    /// Shape de un escalar (rank 0)
    pub fn scalar() -> Self {
        Self { dims: Vec::new() }
    }

    /// Número de dimensiones (rank)
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Número total de elementos
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Row-major strides, one per dimension.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.rank()];
        for i in (0..self.rank().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Same shape with `axis` collapsed to size 1 (dimension kept).
    pub fn collapse_axis(&self, axis: usize) -> Self {
        let mut dims = self.dims.clone();
        if let Some(d) = dims.get_mut(axis) {
            *d = 1;
        }
        Self { dims }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

/// Tipo de elemento declarado de un tensor.
///
/// Storage is always `f32`; integer and boolean tensors are coerced on
/// construction and only keep their tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    #[default]
    Float32,
    Int32,
    Int64,
    UInt8,
    Bool,
}

impl DType {
    pub fn is_float(self) -> bool {
        matches!(self, DType::Float32)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Float32 => "float32",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Tensor denso con layout row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Shape,
    #[serde(default)]
    pub dtype: DType,
    pub data: Vec<f32>,
}

impl Tensor {
    /// Crea un tensor f32 verificando que data.len() coincide con shape.num_elements()
    pub fn new(shape: Shape, data: Vec<f32>) -> Result<Self, String> {
        Self::with_dtype(shape, DType::Float32, data)
    }

    /// Crea un tensor con un dtype declarado
    pub fn with_dtype(shape: Shape, dtype: DType, data: Vec<f32>) -> Result<Self, String> {
        let expected = shape.num_elements();
        if data.len() != expected {
            return Err(format!(
                "Data length {} does not match shape {:?} (expected {})",
                data.len(),
                shape.dims,
                expected
            ));
        }
        Ok(Self { shape, dtype, data })
    }

    /// Escalar f32 (rank 0)
    pub fn scalar(value: f32) -> Self {
        Self {
            shape: Shape::scalar(),
            dtype: DType::Float32,
            data: vec![value],
        }
    }

    /// Tensor lleno de ceros
    pub fn zeros(shape: Shape, dtype: DType) -> Self {
        let len = shape.num_elements();
        Self {
            shape,
            dtype,
            data: vec![0.0; len],
        }
    }

    /// Rank del tensor (0 = escalar, 1 = vector, 2 = matriz...)
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Rank 0. A `[1]` tensor is not a scalar.
    pub fn is_scalar(&self) -> bool {
        self.shape.is_scalar()
    }

    /// Número de elementos
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value of a scalar tensor.
    pub fn scalar_value(&self) -> Option<f32> {
        if self.is_scalar() {
            self.data.first().copied()
        } else {
            None
        }
    }

    /// Single-element tensor of rank 0, 1 or 2 (`[]`, `[1]`, `[1, 1]`),
    /// accepted wherever a scalar argument is expected.
    pub fn is_scalar_like(&self) -> bool {
        self.rank() <= 2 && self.shape.dims.iter().all(|&d| d == 1) && self.len() == 1
    }

    /// Value of a scalar-like tensor.
    pub fn scalar_like_value(&self) -> Option<f32> {
        if self.is_scalar_like() {
            self.data.first().copied()
        } else {
            None
        }
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = self.scalar_value() {
            return write!(f, "{}", v);
        }
        write!(f, "Tensor(shape={}, dtype={}, data=[", self.shape, self.dtype)?;
        for (i, v) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "])")
    }
}
