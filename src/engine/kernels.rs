// src/engine/kernels.rs

use crate::core::tensor::{Shape, Tensor};

/// Verifica que dos shapes sean iguales
fn ensure_same_shape(a: &Shape, b: &Shape) -> Result<(), String> {
    if a.dims != b.dims {
        Err(format!("Shape mismatch: {:?} vs {:?}", a.dims, b.dims))
    } else {
        Ok(())
    }
}

/// Multiplicación elemento a elemento: a * b
pub fn multiply(a: &Tensor, b: &Tensor) -> Result<Tensor, String> {
    ensure_same_shape(&a.shape, &b.shape)?;
    let data: Vec<f32> = a
        .data
        .iter()
        .zip(b.data.iter())
        .map(|(x, y)| x * y)
        .collect();
    Tensor::with_dtype(a.shape.clone(), a.dtype, data)
}

/// Resta desde escalar: s - a
pub fn rsub_scalar(s: f32, a: &Tensor) -> Tensor {
    Tensor {
        shape: a.shape.clone(),
        dtype: a.dtype,
        data: a.data.iter().map(|x| s - x).collect(),
    }
}

/// In-place elementwise product `a *= b`, where `b` is already shaped like `a`.
pub fn mul_assign(a: &mut Tensor, b: &[f32]) -> Result<(), String> {
    if a.data.len() != b.len() {
        return Err(format!(
            "Length mismatch in in-place multiply: {} vs {}",
            a.data.len(),
            b.len()
        ));
    }
    for (x, y) in a.data.iter_mut().zip(b.iter()) {
        *x *= y;
    }
    Ok(())
}

/// In-place scaling `a *= s`
pub fn scale_assign(a: &mut Tensor, s: f32) {
    for x in a.data.iter_mut() {
        *x *= s;
    }
}

/// Suma a lo largo de un eje, conservando el eje con tamaño 1
fn reduce_sum_axis(a: &Tensor, axis: usize) -> Tensor {
    let dims = &a.shape.dims;
    let outer: usize = dims[..axis].iter().product();
    let n = dims[axis];
    let inner: usize = dims[axis + 1..].iter().product();

    let mut data = vec![0.0f32; outer * inner];
    for o in 0..outer {
        for k in 0..n {
            let base = (o * n + k) * inner;
            for i in 0..inner {
                data[o * inner + i] += a.data[base + i];
            }
        }
    }

    Tensor {
        shape: a.shape.collapse_axis(axis),
        dtype: a.dtype,
        data,
    }
}

/// Sum-reduction along a list of dimensions.
///
/// With `keep_dims` every reduced dimension stays in the result with size 1;
/// otherwise reduced dimensions are dropped from the shape.
pub fn reduce_sum(a: &Tensor, axes: &[usize], keep_dims: bool) -> Result<Tensor, String> {
    let rank = a.rank();
    let mut sorted: Vec<usize> = axes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    if let Some(&bad) = sorted.iter().find(|&&ax| ax >= rank) {
        return Err(format!(
            "Dimension {} out of bounds for tensor with rank {}",
            bad, rank
        ));
    }

    let mut out = a.clone();
    for &axis in &sorted {
        out = reduce_sum_axis(&out, axis);
    }

    if !keep_dims {
        let dims: Vec<usize> = out
            .shape
            .dims
            .iter()
            .enumerate()
            .filter(|(i, _)| !sorted.contains(i))
            .map(|(_, &d)| d)
            .collect();
        out.shape = Shape::new(dims);
    }

    Ok(out)
}

/// Suma escalar de todos los elementos (orden secuencial, determinista)
pub fn sum_all(data: &[f32]) -> f32 {
    data.iter().sum()
}

/// Número de elementos distintos de cero
pub fn count_non_zero(data: &[f32]) -> usize {
    data.iter().filter(|&&x| x != 0.0).count()
}

/// `from` broadcasts to `to` when ranks match and every dimension of
/// `from` is 1 or equal to the corresponding dimension of `to`.
pub fn are_broadcastable(from: &Shape, to: &Shape) -> bool {
    from.rank() == to.rank()
        && from
            .dims
            .iter()
            .zip(to.dims.iter())
            .all(|(&f, &t)| f == 1 || f == t)
}

/// Maps flat indices of a target shape back onto a same-rank source shape
/// whose size-1 dimensions are repeated.
#[derive(Debug, Clone)]
struct BroadcastIndex {
    target_dims: Vec<usize>,
    source_strides: Vec<usize>,
    target_len: usize,
}

impl BroadcastIndex {
    fn new(source: &Shape, target: &Shape) -> Result<Self, String> {
        if !are_broadcastable(source, target) {
            return Err(format!(
                "Cannot tile shape {:?} to shape {:?}",
                source.dims, target.dims
            ));
        }
        // Source stride is zeroed along tiled dimensions.
        let source_strides = source
            .strides()
            .into_iter()
            .zip(source.dims.iter())
            .map(|(s, &d)| if d == 1 { 0 } else { s })
            .collect();

        Ok(Self {
            target_dims: target.dims.clone(),
            source_strides,
            target_len: target.num_elements(),
        })
    }

    /// Source offset for the element at flat `index` of the target.
    fn source_offset(&self, index: usize) -> usize {
        let mut rem = index;
        let mut offset = 0;
        for d in (0..self.target_dims.len()).rev() {
            let dim = self.target_dims[d];
            let coord = rem % dim;
            rem /= dim;
            offset += coord * self.source_strides[d];
        }
        offset
    }
}

/// Values of `a` tiled along its size-1 dimensions to shape `target`, in
/// row-major order. The caller decides where the tiled buffer lives.
pub fn tiled_values<'a>(
    a: &'a Tensor,
    target: &Shape,
) -> Result<impl ExactSizeIterator<Item = f32> + 'a, String> {
    let index = BroadcastIndex::new(&a.shape, target)?;
    let data = &a.data;
    Ok((0..index.target_len).map(move |i| data[index.source_offset(i)]))
}
