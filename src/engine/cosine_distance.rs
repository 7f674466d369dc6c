// src/engine/cosine_distance.rs
//
// Cosine distance loss:
//
//   E = weights * (1 - sum_axis(predictions * labels))
//
// reduced according to a `Reduction`. Inputs are expected to be
// L2-normalized already; the operator does not normalize them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::tensor::{DType, Shape, Tensor};

use super::context::ExecutionContext;
use super::error::LossError;
use super::kernels::{
    are_broadcastable, count_non_zero, mul_assign, multiply, reduce_sum, rsub_scalar,
    scale_assign, sum_all, tiled_values,
};
use super::operations::Reduction;

/// Shape and element type the host must allocate for the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub shape: Shape,
    pub dtype: DType,
}

/// Negative axes count from the end of the labels' rank.
///
/// Both entry points go through this function so they always agree on the
/// reduction axis.
pub fn normalize_axis(axis: i64, labels_rank: usize) -> i64 {
    if axis < 0 {
        axis + labels_rank as i64
    } else {
        axis
    }
}

fn checked_axis(axis: i64, labels_rank: usize) -> Result<usize, LossError> {
    let normalized = normalize_axis(axis, labels_rank);
    if normalized < 0 || normalized >= labels_rank as i64 {
        return Err(LossError::AxisOutOfRange {
            axis,
            normalized,
            rank: labels_rank,
        });
    }
    Ok(normalized as usize)
}

fn ensure_same_shape(labels: &Shape, predictions: &Shape) -> Result<(), LossError> {
    if labels != predictions {
        return Err(LossError::ShapeMismatch {
            labels: labels.clone(),
            predictions: predictions.clone(),
        });
    }
    Ok(())
}

fn ensure_float(role: &'static str, dtype: DType) -> Result<(), LossError> {
    if !dtype.is_float() {
        return Err(LossError::UnsupportedDType { role, dtype });
    }
    Ok(())
}

/// Output shape inference. Reads shapes only, never tensor contents.
///
/// Any non-zero `reduction_mode` yields a rank-0 output; mode validity is
/// checked by [`compute`].
pub fn infer_output_shape(
    predictions: &Shape,
    predictions_dtype: DType,
    labels: &Shape,
    reduction_mode: i64,
    axis: i64,
) -> Result<OutputSpec, LossError> {
    ensure_same_shape(labels, predictions)?;

    let shape = if reduction_mode != 0 {
        Shape::scalar()
    } else {
        let axis = checked_axis(axis, labels.rank())?;
        predictions.collapse_axis(axis)
    };

    debug!(
        predictions = %predictions,
        reduction_mode,
        axis,
        output = %shape,
        "inferred cosine distance loss output shape"
    );

    Ok(OutputSpec {
        shape,
        dtype: predictions_dtype,
    })
}

/// Validates the inputs of [`compute`], returning the parsed reduction and
/// the normalized axis.
pub fn validate(
    predictions: &Tensor,
    weights: &Tensor,
    labels: &Tensor,
    reduction_mode: i64,
    axis: i64,
) -> Result<(Reduction, usize), LossError> {
    ensure_same_shape(&labels.shape, &predictions.shape)?;

    let scalar_weights = weights.is_scalar_like();
    if !scalar_weights && weights.rank() != labels.rank() {
        return Err(LossError::WeightsRankMismatch {
            weights_rank: weights.rank(),
            labels_rank: labels.rank(),
        });
    }
    if !scalar_weights && !are_broadcastable(&weights.shape, &labels.shape) {
        return Err(LossError::WeightsNotBroadcastable {
            weights: weights.shape.clone(),
            target: labels.shape.clone(),
        });
    }

    let axis = checked_axis(axis, labels.rank())?;
    let reduction = Reduction::try_from(reduction_mode)?;

    // Weights are tiled onto the reduced shape, so the reduction axis
    // must be size 1 on the weights as well.
    let reduced = labels.shape.collapse_axis(axis);
    if !scalar_weights && !are_broadcastable(&weights.shape, &reduced) {
        return Err(LossError::WeightsNotBroadcastable {
            weights: weights.shape.clone(),
            target: reduced,
        });
    }

    ensure_float("predictions", predictions.dtype)?;
    ensure_float("labels", labels.dtype)?;

    Ok((reduction, axis))
}

/// Weights as seen by the reduction step.
enum WeightsView<'a> {
    Scalar(f32),
    Dense {
        /// Weights shaped like `E`, either the caller's buffer or a tiled copy
        broadcast: &'a [f32],
        /// The caller's weights before any tiling
        original: &'a Tensor,
    },
}

fn broadcast_weights<'a>(
    ctx: &'a mut ExecutionContext,
    weights: &'a Tensor,
    target: &Shape,
) -> Result<WeightsView<'a>, LossError> {
    if let Some(w) = weights.scalar_like_value() {
        return Ok(WeightsView::Scalar(w));
    }
    if weights.shape == *target {
        return Ok(WeightsView::Dense {
            broadcast: &weights.data,
            original: weights,
        });
    }

    let tiled = tiled_values(weights, target).map_err(LossError::Kernel)?;
    debug!(
        weights = %weights.shape,
        reduced = %target,
        "tiling weights onto reduced shape"
    );
    let broadcast = ctx.alloc_from_iter(tiled);
    Ok(WeightsView::Dense {
        broadcast,
        original: weights,
    })
}

/// Per-element cosine distances `1 - sum_axis(predictions * labels)`,
/// with `axis` kept as size 1.
fn cosine_distances(
    predictions: &Tensor,
    labels: &Tensor,
    axis: usize,
) -> Result<Tensor, LossError> {
    let product = multiply(predictions, labels).map_err(LossError::Kernel)?;
    let similarity = reduce_sum(&product, &[axis], true).map_err(LossError::Kernel)?;
    Ok(rsub_scalar(1.0, &similarity))
}

fn reduce(reduction: Reduction, losses: Tensor, weights: &WeightsView<'_>) -> Tensor {
    match reduction {
        Reduction::None => losses,
        Reduction::WeightedSum => Tensor::scalar(sum_all(&losses.data)),
        Reduction::WeightedMean => {
            let denominator = match weights {
                WeightsView::Scalar(w) => w * losses.len() as f32,
                WeightsView::Dense { broadcast, .. } => sum_all(broadcast),
            };
            if denominator == 0.0 {
                debug!("sum of weights is zero, weighted mean is 0");
                return Tensor::scalar(0.0);
            }
            Tensor::scalar(sum_all(&losses.data) / denominator)
        }
        Reduction::WeightedSumByNonZeroWeights => {
            let non_zero = match weights {
                WeightsView::Scalar(w) if *w != 0.0 => losses.len(),
                WeightsView::Scalar(_) => 0,
                WeightsView::Dense { original, .. } => count_non_zero(&original.data),
            };
            if non_zero == 0 {
                debug!("no non-zero weights, loss is 0");
                return Tensor::scalar(0.0);
            }
            Tensor::scalar(sum_all(&losses.data) / non_zero as f32)
        }
    }
}

/// Runs the loss with scratch buffers taken from `ctx`. Inputs must have
/// passed [`validate`].
pub(crate) fn compute_with_context(
    ctx: &mut ExecutionContext,
    predictions: &Tensor,
    weights: &Tensor,
    labels: &Tensor,
    reduction: Reduction,
    axis: usize,
) -> Result<Tensor, LossError> {
    let mut losses = cosine_distances(predictions, labels, axis)?;

    let view = broadcast_weights(ctx, weights, &losses.shape)?;
    match &view {
        WeightsView::Scalar(w) => scale_assign(&mut losses, *w),
        WeightsView::Dense { broadcast, .. } => {
            mul_assign(&mut losses, broadcast).map_err(LossError::Kernel)?
        }
    }

    Ok(reduce(reduction, losses, &view))
}

/// Computes the loss into a pre-allocated `output` whose shape must match
/// [`infer_output_shape`] for the same arguments.
///
/// On error `output` is left untouched.
pub fn compute(
    predictions: &Tensor,
    weights: &Tensor,
    labels: &Tensor,
    output: &mut Tensor,
    reduction_mode: i64,
    axis: i64,
) -> Result<(), LossError> {
    let (reduction, normalized) = validate(predictions, weights, labels, reduction_mode, axis)?;

    let expected = if reduction.is_scalar_output() {
        Shape::scalar()
    } else {
        labels.shape.collapse_axis(normalized)
    };
    if output.shape != expected {
        return Err(LossError::OutputShapeMismatch {
            expected,
            actual: output.shape.clone(),
        });
    }
    if output.data.len() != expected.num_elements() {
        return Err(LossError::InvalidTensor(format!(
            "output holds {} values for shape {}",
            output.data.len(),
            expected
        )));
    }
    ensure_float("output", output.dtype)?;

    debug!(
        predictions = %predictions.shape,
        weights = %weights.shape,
        %reduction,
        axis = normalized,
        "computing cosine distance loss"
    );

    let mut ctx = ExecutionContext::new();
    let result = compute_with_context(
        &mut ctx,
        predictions,
        weights,
        labels,
        reduction,
        normalized,
    )?;
    debug!(
        scratch_buffers = ctx.scratch_buffers(),
        "releasing execution context"
    );

    output.data.copy_from_slice(&result.data);
    Ok(())
}

/// Cosine distance loss with a fixed reduction and axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosineDistanceLoss {
    pub reduction: Reduction,
    pub axis: i64,
}

impl Default for CosineDistanceLoss {
    fn default() -> Self {
        Self {
            reduction: Reduction::default(),
            axis: -1,
        }
    }
}

impl CosineDistanceLoss {
    pub fn new(reduction: Reduction, axis: i64) -> Self {
        Self { reduction, axis }
    }

    pub fn infer(
        &self,
        predictions: &Shape,
        predictions_dtype: DType,
        labels: &Shape,
    ) -> Result<OutputSpec, LossError> {
        infer_output_shape(
            predictions,
            predictions_dtype,
            labels,
            self.reduction.code(),
            self.axis,
        )
    }

    pub fn compute_into(
        &self,
        predictions: &Tensor,
        weights: &Tensor,
        labels: &Tensor,
        output: &mut Tensor,
    ) -> Result<(), LossError> {
        compute(
            predictions,
            weights,
            labels,
            output,
            self.reduction.code(),
            self.axis,
        )
    }

    /// Infers the output, allocates it and computes into it.
    pub fn evaluate(
        &self,
        predictions: &Tensor,
        weights: &Tensor,
        labels: &Tensor,
    ) -> Result<Tensor, LossError> {
        let spec = self.infer(&predictions.shape, predictions.dtype, &labels.shape)?;
        let mut output = Tensor::zeros(spec.shape, spec.dtype);
        self.compute_into(predictions, weights, labels, &mut output)?;
        Ok(output)
    }
}
