// tests/cosine_distance_scenarios.rs

use approx::assert_abs_diff_eq;
use cosdist::{
    compute, infer_output_shape, CosineDistanceLoss, DType, ErrorKind, LossError, Reduction,
    Shape, Tensor,
};

fn tensor(dims: Vec<usize>, vals: Vec<f32>) -> Tensor {
    Tensor::new(Shape::new(dims), vals).unwrap()
}

fn identity_2x2() -> Tensor {
    tensor(vec![2, 2], vec![1.0, 0.0, 0.0, 1.0])
}

/// Rows of unit vectors: [1, 0], [0.6, 0.8], [0, 1]
fn unit_rows() -> Tensor {
    tensor(vec![3, 2], vec![1.0, 0.0, 0.6, 0.8, 0.0, 1.0])
}

fn run(reduction: Reduction, axis: i64, p: &Tensor, w: &Tensor, l: &Tensor) -> Tensor {
    CosineDistanceLoss::new(reduction, axis)
        .evaluate(p, w, l)
        .unwrap()
}

#[test]
fn test_identical_inputs_weighted_sum_is_zero() {
    let x = identity_2x2();
    let out = run(Reduction::WeightedSum, 1, &x, &Tensor::scalar(1.0), &x);

    assert!(out.shape.is_scalar());
    assert_abs_diff_eq!(out.data[0], 0.0);
}

#[test]
fn test_zero_scalar_weight_weighted_mean_is_zero() {
    let x = identity_2x2();
    let out = run(Reduction::WeightedMean, 1, &x, &Tensor::scalar(0.0), &x);

    assert!(out.data[0].is_finite());
    assert_eq!(out.data[0], 0.0);
}

#[test]
fn test_zero_scalar_weight_non_zero_mode_is_zero() {
    let p = unit_rows();
    let l = tensor(vec![3, 2], vec![0.0, 1.0, 1.0, 0.0, 1.0, 0.0]);
    let out = run(
        Reduction::WeightedSumByNonZeroWeights,
        -1,
        &p,
        &Tensor::scalar(0.0),
        &l,
    );
    assert_eq!(out.data[0], 0.0);
}

#[test]
fn test_mode_none_per_row_distances() {
    let p = unit_rows();
    let l = tensor(vec![3, 2], vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    let w = tensor(vec![3, 1], vec![1.0, 2.0, 0.5]);

    let out = run(Reduction::None, 1, &p, &w, &l);

    assert_eq!(out.shape.dims, vec![3, 1]);
    assert_abs_diff_eq!(out.data[0], 0.0);
    assert_abs_diff_eq!(out.data[1], 2.0 * 0.4, epsilon = 1e-6);
    assert_abs_diff_eq!(out.data[2], 0.5, epsilon = 1e-6);
}

#[test]
fn test_mode_none_along_first_axis() {
    // Columns are the vectors: [1, 0] and [0, 1] vs labels [0, 1] and [0, 1]
    let p = identity_2x2();
    let l = tensor(vec![2, 2], vec![0.0, 0.0, 1.0, 1.0]);

    let out = run(Reduction::None, 0, &p, &Tensor::scalar(1.0), &l);

    assert_eq!(out.shape.dims, vec![1, 2]);
    assert_abs_diff_eq!(out.data[0], 1.0);
    assert_abs_diff_eq!(out.data[1], 0.0);
}

#[test]
fn test_weighted_sum_matches_sum_of_unreduced() {
    let p = unit_rows();
    let l = tensor(vec![3, 2], vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    let w = tensor(vec![3, 1], vec![0.5, 1.0, 3.0]);

    let none = run(Reduction::None, -1, &p, &w, &l);
    let sum = run(Reduction::WeightedSum, -1, &p, &w, &l);

    let expected: f32 = none.data.iter().sum();
    assert_abs_diff_eq!(sum.data[0], expected, epsilon = 1e-6);
}

#[test]
fn test_weighted_mean_tensor_weights() {
    let p = unit_rows();
    let l = tensor(vec![3, 2], vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    let w = tensor(vec![3, 1], vec![1.0, 1.0, 2.0]);

    // E = [1, 0.2, 0] weighted -> [1, 0.2, 0], sum 1.2, weights sum 4
    let out = run(Reduction::WeightedMean, 1, &p, &w, &l);
    assert_abs_diff_eq!(out.data[0], 1.2 / 4.0, epsilon = 1e-6);
}

#[test]
fn test_weighted_mean_scalar_equals_uniform_tensor() {
    let p = unit_rows();
    let l = tensor(vec![3, 2], vec![0.0, 1.0, 1.0, 0.0, 0.6, 0.8]);

    let scalar = run(Reduction::WeightedMean, 1, &p, &Tensor::scalar(0.7), &l);
    let uniform = run(
        Reduction::WeightedMean,
        1,
        &p,
        &tensor(vec![3, 1], vec![0.7; 3]),
        &l,
    );

    assert_abs_diff_eq!(scalar.data[0], uniform.data[0], epsilon = 1e-6);
}

#[test]
fn test_weighted_mean_zero_weight_tensor() {
    let p = unit_rows();
    let w = tensor(vec![3, 1], vec![0.0; 3]);
    let out = run(Reduction::WeightedMean, 1, &p, &w, &zeros_like(&p));
    assert_eq!(out.data[0], 0.0);
}

fn zeros_like(t: &Tensor) -> Tensor {
    tensor(t.shape.dims.clone(), vec![0.0; t.len()])
}

#[test]
fn test_non_zero_weights_counts_k() {
    let p = unit_rows();
    let l = tensor(vec![3, 2], vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    let w = tensor(vec![3, 1], vec![2.0, 0.0, 1.0]);

    // E * w = [2, 0, 0], two non-zero weights
    let out = run(Reduction::WeightedSumByNonZeroWeights, 1, &p, &w, &l);
    assert_abs_diff_eq!(out.data[0], 1.0, epsilon = 1e-6);

    let zeros = tensor(vec![3, 1], vec![0.0; 3]);
    let out = run(Reduction::WeightedSumByNonZeroWeights, 1, &p, &zeros, &l);
    assert_eq!(out.data[0], 0.0);
}

#[test]
fn test_non_zero_weights_scalar_uses_length() {
    let p = unit_rows();
    let l = tensor(vec![3, 2], vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);

    // E = [1, 0.2, 0] * 2, divided by 3 entries
    let out = run(
        Reduction::WeightedSumByNonZeroWeights,
        1,
        &p,
        &Tensor::scalar(2.0),
        &l,
    );
    assert_abs_diff_eq!(out.data[0], 2.4 / 3.0, epsilon = 1e-6);
}

#[test]
fn test_rank3_weights_broadcast_over_batch() {
    // [batch=2, rows=2, dim=2], reduce dim
    let p = tensor(
        vec![2, 2, 2],
        vec![1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0],
    );
    let l = tensor(
        vec![2, 2, 2],
        vec![0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0],
    );
    // Per-row weights shared across the batch
    let w = tensor(vec![1, 2, 1], vec![1.0, 10.0]);

    let out = run(Reduction::None, -1, &p, &w, &l);
    assert_eq!(out.shape.dims, vec![2, 2, 1]);
    assert_eq!(out.data, vec![1.0, 0.0, 0.0, 10.0]);
}

#[test]
fn test_single_element_weights_on_rank3_labels() {
    let p = tensor(
        vec![2, 2, 2],
        vec![1.0, 0.0, 0.0, 1.0, 0.6, 0.8, 0.0, 1.0],
    );
    let l = tensor(
        vec![2, 2, 2],
        vec![0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0],
    );
    let single = tensor(vec![1], vec![0.5]);

    for reduction in Reduction::ALL {
        let spec =
            infer_output_shape(&p.shape, p.dtype, &l.shape, reduction.code(), -1).unwrap();
        let mut out = Tensor::zeros(spec.shape, spec.dtype);
        compute(&p, &single, &l, &mut out, reduction.code(), -1).unwrap();

        let scalar = run(reduction, -1, &p, &Tensor::scalar(0.5), &l);
        assert_eq!(out, scalar, "{}", reduction);
    }
}

#[test]
fn test_one_by_one_weights_match_scalar_in_non_zero_mode() {
    let p = unit_rows();
    let l = tensor(vec![3, 2], vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    let w = tensor(vec![1, 1], vec![2.0]);

    // Divides by length(E) = 3, not by the single non-zero weight
    let out = run(Reduction::WeightedSumByNonZeroWeights, 1, &p, &w, &l);
    assert_abs_diff_eq!(out.data[0], 2.4 / 3.0, epsilon = 1e-6);

    let scalar = run(
        Reduction::WeightedSumByNonZeroWeights,
        1,
        &p,
        &Tensor::scalar(2.0),
        &l,
    );
    assert_eq!(out, scalar);
}

#[test]
fn test_three_unit_dims_weights_still_need_matching_rank() {
    let x = identity_2x2();
    let w = tensor(vec![1, 1, 1], vec![1.0]);
    let mut out = Tensor::scalar(0.0);

    let err = compute(&x, &w, &x, &mut out, 1, 1).unwrap_err();
    assert!(matches!(
        err,
        LossError::WeightsRankMismatch {
            weights_rank: 3,
            labels_rank: 2
        }
    ));
}

#[test]
fn test_shape_mismatch_on_both_entry_points() {
    let p = tensor(vec![2, 4], vec![0.0; 8]);
    let l = tensor(vec![2, 3], vec![0.0; 6]);

    let err = infer_output_shape(&p.shape, DType::Float32, &l.shape, 1, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShapeMismatch);

    let mut out = Tensor::scalar(0.0);
    let err = compute(&p, &Tensor::scalar(1.0), &l, &mut out, 1, 1).unwrap_err();
    assert_eq!(
        err,
        LossError::ShapeMismatch {
            labels: Shape::new(vec![2, 3]),
            predictions: Shape::new(vec![2, 4]),
        }
    );
}

#[test]
fn test_weights_rank_mismatch() {
    let x = identity_2x2();
    let w = tensor(vec![2], vec![1.0, 1.0]);
    let mut out = Tensor::scalar(0.0);

    let err = compute(&x, &w, &x, &mut out, 1, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WeightsIncompatible);
    assert!(matches!(
        err,
        LossError::WeightsRankMismatch {
            weights_rank: 1,
            labels_rank: 2
        }
    ));
}

#[test]
fn test_weights_not_broadcastable_to_labels() {
    let x = identity_2x2();
    let w = tensor(vec![3, 1], vec![1.0; 3]);
    let mut out = Tensor::scalar(0.0);

    let err = compute(&x, &w, &x, &mut out, 1, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WeightsIncompatible);
    assert!(err.to_string().contains("[3, 1]"));
}

#[test]
fn test_axis_out_of_range() {
    let x = tensor(vec![1, 2, 2], vec![1.0, 0.0, 0.0, 1.0]);
    let mut out = Tensor::scalar(0.0);

    for axis in [5, -10, 3, -4] {
        let err = compute(&x, &Tensor::scalar(1.0), &x, &mut out, 1, axis).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AxisOutOfRange, "axis {}", axis);
    }
}

#[test]
fn test_invalid_reduction_mode() {
    let x = identity_2x2();
    let mut out = Tensor::scalar(0.0);
    let err = compute(&x, &Tensor::scalar(1.0), &x, &mut out, 7, 1).unwrap_err();

    assert_eq!(err, LossError::InvalidReductionMode(7));
    assert!(err.to_string().contains('7'));
}

#[test]
fn test_raw_entry_points_match_typed_operator() {
    let p = unit_rows();
    let l = tensor(vec![3, 2], vec![0.0, 1.0, 1.0, 0.0, 0.6, 0.8]);
    let w = tensor(vec![3, 1], vec![1.0, 0.0, 2.0]);

    for reduction in Reduction::ALL {
        let spec =
            infer_output_shape(&p.shape, p.dtype, &l.shape, reduction.code(), -1).unwrap();
        let mut raw = Tensor::zeros(spec.shape, spec.dtype);
        compute(&p, &w, &l, &mut raw, reduction.code(), -1).unwrap();

        let typed = run(reduction, -1, &p, &w, &l);
        assert_eq!(raw, typed, "{}", reduction);
    }
}
