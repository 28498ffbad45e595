//! Interval overlap metrics over whole candidate sets.
//!
//! The scalar Intersection over Union lives on [`Interval`] itself; this
//! module provides the two batched forms the rest of the pipeline needs: a
//! one-to-one paired mode for equal-length interval lists, and an all-pairs
//! broadcast used to match ground truth transitions against the anchor set.

use ndarray::Array2;

use crate::interval::Interval;
use crate::iter::zip_exact;

/// Computes the element-wise IoU of two paired interval lists.
///
/// Panics if the lists have different lengths.
#[track_caller]
pub fn iou(a: &[Interval], b: &[Interval]) -> Vec<f32> {
    zip_exact(a, b).map(|(a, b)| a.iou(b)).collect()
}

/// Computes the IoU of every `truths` x `anchors` pair.
///
/// Returns a matrix of shape `[truths.len(), anchors.len()]`.
pub fn iou_matrix(truths: &[Interval], anchors: &[Interval]) -> Array2<f32> {
    Array2::from_shape_fn((truths.len(), anchors.len()), |(t, a)| {
        truths[t].iou(&anchors[a])
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn paired_iou_matches_scalar() {
        let a = vec![Interval::new(0.0, 5.0), Interval::new(2.0, 2.0)];
        let b = vec![Interval::new(3.0, 9.0), Interval::new(2.0, 2.0)];
        let result = iou(&a, &b);
        assert_eq!(result.len(), 2);
        assert_relative_eq!(result[0], a[0].iou(&b[0]));
        assert_eq!(result[1], 1.0);
    }

    #[test]
    #[should_panic]
    fn paired_iou_rejects_length_mismatch() {
        iou(&[Interval::new(0.0, 1.0)], &[]);
    }

    #[test]
    fn matrix_covers_all_pairs() {
        let truths = vec![Interval::new(0.0, 3.0), Interval::new(8.0, 11.0)];
        let anchors = vec![
            Interval::new(0.0, 3.0),
            Interval::new(2.0, 5.0),
            Interval::new(12.0, 15.0),
        ];
        let m = iou_matrix(&truths, &anchors);
        assert_eq!(m.dim(), (2, 3));
        assert_eq!(m[[0, 0]], 1.0);
        // [0,3] vs [2,5]: 2 shared frames of 6 total
        assert_relative_eq!(m[[0, 1]], 2.0 / 6.0);
        assert_eq!(m[[0, 2]], 0.0);
        assert_eq!(m[[1, 2]], 0.0);
    }

    #[test]
    fn matrix_is_transpose_symmetric() {
        let a = vec![Interval::new(0.0, 4.0), Interval::new(3.0, 7.0)];
        let b = vec![Interval::new(1.0, 5.0)];
        let ab = iou_matrix(&a, &b);
        let ba = iou_matrix(&b, &a);
        assert_eq!(ab[[0, 0]], ba[[0, 0]]);
        assert_eq!(ab[[1, 0]], ba[[0, 1]]);
    }
}
