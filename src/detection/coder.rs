//! Variance-parameterized interval offset coding.
//!
//! The network does not regress absolute `(start, end)` coordinates. Instead
//! it predicts, per anchor, a center offset and a log-scale length offset
//! relative to that anchor, scaled by two fixed variance constants. [`encode`]
//! produces that representation from absolute intervals (the training target)
//! and [`decode`] is its exact inverse, turning raw network output back into
//! absolute intervals.
//!
//! Without anchors, offsets are taken relative to the total sample length
//! instead; this mode exists for models that do not tile anchors explicitly.

use anyhow::{ensure, Result};

use super::anchors::Anchors;
use crate::interval::{CenterLength, Interval};
use crate::iter::zip_exact;

/// Fixed variance constants `(v0, v1)` scaling the center and length offsets.
pub const VARIANCES: [f32; 2] = [0.1, 0.2];

/// Encodes absolute intervals into anchor-relative offsets.
///
/// With `anchors`, each interval is encoded against the anchor at the same
/// index:
///
/// ```text
/// center_offset = (center - anchor_center) / (v0 * anchor_length)
/// length_offset = ln(length / anchor_length) / v1
/// ```
///
/// Without `anchors`, `total_length` takes the place of the anchor center
/// scale and length.
///
/// # Preconditions
///
/// `total_length` and every interval (and anchor) length must be positive;
/// the logarithm is undefined otherwise and this function asserts rather than
/// returning NaN.
pub fn encode(
    intervals: &[Interval],
    total_length: f32,
    anchors: Option<&Anchors>,
) -> Result<Vec<[f32; 2]>> {
    assert!(total_length > 0.0, "total_length must be positive");

    match anchors {
        None => Ok(intervals
            .iter()
            .map(|interval| {
                let CenterLength { center, length } = interval.center_length();
                assert!(length > 0.0, "cannot encode empty interval {interval}");
                [
                    center / (VARIANCES[0] * total_length),
                    (length / total_length).ln() / VARIANCES[1],
                ]
            })
            .collect()),
        Some(anchors) => {
            ensure!(
                intervals.len() == anchors.anchor_count(),
                "interval count {} does not match anchor count {}",
                intervals.len(),
                anchors.anchor_count()
            );
            Ok(zip_exact(intervals, anchors.as_slice())
                .map(|(interval, anchor)| {
                    let CenterLength { center, length } = interval.center_length();
                    let anchor = anchor.center_length();
                    assert!(length > 0.0, "cannot encode empty interval {interval}");
                    [
                        (center - anchor.center) / (VARIANCES[0] * anchor.length),
                        (length / anchor.length).ln() / VARIANCES[1],
                    ]
                })
                .collect())
        }
    }
}

/// Decodes network offset output back into absolute intervals.
///
/// Exact inverse of [`encode`] under the same anchor mode.
pub fn decode(
    offsets: &[[f32; 2]],
    total_length: f32,
    anchors: Option<&Anchors>,
) -> Result<Vec<Interval>> {
    assert!(total_length > 0.0, "total_length must be positive");

    match anchors {
        None => Ok(offsets
            .iter()
            .map(|&[center, length]| {
                CenterLength {
                    center: center * VARIANCES[0] * total_length,
                    length: (length * VARIANCES[1]).exp() * total_length,
                }
                .to_interval()
            })
            .collect()),
        Some(anchors) => {
            ensure!(
                offsets.len() == anchors.anchor_count(),
                "offset count {} does not match anchor count {}",
                offsets.len(),
                anchors.anchor_count()
            );
            Ok(zip_exact(offsets, anchors.as_slice())
                .map(|(&[center, length], anchor)| {
                    let anchor = anchor.center_length();
                    CenterLength {
                        center: center * VARIANCES[0] * anchor.length + anchor.center,
                        length: (length * VARIANCES[1]).exp() * anchor.length,
                    }
                    .to_interval()
                })
                .collect())
        }
    }
}
