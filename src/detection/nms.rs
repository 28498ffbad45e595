//! Non-Maximum Suppression for interval detections.
//!
//! Anchor-based detectors produce several overlapping candidates for a single
//! transition. NMS ranks candidates by confidence and greedily drops the ones
//! that overlap an already kept candidate too much.
//!
//! Three suppression policies are implemented, selected with
//! [`SuppressionPolicy`]: the classic IoU-threshold rule
//! ([`SuppressionPolicy::Overlap`]), and two variants that special-case
//! candidates starting exactly one frame after the kept candidate. Gradual
//! transitions tend to produce such off-by-one candidates, and depending on
//! the policy they are either a genuine neighbor worth keeping or a duplicate
//! worth dropping.

use anyhow::{ensure, Result};
use itertools::Itertools;

use crate::interval::Interval;
use crate::num::TotalF32;

/// A greedy rank-based non-maximum suppressor.
///
/// Carries only configuration; every [`process`](Self::process) call is an
/// independent, pure computation.
pub struct NonMaxSuppression {
    iou_thresh: f32,
    top_k: usize,
    policy: SuppressionPolicy,
}

impl NonMaxSuppression {
    /// The default intersection-over-union threshold used to determine if two
    /// candidates overlap.
    pub const DEFAULT_IOU_THRESH: f32 = 0.5;

    /// Creates a new suppressor using [`SuppressionPolicy::Overlap`], the
    /// default IoU threshold, and no top-k restriction.
    pub fn new() -> Self {
        Self {
            iou_thresh: Self::DEFAULT_IOU_THRESH,
            top_k: 0,
            policy: SuppressionPolicy::Overlap,
        }
    }

    /// Sets the intersection-over-union threshold above which a candidate is
    /// considered a duplicate of a kept candidate.
    pub fn set_iou_thresh(&mut self, iou_thresh: f32) {
        self.iou_thresh = iou_thresh;
    }

    /// Restricts suppression to the `top_k` highest-scoring candidates.
    ///
    /// `0` (the default) considers all candidates.
    pub fn set_top_k(&mut self, top_k: usize) {
        self.top_k = top_k;
    }

    /// Sets the suppression policy.
    pub fn set_policy(&mut self, policy: SuppressionPolicy) {
        self.policy = policy;
    }

    /// Runs suppression over a candidate set.
    ///
    /// `intervals` and `scores` describe the same candidates and must have
    /// equal lengths.
    ///
    /// Returns `(keep, count)`: the first `count` entries of `keep` are the
    /// indices of the kept candidates in the original input order, in order of
    /// decreasing score. `keep` always has the input length; entries past
    /// `count` are zero padding.
    pub fn process(&self, intervals: &[Interval], scores: &[f32]) -> Result<(Vec<usize>, usize)> {
        ensure!(
            intervals.len() == scores.len(),
            "interval count {} does not match score count {}",
            intervals.len(),
            scores.len()
        );

        let mut keep = vec![0; intervals.len()];
        if intervals.is_empty() {
            return Ok((keep, 0));
        }

        // Ascending by score; the current best is popped off the back.
        let mut idx: Vec<usize> = (0..scores.len())
            .sorted_by_key(|&i| TotalF32(scores[i]))
            .collect();
        if self.top_k != 0 && idx.len() > self.top_k {
            idx = idx.split_off(idx.len() - self.top_k);
        }

        let mut count = 0;
        while let Some(i) = idx.pop() {
            keep[count] = i;
            count += 1;
            if idx.is_empty() {
                break;
            }

            let seed = intervals[i];
            idx.retain(|&j| self.retains(&seed, &intervals[j]));
        }

        Ok((keep, count))
    }

    /// Decides whether `other` stays in the working set after `seed` was kept.
    ///
    /// Overlap is measured within `seed`'s own span: `other` is clamped into
    /// `seed` before computing the intersection, while the union still uses
    /// `other`'s full length.
    fn retains(&self, seed: &Interval, other: &Interval) -> bool {
        let clamped_start = other.start().max(seed.start());
        let clamped_end = other.end().min(seed.end());
        let inter = (clamped_end - clamped_start + 1.0).max(0.0);
        let union = seed.length() + other.length() - inter;
        let iou = inter / union;

        let no_overlap = iou <= self.iou_thresh;
        let adjacent = clamped_start - seed.start() == 1.0;
        match self.policy {
            SuppressionPolicy::Overlap => no_overlap,
            SuppressionPolicy::KeepAdjacent => no_overlap || adjacent,
            SuppressionPolicy::DropAdjacentHalf => no_overlap && !(adjacent && iou == 0.5),
        }
    }
}

impl Default for NonMaxSuppression {
    fn default() -> Self {
        Self::new()
    }
}

/// Describes how [`NonMaxSuppression`] treats candidates overlapping a kept
/// candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionPolicy {
    /// Drop any candidate whose IoU with the kept candidate exceeds the
    /// threshold.
    Overlap,

    /// Like [`Overlap`](Self::Overlap), but candidates starting exactly one
    /// frame after the kept candidate survive regardless of their IoU.
    ///
    /// Adjacency is treated as a different relation than overlap here; used
    /// for gradual transition intervals, where the one-frame neighbor is a
    /// distinct hypothesis rather than a duplicate.
    KeepAdjacent,

    /// Like [`Overlap`](Self::Overlap), but a candidate is additionally
    /// dropped when it starts exactly one frame after the kept candidate
    /// *and* its IoU is exactly 0.5, even below the threshold.
    DropAdjacentHalf,
}
