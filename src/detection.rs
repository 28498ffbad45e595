//! Detection assembly from raw network output.
//!
//! The functionality in this module (and submodules) turns the two tensors an
//! anchor-based transition detector emits, per-anchor interval offsets and
//! per-anchor per-class confidence scores, into a fixed-shape [`Detections`]
//! buffer of `(start, end, score)` triples.
//!
//! Class 0 is the background/negative class and is intentionally assembled
//! differently from the foreground classes: it uses the fixed score cutoff
//! only and skips the window boundary check, and its intervals are written
//! without translation or rounding.

pub mod anchors;
pub mod coder;
pub mod nms;
pub mod overlap;

use std::cmp::Reverse;

use anyhow::{ensure, Result};
use ndarray::{Array2, Array4, ArrayView2, ArrayView3, ArrayView4, Axis};

use crate::interval::Interval;
use crate::num::TotalF32;

use self::anchors::Anchors;

/// The background/negative class index.
pub const BACKGROUND_CLASS: usize = 0;

/// Fixed score cutoff applied while filling output slots, on top of the
/// configurable confidence threshold.
const SCORE_CUTOFF: f32 = 0.6;

/// A single assembled detection.
#[derive(Debug, Clone, Copy)]
pub struct Detection {
    interval: Interval,
    score: f32,
}

impl Detection {
    /// Returns the detected interval.
    ///
    /// Foreground detections that failed the window boundary check carry a
    /// zeroed interval here; their score is still meaningful.
    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn score(&self) -> f32 {
        self.score
    }
}

/// Fixed-capacity per-batch-item, per-class detection buffer.
///
/// Backed by an `[batch, num_classes, max_per_class, 3]` tensor of
/// `(start, end, score)` triples plus a `[batch, num_classes]` tensor of
/// filled slot counts. Only the first `count` slots of each class row are
/// meaningful; the rest stay zero.
#[derive(Debug)]
pub struct Detections {
    output: Array4<f32>,
    counts: Array2<u32>,
}

impl Detections {
    fn new(batch_size: usize, num_classes: usize, max_per_class: usize) -> Self {
        Self {
            output: Array4::zeros((batch_size, num_classes, max_per_class, 3)),
            counts: Array2::zeros((batch_size, num_classes)),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.output.shape()[0]
    }

    pub fn num_classes(&self) -> usize {
        self.output.shape()[1]
    }

    /// Returns the slot capacity per (batch item, class) pair.
    pub fn max_per_class(&self) -> usize {
        self.output.shape()[2]
    }

    /// Returns how many slots are filled for the given batch item and class.
    pub fn count(&self, batch: usize, class: usize) -> usize {
        self.counts[[batch, class]] as usize
    }

    /// Returns the total number of detections across all items and classes.
    pub fn len(&self) -> usize {
        self.counts.iter().map(|&c| c as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Returns an iterator over the filled detections of one class row.
    pub fn class_detections(
        &self,
        batch: usize,
        class: usize,
    ) -> impl Iterator<Item = Detection> + '_ {
        (0..self.count(batch, class)).map(move |slot| Detection {
            interval: Interval::new(
                self.output[[batch, class, slot, 0]],
                self.output[[batch, class, slot, 1]],
            ),
            score: self.output[[batch, class, slot, 2]],
        })
    }

    /// Returns the raw `[batch, num_classes, max_per_class, 3]` output tensor.
    pub fn output(&self) -> ArrayView4<'_, f32> {
        self.output.view()
    }

    /// Returns the raw `[batch, num_classes]` slot count tensor.
    pub fn counts(&self) -> ArrayView2<'_, u32> {
        self.counts.view()
    }

    /// Consumes `self`, returning the raw output and count tensors.
    pub fn into_raw(self) -> (Array4<f32>, Array2<u32>) {
        (self.output, self.counts)
    }
}

/// Assembles [`Detections`] from raw network output.
///
/// Holds the immutable run configuration: the anchor set, the class count,
/// the sample window length, and the thresholds. The anchor set is shared
/// read-only, so one `Detector` can serve arbitrarily many concurrent
/// [`detect`](Self::detect) calls.
pub struct Detector {
    anchors: Anchors,
    num_classes: usize,
    sample_duration: u32,
    conf_thresh: f32,
    max_per_class: usize,
}

impl Detector {
    /// The default confidence threshold for considering an anchor at all.
    pub const DEFAULT_CONF_THRESH: f32 = 0.01;

    /// Creates a detector for the given anchor set.
    ///
    /// `sample_duration` must be 8, 16 or 32 frames; `num_classes` must be
    /// non-zero. The per-class slot capacity defaults to the anchor count.
    pub fn new(anchors: Anchors, num_classes: usize, sample_duration: u32) -> Self {
        assert!(
            matches!(sample_duration, 8 | 16 | 32),
            "unsupported sample duration {sample_duration}"
        );
        assert_ne!(num_classes, 0);

        let max_per_class = anchors.anchor_count();
        Self {
            anchors,
            num_classes,
            sample_duration,
            conf_thresh: Self::DEFAULT_CONF_THRESH,
            max_per_class,
        }
    }

    pub fn anchors(&self) -> &Anchors {
        &self.anchors
    }

    /// Sets the confidence threshold below which anchors are ignored.
    pub fn set_conf_thresh(&mut self, conf_thresh: f32) {
        self.conf_thresh = conf_thresh;
    }

    /// Sets the per-class output slot capacity.
    ///
    /// When more candidates qualify than fit, the top-scored ones are kept.
    pub fn set_max_per_class(&mut self, max_per_class: usize) {
        assert_ne!(max_per_class, 0);
        self.max_per_class = max_per_class;
    }

    /// Decodes and assembles one batch of network output.
    ///
    /// # Parameters
    ///
    /// - `loc`: per-anchor offsets, shaped `[batch, anchors, 2]`.
    /// - `conf`: per-anchor per-class scores, shaped
    ///   `[batch, anchors, num_classes]`. Scores are used as-is; apply
    ///   [`crate::num::sigmoid`] first if the network outputs logits.
    /// - `boundaries`: per-batch-item start of the clip window within the
    ///   stitched video, used to translate foreground detections into global
    ///   coordinates. Without it every item's window is
    ///   `[0, sample_duration - 1]`.
    ///
    /// Shape mismatches between the inputs and the configuration are reported
    /// as errors. A batch where nothing passes the confidence threshold is
    /// not an error; its counts are simply zero.
    pub fn detect(
        &self,
        loc: ArrayView3<'_, f32>,
        conf: ArrayView3<'_, f32>,
        boundaries: Option<&[f32]>,
    ) -> Result<Detections> {
        let (batch_size, num_anchors, loc_dims) = loc.dim();
        ensure!(
            loc_dims == 2,
            "loc must contain (center, length) offset pairs, got {loc_dims} values per anchor"
        );
        ensure!(
            num_anchors == self.anchors.anchor_count(),
            "loc covers {num_anchors} anchors, detector is configured for {}",
            self.anchors.anchor_count()
        );
        ensure!(
            conf.dim() == (batch_size, num_anchors, self.num_classes),
            "conf shape {:?} does not match loc batch/anchor shape and {} classes",
            conf.dim(),
            self.num_classes
        );
        if let Some(bounds) = boundaries {
            ensure!(
                bounds.len() == batch_size,
                "{} boundaries for a batch of {batch_size}",
                bounds.len()
            );
        }

        let total_length = self.sample_duration as f32;
        let mut detections = Detections::new(batch_size, self.num_classes, self.max_per_class);

        for item in 0..batch_size {
            let offsets: Vec<[f32; 2]> = loc
                .index_axis(Axis(0), item)
                .outer_iter()
                .map(|row| [row[0], row[1]])
                .collect();
            let bars = coder::decode(&offsets, total_length, Some(&self.anchors))?;

            let bound_start = boundaries.map_or(0.0, |bounds| bounds[item]);
            let bound_end = bound_start + total_length - 1.0;

            for class in 0..self.num_classes {
                let mut candidates: Vec<(usize, f32)> = (0..num_anchors)
                    .filter_map(|anchor| {
                        let score = conf[[item, anchor, class]];
                        (score > self.conf_thresh).then_some((anchor, score))
                    })
                    .collect();
                if candidates.is_empty() {
                    continue;
                }
                candidates.sort_unstable_by_key(|&(_, score)| Reverse(TotalF32(score)));

                let mut count = 0;
                for &(anchor, score) in &candidates {
                    if count == self.max_per_class || score < SCORE_CUTOFF {
                        break;
                    }
                    let slot = &mut detections.output;
                    if class == BACKGROUND_CLASS {
                        // Background bars stay in window-local, un-rounded
                        // coordinates and skip the boundary check.
                        slot[[item, class, count, 0]] = bars[anchor].start();
                        slot[[item, class, count, 1]] = bars[anchor].end();
                    } else {
                        let bar = bars[anchor].translate(bound_start);
                        let start = bar.start().round();
                        let end = bar.end().round();
                        let in_window = (bound_start..=bound_end).contains(&start)
                            && (bound_start..=bound_end).contains(&end);
                        if in_window {
                            slot[[item, class, count, 0]] = start;
                            slot[[item, class, count, 1]] = end;
                        }
                        // out-of-window candidates keep their zeroed interval
                        // but still consume the slot and record the score
                    }
                    slot[[item, class, count, 2]] = score;
                    count += 1;
                }

                detections.counts[[item, class]] = count as u32;
            }

            log::trace!(
                "item {item}: {:?} detections per class",
                detections.counts.index_axis(Axis(0), item)
            );
        }

        Ok(detections)
    }
}
