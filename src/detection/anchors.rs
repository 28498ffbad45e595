//! Anchor ("default bar") generation for anchor-based transition detectors.
//!
//! Anchors are fixed reference intervals tiled over the sample window. The
//! network regresses offsets relative to them, so the anchor list is part of
//! the model configuration: it is generated once and treated as immutable for
//! the lifetime of a run.

use std::ops::Index;

use crate::interval::Interval;

/// Describes one anchor scale of the detector.
///
/// Each scale tiles the sample window with anchors of a fixed length, stepped
/// by a fixed stride.
#[derive(Debug, Clone, Copy)]
pub struct LayerInfo {
    /// Anchor length in frames. Must be non-zero.
    length: u32,
    /// Step between consecutive anchor starts. Must be non-zero.
    stride: u32,
}

impl LayerInfo {
    /// Creates a new anchor scale description.
    ///
    /// # Parameters
    ///
    /// - `length`: the number of frames covered by each anchor of this scale.
    /// - `stride`: the step between consecutive anchor start positions.
    pub fn new(length: u32, stride: u32) -> Self {
        assert_ne!(length, 0);
        assert_ne!(stride, 0);
        Self { length, stride }
    }
}

/// Parameters for [`Anchors::calculate`].
pub struct AnchorParams<'a> {
    /// Number of frames in one sample window.
    pub sample_duration: u32,
    /// List of anchor scales.
    pub layers: &'a [LayerInfo],
}

/// The fixed anchor intervals of a detector, in generation order.
///
/// Never mutated after construction, so it can be shared freely between
/// concurrent detection calls.
pub struct Anchors {
    anchors: Vec<Interval>,
}

impl Anchors {
    /// Generates the anchor list for the given scales.
    ///
    /// For each layer, anchors `[start, start + length - 1]` are emitted for
    /// every `start` in `0..=(sample_duration - length)` stepped by the
    /// layer's stride.
    pub fn calculate(params: &AnchorParams<'_>) -> Self {
        let mut anchors = Vec::new();

        for layer in params.layers {
            assert!(
                layer.length <= params.sample_duration,
                "anchor length {} exceeds sample duration {}",
                layer.length,
                params.sample_duration
            );
            for start in (0..=params.sample_duration - layer.length).step_by(layer.stride as usize)
            {
                anchors.push(Interval::new(
                    start as f32,
                    (start + layer.length - 1) as f32,
                ));
            }
        }

        Self { anchors }
    }

    /// Generates the default anchor configuration for a sample window of
    /// `sample_duration` frames.
    ///
    /// One scale per power of two from 2 up to `sample_duration`, each with a
    /// stride of half the anchor length.
    pub fn for_sample_duration(sample_duration: u32) -> Self {
        assert!(
            matches!(sample_duration, 8 | 16 | 32),
            "unsupported sample duration {sample_duration}"
        );

        let mut layers = Vec::new();
        let mut length = 2;
        while length <= sample_duration {
            layers.push(LayerInfo::new(length, (length / 2).max(1)));
            length *= 2;
        }

        Self::calculate(&AnchorParams {
            sample_duration,
            layers: &layers,
        })
    }

    /// Returns the total number of anchors.
    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// Returns the anchors as a plain interval slice.
    pub fn as_slice(&self) -> &[Interval] {
        &self.anchors
    }

    /// Returns an iterator over the anchor intervals.
    pub fn iter(&self) -> impl Iterator<Item = &Interval> + '_ {
        self.anchors.iter()
    }
}

impl Index<usize> for Anchors {
    type Output = Interval;

    fn index(&self, index: usize) -> &Interval {
        &self.anchors[index]
    }
}
