//! Closed frame intervals and their center/length representation.

use std::fmt;

/// A closed interval `[start, end]` over discrete frame indices.
///
/// Coordinates are stored as floats because decoded network output is
/// fractional until the final rounding step, but the interval is still
/// interpreted as a range of discrete positions: its length is
/// `end - start + 1`, the inclusive count of covered frames, not the
/// continuous span. A degenerate empty interval (`end == start - 1`) is
/// permitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    start: f32,
    end: f32,
}

impl Interval {
    /// Creates an interval from its first and last covered frame.
    pub fn new(start: f32, end: f32) -> Self {
        debug_assert!(
            end >= start - 1.0,
            "invalid interval [{start}, {end}]"
        );
        Self { start, end }
    }

    #[inline]
    pub fn start(&self) -> f32 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> f32 {
        self.end
    }

    /// Returns the inclusive number of frames covered by `self`.
    #[inline]
    pub fn length(&self) -> f32 {
        self.end - self.start + 1.0
    }

    /// Converts to the `(center, length)` representation.
    pub fn center_length(&self) -> CenterLength {
        CenterLength {
            center: (self.start + self.end) / 2.0,
            length: self.length(),
        }
    }

    /// Shifts both endpoints by `offset` frames.
    pub fn translate(&self, offset: f32) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    /// Computes the Intersection over Union of `self` and `other`.
    ///
    /// The intersection is measured in inclusive frame counts and clamped at
    /// zero, so disjoint intervals yield exactly 0.0 and identical intervals
    /// yield 1.0.
    pub fn iou(&self, other: &Self) -> f32 {
        let inter = (self.end.min(other.end) - self.start.max(other.start) + 1.0).max(0.0);
        let union = self.length() + other.length() - inter;
        inter / union
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// The `(center, length)` representation of an [`Interval`].
///
/// This is the coordinate system the offset coder operates in; it converts
/// back to [`Interval`] without loss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterLength {
    pub center: f32,
    pub length: f32,
}

impl CenterLength {
    /// Converts back to the `(start, end)` representation.
    ///
    /// Exact algebraic inverse of [`Interval::center_length`] up to float
    /// rounding.
    pub fn to_interval(self) -> Interval {
        Interval {
            start: self.center - (self.length - 1.0) / 2.0,
            end: self.center + (self.length - 1.0) / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn center_length_round_trip() {
        for (start, end) in [(0.0, 15.0), (3.0, 3.0), (2.5, 7.5), (7.0, 6.0)] {
            let interval = Interval::new(start, end);
            let back = interval.center_length().to_interval();
            assert_relative_eq!(back.start(), start);
            assert_relative_eq!(back.end(), end);
        }
    }

    #[test]
    fn length_is_inclusive() {
        assert_eq!(Interval::new(0.0, 0.0).length(), 1.0);
        assert_eq!(Interval::new(4.0, 7.0).length(), 4.0);
        // degenerate empty interval
        assert_eq!(Interval::new(5.0, 4.0).length(), 0.0);
    }

    #[test]
    fn iou_symmetric_and_bounded() {
        let a = Interval::new(0.0, 5.0);
        let b = Interval::new(3.0, 9.0);
        assert_eq!(a.iou(&b), b.iou(&a));
        assert!(a.iou(&b) > 0.0 && a.iou(&b) < 1.0);
        assert_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn iou_of_disjoint_intervals_is_zero() {
        let a = Interval::new(0.0, 3.0);
        let b = Interval::new(10.0, 12.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_of_identical_points_is_one() {
        let a = Interval::new(4.0, 4.0);
        assert_eq!(a.iou(&a), 1.0);
    }
}
