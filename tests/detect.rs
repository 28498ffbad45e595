//! End-to-end pipeline test: encode ground truth offsets, run the detector
//! over a stitched two-window batch, then collapse duplicates with NMS.

use kiru::detection::anchors::Anchors;
use kiru::detection::coder;
use kiru::detection::nms::NonMaxSuppression;
use kiru::detection::{Detector, BACKGROUND_CLASS};
use kiru::interval::Interval;
use ndarray::Array3;

#[test]
fn detects_encoded_transitions() {
    let anchors = Anchors::for_sample_duration(16);
    let num_anchors = anchors.anchor_count();

    // Every anchor regresses towards the same ground truth transition [4, 7].
    let truth = Interval::new(4.0, 7.0);
    let offsets = coder::encode(&vec![truth; num_anchors], 16.0, Some(&anchors)).unwrap();
    let loc = Array3::from_shape_fn((2, num_anchors, 2), |(_, a, d)| offsets[a][d]);

    // Two confident anchors per item, the rest silent.
    let mut conf = Array3::zeros((2, num_anchors, 3));
    for item in 0..2 {
        conf[[item, 0, 1]] = 0.95;
        conf[[item, 1, 1]] = 0.8;
    }

    let detector = Detector::new(anchors, 3, 16);
    let detections = detector
        .detect(loc.view(), conf.view(), Some(&[0.0, 8.0]))
        .unwrap();

    // First window: the transition in its own coordinates.
    assert_eq!(detections.count(0, 1), 2);
    let first = detections.class_detections(0, 1).next().unwrap();
    assert_eq!(first.interval().start(), 4.0);
    assert_eq!(first.interval().end(), 7.0);
    assert_eq!(first.score(), 0.95);

    // Second window starts at frame 8 of the stitched video.
    let second = detections.class_detections(1, 1).next().unwrap();
    assert_eq!(second.interval().start(), 12.0);
    assert_eq!(second.interval().end(), 15.0);

    // Nothing scored the background class.
    assert_eq!(detections.count(0, BACKGROUND_CLASS), 0);

    // The two duplicates collapse to one under NMS.
    let (bars, scores): (Vec<_>, Vec<_>) = detections
        .class_detections(0, 1)
        .map(|det| (det.interval(), det.score()))
        .unzip();
    let nms = NonMaxSuppression::new();
    let (keep, count) = nms.process(&bars, &scores).unwrap();
    assert_eq!(count, 1);
    assert_eq!(keep[0], 0);
}
