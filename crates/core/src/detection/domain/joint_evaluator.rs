use image::GrayImage;

use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::error::DetectionError;
use crate::shared::rectangle::Rectangle;

/// A window kept after joint non-max suppression.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub rect: Rectangle,
    pub score: f64,
    /// Position of the producing detector within its bank.
    pub detector_index: usize,
}

/// Runs every detector over `image` and suppresses overlaps across all of
/// them at once.
///
/// Candidates are visited in descending score order; each one is kept
/// unless its own detector's overlap tester matches an already kept box.
/// The output is in that visiting order.
pub fn evaluate_detectors(
    detectors: &[Box<dyn ObjectDetector>],
    image: &GrayImage,
    adjust_threshold: f64,
) -> Result<Vec<Detection>, DetectionError> {
    let mut candidates = Vec::new();
    for (detector_index, detector) in detectors.iter().enumerate() {
        for window in detector.scan(image, adjust_threshold)? {
            candidates.push(Detection {
                rect: window.rect,
                score: window.score,
                detector_index,
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let testers: Vec<_> = detectors.iter().map(|d| d.overlap_tester()).collect();
    let mut kept: Vec<Detection> = Vec::with_capacity(candidates.len());
    let mut kept_rects: Vec<Rectangle> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if testers[candidate.detector_index].overlaps_any(&candidate.rect, &kept_rects) {
            continue;
        }
        kept_rects.push(candidate.rect);
        kept.push(candidate);
    }
    Ok(kept)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::detection::domain::object_detector::ScoredWindow;
    use crate::detection::domain::overlap_tester::OverlapTester;

    /// Detector stub replaying fixed windows regardless of the image.
    pub(crate) struct StubDetector {
        pub windows: Vec<ScoredWindow>,
        pub tester: OverlapTester,
    }

    impl StubDetector {
        pub(crate) fn boxed(windows: &[(i64, i64, i64, f64)]) -> Box<dyn ObjectDetector> {
            Box::new(Self {
                windows: windows
                    .iter()
                    .map(|&(x, y, side, score)| ScoredWindow {
                        rect: Rectangle::from_origin_size(x, y, side, side),
                        score,
                    })
                    .collect(),
                tester: OverlapTester::default(),
            })
        }
    }

    impl ObjectDetector for StubDetector {
        fn scan(
            &self,
            _image: &GrayImage,
            adjust_threshold: f64,
        ) -> Result<Vec<ScoredWindow>, DetectionError> {
            Ok(self
                .windows
                .iter()
                .filter(|w| w.score > adjust_threshold)
                .copied()
                .collect())
        }

        fn overlap_tester(&self) -> OverlapTester {
            self.tester
        }
    }

    struct FailingDetector;

    impl ObjectDetector for FailingDetector {
        fn scan(&self, _: &GrayImage, _: f64) -> Result<Vec<ScoredWindow>, DetectionError> {
            Err(DetectionError::Features("broken".into()))
        }

        fn overlap_tester(&self) -> OverlapTester {
            OverlapTester::default()
        }
    }

    fn blank() -> GrayImage {
        GrayImage::new(64, 64)
    }

    #[test]
    fn test_no_detectors_yields_nothing() {
        let result = evaluate_detectors(&[], &blank(), 0.0).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_keeps_highest_scoring_of_overlapping_pair() {
        let detectors = vec![StubDetector::boxed(&[(0, 0, 32, 0.4), (1, 1, 32, 0.9)])];
        let result = evaluate_detectors(&detectors, &blank(), 0.0).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].rect, Rectangle::from_origin_size(1, 1, 32, 32));
        assert_eq!(result[0].score, 0.9);
    }

    #[test]
    fn test_suppresses_across_detectors() {
        let detectors = vec![
            StubDetector::boxed(&[(0, 0, 32, 0.4)]),
            StubDetector::boxed(&[(2, 2, 32, 0.8)]),
        ];
        let result = evaluate_detectors(&detectors, &blank(), 0.0).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].detector_index, 1);
    }

    #[test]
    fn test_unions_disjoint_detections_in_score_order() {
        let detectors = vec![
            StubDetector::boxed(&[(0, 0, 16, 0.2)]),
            StubDetector::boxed(&[(40, 40, 16, 0.7)]),
        ];
        let result = evaluate_detectors(&detectors, &blank(), 0.0).unwrap();
        let indices: Vec<_> = result.iter().map(|d| d.detector_index).collect();
        assert_eq!(indices, vec![1, 0]);
    }

    #[test]
    fn test_threshold_is_forwarded_to_detectors() {
        let detectors = vec![StubDetector::boxed(&[(0, 0, 16, 0.2), (40, 40, 16, 0.7)])];
        let result = evaluate_detectors(&detectors, &blank(), 0.5).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].score, 0.7);
    }

    #[test]
    fn test_detector_failure_propagates() {
        let detectors: Vec<Box<dyn ObjectDetector>> =
            vec![StubDetector::boxed(&[(0, 0, 16, 0.2)]), Box::new(FailingDetector)];
        assert!(evaluate_detectors(&detectors, &blank(), 0.0).is_err());
    }
}
