use std::sync::{Mutex, MutexGuard};

use image::RgbImage;

use crate::detection::domain::joint_evaluator::evaluate_detectors;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::error::DetectionError;
use crate::shared::rectangle::Rectangle;

/// The ordered, immutable set of detectors applied jointly per recognition.
///
/// Recognition is a serialization point: every call holds the bank's lock
/// for the whole evaluation, so concurrent callers run one at a time.
pub struct DetectorBank {
    detectors: Mutex<Vec<Box<dyn ObjectDetector>>>,
    len: usize,
}

impl DetectorBank {
    pub fn new(detectors: Vec<Box<dyn ObjectDetector>>) -> Result<Self, DetectionError> {
        if detectors.is_empty() {
            return Err(DetectionError::EmptyBank);
        }
        let len = detectors.len();
        Ok(Self {
            detectors: Mutex::new(detectors),
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Evaluates every detector against `image` and returns the union of
    /// their boxes sorted by `(left, top, right, bottom)`.
    pub fn recognize(
        &self,
        image: &RgbImage,
        adjust_threshold: f64,
    ) -> Result<Vec<Rectangle>, DetectionError> {
        let gray = image::imageops::grayscale(image);

        let detectors = self.lock();
        let detections = evaluate_detectors(&detectors, &gray, adjust_threshold)?;
        drop(detectors);

        let mut rects: Vec<Rectangle> = detections.into_iter().map(|d| d.rect).collect();
        rects.sort();
        Ok(rects)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Box<dyn ObjectDetector>>> {
        // The detectors are never mutated, so a panic in another caller
        // cannot leave them half-updated.
        self.detectors.lock().unwrap_or_else(|poisoned| {
            log::warn!("Detector bank lock was poisoned by a panicking recognition; recovering");
            poisoned.into_inner()
        })
    }
}
