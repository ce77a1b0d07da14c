use std::path::{Path, PathBuf};

use crate::detection::domain::detector_bank::DetectorBank;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::detection::infrastructure::hog_pyramid_detector::HogPyramidDetector;
use crate::shared::constants::{DETECTOR_FILE_EXTENSION, DETECTOR_FILE_STEM};
use crate::shared::error::DetectionError;

/// File name of the detector at `index` within a model directory.
///
/// The first detector has no numeric suffix and there is no
/// `detector0.svm`: `detector.svm`, `detector1.svm`, `detector2.svm`, ...
pub fn detector_file_name(index: usize) -> String {
    if index == 0 {
        format!("{DETECTOR_FILE_STEM}.{DETECTOR_FILE_EXTENSION}")
    } else {
        format!("{DETECTOR_FILE_STEM}{index}.{DETECTOR_FILE_EXTENSION}")
    }
}

/// Paths of the first `count` detectors in `dir`, in load order.
pub fn detector_paths(dir: &Path, count: usize) -> Vec<PathBuf> {
    (0..count).map(|i| dir.join(detector_file_name(i))).collect()
}

/// Loads `count` detectors from `dir` into a bank.
///
/// All-or-nothing: the first file that is missing or malformed aborts the
/// load and nothing loaded so far is kept.
pub fn load_bank(dir: &Path, count: usize) -> Result<DetectorBank, DetectionError> {
    if count == 0 {
        return Err(DetectionError::EmptyBank);
    }

    let mut detectors: Vec<Box<dyn ObjectDetector>> = Vec::with_capacity(count);
    for path in detector_paths(dir, count) {
        let detector = HogPyramidDetector::load(&path)?;
        log::debug!(
            "Loaded detector {} ({}x{} window)",
            path.display(),
            detector.window_size().0,
            detector.window_size().1
        );
        detectors.push(Box::new(detector));
    }
    DetectorBank::new(detectors)
}
