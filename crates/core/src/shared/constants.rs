/// Base name shared by every serialized detector in a model directory.
pub const DETECTOR_FILE_STEM: &str = "detector";
pub const DETECTOR_FILE_EXTENSION: &str = "svm";

/// Integers exported per rectangle: left, top, right, bottom.
pub const RECT_LEN: usize = 4;

/// Format tag every detector model file must carry.
pub const MODEL_FORMAT: &str = "objrec-hog-detector";
pub const MODEL_VERSION: u32 = 1;
