use std::path::{Path, PathBuf};

/// Score offset applied on top of every detector's own bias.
pub const DEFAULT_ADJUST_THRESHOLD: f64 = 0.0;

/// Everything needed to open a recognizer.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognizerConfig {
    pub model_dir: PathBuf,
    /// Number of `detector*.svm` files to load.
    pub model_count: usize,
    /// Windows must score strictly above this to be reported.
    pub adjust_threshold: f64,
}

impl RecognizerConfig {
    pub fn new(model_dir: impl AsRef<Path>, model_count: usize) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
            model_count,
            adjust_threshold: DEFAULT_ADJUST_THRESHOLD,
        }
    }

    pub fn with_adjust_threshold(mut self, adjust_threshold: f64) -> Self {
        self.adjust_threshold = adjust_threshold;
        self
    }
}
