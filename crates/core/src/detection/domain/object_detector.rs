use image::GrayImage;

use crate::detection::domain::overlap_tester::OverlapTester;
use crate::shared::error::DetectionError;
use crate::shared::rectangle::Rectangle;

/// A candidate window that scored above the caller's threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredWindow {
    pub rect: Rectangle,
    pub score: f64,
}

/// Domain interface for a pretrained sliding-window detector.
///
/// Detectors are immutable once built, so scanning takes `&self` and
/// implementations must be shareable across threads.
pub trait ObjectDetector: Send + Sync {
    /// Scores every window of `image` and returns those whose score
    /// exceeds `adjust_threshold`, without any suppression applied.
    fn scan(
        &self,
        image: &GrayImage,
        adjust_threshold: f64,
    ) -> Result<Vec<ScoredWindow>, DetectionError>;

    /// Decides when two of this detector's windows cover the same object.
    fn overlap_tester(&self) -> OverlapTester;
}
