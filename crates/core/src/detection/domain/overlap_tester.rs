use serde::{Deserialize, Serialize};

use crate::shared::rectangle::Rectangle;

pub const DEFAULT_IOU_THRESH: f64 = 0.5;
pub const DEFAULT_PERCENT_COVERED_THRESH: f64 = 1.0;

/// Box overlap test used for non-max suppression.
///
/// Two boxes overlap when their intersection exceeds `iou_thresh` of the
/// smallest box enclosing both, or covers more than
/// `percent_covered_thresh` of either box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapTester {
    pub iou_thresh: f64,
    pub percent_covered_thresh: f64,
}

impl Default for OverlapTester {
    fn default() -> Self {
        Self {
            iou_thresh: DEFAULT_IOU_THRESH,
            percent_covered_thresh: DEFAULT_PERCENT_COVERED_THRESH,
        }
    }
}

impl OverlapTester {
    pub fn new(iou_thresh: f64, percent_covered_thresh: f64) -> Self {
        Self {
            iou_thresh,
            percent_covered_thresh,
        }
    }

    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.iou_thresh) && (0.0..=1.0).contains(&self.percent_covered_thresh)
    }

    pub fn overlaps(&self, a: &Rectangle, b: &Rectangle) -> bool {
        let inner = a.intersect(b).area() as f64;
        if inner == 0.0 {
            return false;
        }
        let outer = enclosing(a, b).area() as f64;
        inner / outer > self.iou_thresh
            || inner / a.area() as f64 > self.percent_covered_thresh
            || inner / b.area() as f64 > self.percent_covered_thresh
    }

    pub fn overlaps_any(&self, rect: &Rectangle, kept: &[Rectangle]) -> bool {
        kept.iter().any(|k| self.overlaps(rect, k))
    }
}

fn enclosing(a: &Rectangle, b: &Rectangle) -> Rectangle {
    Rectangle::new(
        a.left.min(b.left),
        a.top.min(b.top),
        a.right.max(b.right),
        a.bottom.max(b.bottom),
    )
}
