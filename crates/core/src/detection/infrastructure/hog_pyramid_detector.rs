//! Sliding-window HOG detector scanned over an image pyramid.
//!
//! Each pyramid level gets one [`HogFeatureMap`]; windows slide over its
//! cell grid and a linear classifier (`weights · descriptor - bias`)
//! decides whether they fire.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::GrayImage;
use imageproc::hog::{HogOptions, HogSpec};
use ndarray::{s, Array1, ArrayView1};

use crate::detection::domain::object_detector::{ObjectDetector, ScoredWindow};
use crate::detection::domain::overlap_tester::OverlapTester;
use crate::detection::infrastructure::detector_model::{DetectorModel, PyramidParams};
use crate::detection::infrastructure::hog_feature_map::HogFeatureMap;
use crate::shared::error::DetectionError;
use crate::shared::rectangle::Rectangle;

pub struct HogPyramidDetector {
    window_width: u32,
    window_height: u32,
    options: HogOptions,
    /// Window size in cells.
    window_cells: (usize, usize),
    /// Window size in blocks.
    window_blocks: (usize, usize),
    pyramid: PyramidParams,
    overlap: OverlapTester,
    weights: Array1<f32>,
    bias: f64,
}

impl HogPyramidDetector {
    /// Validates a parsed model and builds the detector from it.
    pub fn from_model(model: DetectorModel) -> Result<Self, DetectionError> {
        if model.window_width == 0 || model.window_height == 0 {
            return Err(DetectionError::InvalidModel(
                "detection window must be non-empty".into(),
            ));
        }
        model
            .hog
            .validate_for(model.window_width, model.window_height)?;
        let options = model.hog.to_options();
        let layout = HogSpec::from_options(model.window_width, model.window_height, options)
            .map_err(DetectionError::InvalidModel)?;
        if layout.descriptor_length() != model.weights.len() {
            return Err(DetectionError::InvalidModel(format!(
                "expected {} weights for a {}x{} window, found {}",
                layout.descriptor_length(),
                model.window_width,
                model.window_height,
                model.weights.len()
            )));
        }
        if model.weights.iter().any(|w| !w.is_finite()) || !model.bias.is_finite() {
            return Err(DetectionError::InvalidModel(
                "classifier contains non-finite values".into(),
            ));
        }
        if model.pyramid.downscale < 2 || model.pyramid.max_levels == 0 {
            return Err(DetectionError::InvalidModel(format!(
                "invalid pyramid (downscale {}, max_levels {})",
                model.pyramid.downscale, model.pyramid.max_levels
            )));
        }
        if !model.overlap.is_valid() {
            return Err(DetectionError::InvalidModel(
                "overlap thresholds must lie in [0, 1]".into(),
            ));
        }

        let cells_wide = model.window_width as usize / options.cell_side;
        let cells_high = model.window_height as usize / options.cell_side;
        Ok(Self {
            window_width: model.window_width,
            window_height: model.window_height,
            options,
            window_cells: (cells_wide, cells_high),
            window_blocks: (
                (cells_wide - options.block_side) / options.block_stride + 1,
                (cells_high - options.block_side) / options.block_stride + 1,
            ),
            pyramid: model.pyramid,
            overlap: model.overlap,
            weights: Array1::from(model.weights),
            bias: model.bias,
        })
    }

    /// Loads a model file, reporting layout problems against its path.
    pub fn load(path: &Path) -> Result<Self, DetectionError> {
        let model = DetectorModel::load(path)?;
        Self::from_model(model).map_err(|e| match e {
            DetectionError::InvalidModel(reason) => DetectionError::Format {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Classifier score of the window whose top-left cell is `(cell_x, cell_y)`.
    fn score(&self, features: &HogFeatureMap, cell_x: usize, cell_y: usize) -> f64 {
        let stride = self.options.block_stride;
        let block_len = features.block_len();
        let (blocks_wide, blocks_high) = self.window_blocks;
        let mut dot = 0f32;
        for by in 0..blocks_high {
            for bx in 0..blocks_wide {
                let start = (by * blocks_wide + bx) * block_len;
                let block = features.block(cell_x + bx * stride, cell_y + by * stride);
                dot += self
                    .weights
                    .slice(s![start..start + block_len])
                    .dot(&ArrayView1::from(block));
            }
        }
        dot as f64 - self.bias
    }

    fn scan_level(
        &self,
        level: &GrayImage,
        scale_x: f64,
        scale_y: f64,
        adjust_threshold: f64,
        out: &mut Vec<ScoredWindow>,
    ) {
        let features = HogFeatureMap::new(level, self.options);
        let (cells_wide, cells_high) = self.window_cells;
        if features.cells_wide() < cells_wide || features.cells_high() < cells_high {
            return;
        }
        let side = self.options.cell_side as u32;
        for cell_y in 0..=features.cells_high() - cells_high {
            for cell_x in 0..=features.cells_wide() - cells_wide {
                let score = self.score(&features, cell_x, cell_y);
                if score.is_finite() && score > adjust_threshold {
                    out.push(ScoredWindow {
                        rect: map_to_original(
                            cell_x as u32 * side,
                            cell_y as u32 * side,
                            self.window_width,
                            self.window_height,
                            scale_x,
                            scale_y,
                        ),
                        score,
                    });
                }
            }
        }
    }
}

impl ObjectDetector for HogPyramidDetector {
    fn scan(
        &self,
        image: &GrayImage,
        adjust_threshold: f64,
    ) -> Result<Vec<ScoredWindow>, DetectionError> {
        let mut windows = Vec::new();
        let levels = pyramid_levels(
            image.width(),
            image.height(),
            self.window_width,
            self.window_height,
            self.pyramid,
        );

        for (level_w, level_h) in levels {
            let scale_x = level_w as f64 / image.width() as f64;
            let scale_y = level_h as f64 / image.height() as f64;
            if level_w == image.width() && level_h == image.height() {
                self.scan_level(image, scale_x, scale_y, adjust_threshold, &mut windows);
            } else {
                let level = imageops::resize(image, level_w, level_h, FilterType::Triangle);
                self.scan_level(&level, scale_x, scale_y, adjust_threshold, &mut windows);
            }
        }
        Ok(windows)
    }

    fn overlap_tester(&self) -> OverlapTester {
        self.overlap
    }
}

/// Sizes of every pyramid level that can still hold one window, largest
/// first.
fn pyramid_levels(
    width: u32,
    height: u32,
    window_width: u32,
    window_height: u32,
    pyramid: PyramidParams,
) -> Vec<(u32, u32)> {
    let n = pyramid.downscale as u64;
    let mut levels = Vec::new();
    let (mut w, mut h) = (width as u64, height as u64);
    while levels.len() < pyramid.max_levels
        && w >= window_width as u64
        && h >= window_height as u64
    {
        levels.push((w as u32, h as u32));
        w = w * (n - 1) / n;
        h = h * (n - 1) / n;
    }
    levels
}

fn map_to_original(x: u32, y: u32, w: u32, h: u32, scale_x: f64, scale_y: f64) -> Rectangle {
    let left = (x as f64 / scale_x).round() as i64;
    let top = (y as f64 / scale_y).round() as i64;
    let right = ((x + w) as f64 / scale_x).round() as i64 - 1;
    let bottom = ((y + h) as f64 / scale_y).round() as i64 - 1;
    Rectangle::new(left, top, right, bottom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::infrastructure::detector_model::HogParams;
    use crate::detection::infrastructure::test_patterns::{scene_with_square, square_exemplar};
    use rstest::rstest;

    fn exemplar_detector() -> HogPyramidDetector {
        let model = DetectorModel::from_exemplar(&square_exemplar(), HogParams::default()).unwrap();
        HogPyramidDetector::from_model(model).unwrap()
    }

    // ── Pyramid ──────────────────────────────────────────────────────

    #[test]
    fn test_pyramid_starts_at_full_size() {
        let levels = pyramid_levels(96, 96, 32, 32, PyramidParams::default());
        assert_eq!(levels[0], (96, 96));
    }

    #[test]
    fn test_pyramid_shrinks_by_nine_tenths() {
        let levels = pyramid_levels(100, 50, 10, 10, PyramidParams::default());
        assert_eq!(levels[1], (90, 45));
        assert_eq!(levels[2], (81, 40));
    }

    #[test]
    fn test_pyramid_stops_below_window() {
        let levels = pyramid_levels(96, 96, 32, 32, PyramidParams::default());
        let last = *levels.last().unwrap();
        assert!(last.0 >= 32 && last.1 >= 32);
        assert!(last.0 * 9 / 10 < 32 || last.1 * 9 / 10 < 32);
    }

    #[test]
    fn test_pyramid_respects_max_levels() {
        let pyramid = PyramidParams {
            downscale: 10,
            max_levels: 2,
        };
        assert_eq!(pyramid_levels(500, 500, 32, 32, pyramid).len(), 2);
    }

    #[test]
    fn test_image_smaller_than_window_has_no_levels() {
        assert!(pyramid_levels(20, 100, 32, 32, PyramidParams::default()).is_empty());
    }

    // ── Coordinate mapping ───────────────────────────────────────────

    #[test]
    fn test_map_identity_scale() {
        assert_eq!(
            map_to_original(8, 16, 32, 32, 1.0, 1.0),
            Rectangle::new(8, 16, 39, 47)
        );
    }

    #[test]
    fn test_map_half_scale_doubles() {
        assert_eq!(
            map_to_original(10, 10, 32, 32, 0.5, 0.5),
            Rectangle::new(20, 20, 83, 83)
        );
    }

    // ── Model validation ─────────────────────────────────────────────

    #[test]
    fn test_rejects_weight_count_mismatch() {
        let mut model =
            DetectorModel::from_exemplar(&square_exemplar(), HogParams::default()).unwrap();
        model.weights.pop();
        assert!(matches!(
            HogPyramidDetector::from_model(model),
            Err(DetectionError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_rejects_window_not_divisible_by_cell() {
        let model = DetectorModel::new(30, 32, HogParams::default(), vec![0.0; 324], 0.0);
        assert!(HogPyramidDetector::from_model(model).is_err());
    }

    #[test]
    fn test_rejects_block_larger_than_window() {
        let hog = HogParams {
            block_side: 5,
            ..HogParams::default()
        };
        let model = DetectorModel::new(32, 32, hog, Vec::new(), 0.0);
        assert!(matches!(
            HogPyramidDetector::from_model(model),
            Err(DetectionError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_load_reports_oversized_block_as_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detector.svm");
        let hog = HogParams {
            block_side: 5,
            ..HogParams::default()
        };
        DetectorModel::new(32, 32, hog, Vec::new(), 0.0)
            .save(&path)
            .unwrap();

        let err = HogPyramidDetector::load(&path).err().unwrap();

        assert!(matches!(err, DetectionError::Format { .. }));
        assert!(err.is_model_error());
    }

    #[rstest]
    #[case::downscale_one(PyramidParams { downscale: 1, max_levels: 10 })]
    #[case::no_levels(PyramidParams { downscale: 10, max_levels: 0 })]
    fn test_rejects_bad_pyramid(#[case] pyramid: PyramidParams) {
        let model = DetectorModel::from_exemplar(&square_exemplar(), HogParams::default())
            .unwrap()
            .with_pyramid(pyramid);
        assert!(HogPyramidDetector::from_model(model).is_err());
    }

    #[test]
    fn test_rejects_non_finite_bias() {
        let mut model =
            DetectorModel::from_exemplar(&square_exemplar(), HogParams::default()).unwrap();
        model.bias = f64::NAN;
        assert!(HogPyramidDetector::from_model(model).is_err());
    }

    #[test]
    fn test_rejects_invalid_overlap() {
        let model = DetectorModel::from_exemplar(&square_exemplar(), HogParams::default())
            .unwrap()
            .with_overlap(OverlapTester::new(2.0, 1.0));
        assert!(HogPyramidDetector::from_model(model).is_err());
    }

    #[test]
    fn test_load_reports_layout_problem_against_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detector.svm");
        let mut model =
            DetectorModel::from_exemplar(&square_exemplar(), HogParams::default()).unwrap();
        model.weights.truncate(10);
        model.save(&path).unwrap();

        let err = HogPyramidDetector::load(&path).err().unwrap();

        assert!(matches!(err, DetectionError::Format { .. }));
        assert!(err.to_string().contains("detector.svm"));
    }

    // ── Scanning ─────────────────────────────────────────────────────

    #[test]
    fn test_exemplar_window_fires() {
        let detector = exemplar_detector();
        let scene = scene_with_square(96, 96, 40, 40);

        let windows = detector.scan(&scene, 0.0).unwrap();

        let target = Rectangle::from_origin_size(32, 32, 32, 32);
        assert!(windows.iter().any(|w| w.rect == target));
    }

    #[test]
    fn test_exemplar_window_scores_highest() {
        let detector = exemplar_detector();
        let scene = scene_with_square(96, 96, 40, 40);

        let windows = detector.scan(&scene, 0.0).unwrap();
        let best = windows
            .iter()
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap())
            .unwrap();

        assert_eq!(best.rect, Rectangle::from_origin_size(32, 32, 32, 32));
    }

    #[test]
    fn test_ragged_image_edges_are_scanned_up_to_last_whole_cell() {
        let detector = exemplar_detector();
        let scene = scene_with_square(101, 99, 72, 72);

        let windows = detector.scan(&scene, 0.0).unwrap();

        let target = Rectangle::from_origin_size(64, 64, 32, 32);
        assert!(windows.iter().any(|w| w.rect == target));
        assert!(windows.iter().all(|w| w.rect.right < 101 && w.rect.bottom < 99));
    }

    #[test]
    fn test_finds_exemplar_in_large_scene() {
        let detector = exemplar_detector();
        let scene = scene_with_square(640, 360, 304, 168);

        let windows = detector.scan(&scene, 0.0).unwrap();

        assert!(windows
            .iter()
            .any(|w| w.rect == Rectangle::from_origin_size(296, 160, 32, 32)));
    }

    #[test]
    fn test_flat_image_never_fires() {
        let detector = exemplar_detector();
        let flat = GrayImage::from_pixel(96, 96, image::Luma([128]));
        assert!(detector.scan(&flat, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_higher_threshold_yields_subset() {
        let detector = exemplar_detector();
        let scene = scene_with_square(96, 96, 40, 40);

        let loose = detector.scan(&scene, -1.0).unwrap();
        let strict = detector.scan(&scene, 0.0).unwrap();

        assert!(strict.len() <= loose.len());
        assert!(strict.iter().all(|w| w.score > 0.0));
    }

    #[test]
    fn test_image_smaller_than_window_yields_nothing() {
        let detector = exemplar_detector();
        let tiny = GrayImage::new(16, 16);
        assert!(detector.scan(&tiny, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_window_size() {
        assert_eq!(exemplar_detector().window_size(), (32, 32));
    }
}
