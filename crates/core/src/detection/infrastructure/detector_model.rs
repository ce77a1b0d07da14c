use std::fs;
use std::path::Path;

use image::GrayImage;
use imageproc::hog::HogOptions;
use serde::{Deserialize, Serialize};

use crate::detection::domain::overlap_tester::OverlapTester;
use crate::shared::constants::{MODEL_FORMAT, MODEL_VERSION};
use crate::shared::error::DetectionError;

pub const DEFAULT_PYRAMID_DOWNSCALE: u32 = 10;
pub const DEFAULT_MAX_PYRAMID_LEVELS: usize = 1000;

/// HOG layout of a detection window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HogParams {
    pub orientations: usize,
    pub signed: bool,
    pub cell_side: usize,
    pub block_side: usize,
    pub block_stride: usize,
}

impl Default for HogParams {
    fn default() -> Self {
        Self {
            orientations: 9,
            signed: false,
            cell_side: 8,
            block_side: 2,
            block_stride: 1,
        }
    }
}

impl HogParams {
    /// Rejects zero-sized layouts before they reach the HOG extractor.
    pub fn validate(&self) -> Result<(), DetectionError> {
        if self.orientations == 0
            || self.cell_side == 0
            || self.block_side == 0
            || self.block_stride == 0
        {
            return Err(DetectionError::InvalidModel(format!(
                "HOG parameters must be positive: {self:?}"
            )));
        }
        Ok(())
    }

    /// Checks that a `width` x `height` window splits into whole cells and
    /// holds at least one block in each direction.
    pub fn validate_for(&self, width: u32, height: u32) -> Result<(), DetectionError> {
        self.validate()?;
        let (width, height) = (width as usize, height as usize);
        if width % self.cell_side != 0 || height % self.cell_side != 0 {
            return Err(DetectionError::InvalidModel(format!(
                "cell side {} does not divide the {width}x{height} window",
                self.cell_side
            )));
        }
        let (cells_wide, cells_high) = (width / self.cell_side, height / self.cell_side);
        if self.block_side > cells_wide || self.block_side > cells_high {
            return Err(DetectionError::InvalidModel(format!(
                "block side {} exceeds the {cells_wide}x{cells_high} cell grid",
                self.block_side
            )));
        }
        Ok(())
    }

    pub fn to_options(self) -> HogOptions {
        HogOptions::new(
            self.orientations,
            self.signed,
            self.cell_side,
            self.block_side,
            self.block_stride,
        )
    }
}

/// Image pyramid used while scanning.
///
/// Each level is `(downscale - 1) / downscale` the size of the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidParams {
    pub downscale: u32,
    pub max_levels: usize,
}

impl Default for PyramidParams {
    fn default() -> Self {
        Self {
            downscale: DEFAULT_PYRAMID_DOWNSCALE,
            max_levels: DEFAULT_MAX_PYRAMID_LEVELS,
        }
    }
}

/// On-disk form of one trained detector (`detector*.svm`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectorModel {
    pub format: String,
    pub version: u32,
    pub window_width: u32,
    pub window_height: u32,
    pub hog: HogParams,
    #[serde(default)]
    pub pyramid: PyramidParams,
    #[serde(default)]
    pub overlap: OverlapTester,
    pub weights: Vec<f32>,
    pub bias: f64,
}

impl DetectorModel {
    pub fn new(
        window_width: u32,
        window_height: u32,
        hog: HogParams,
        weights: Vec<f32>,
        bias: f64,
    ) -> Self {
        Self {
            format: MODEL_FORMAT.to_string(),
            version: MODEL_VERSION,
            window_width,
            window_height,
            hog,
            pyramid: PyramidParams::default(),
            overlap: OverlapTester::default(),
            weights,
            bias,
        }
    }

    /// Builds a single-exemplar detector: the weights are the exemplar's
    /// own descriptor and the bias sits halfway to its self-score, so the
    /// exemplar window scores `|d|² / 2`.
    pub fn from_exemplar(exemplar: &GrayImage, hog: HogParams) -> Result<Self, DetectionError> {
        hog.validate_for(exemplar.width(), exemplar.height())?;
        let descriptor = imageproc::hog::hog(exemplar, hog.to_options())
            .map_err(DetectionError::Features)?;
        let energy: f64 = descriptor.iter().map(|&v| (v as f64) * (v as f64)).sum();
        if energy == 0.0 {
            return Err(DetectionError::InvalidModel(
                "exemplar has no gradient energy".into(),
            ));
        }
        Ok(Self::new(
            exemplar.width(),
            exemplar.height(),
            hog,
            descriptor,
            energy / 2.0,
        ))
    }

    pub fn with_pyramid(mut self, pyramid: PyramidParams) -> Self {
        self.pyramid = pyramid;
        self
    }

    pub fn with_overlap(mut self, overlap: OverlapTester) -> Self {
        self.overlap = overlap;
        self
    }

    /// Reads and parses a model file, checking its format tag and version.
    pub fn load(path: &Path) -> Result<Self, DetectionError> {
        let bytes = fs::read(path).map_err(|source| DetectionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let model: Self = serde_json::from_slice(&bytes).map_err(|source| DetectionError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if model.format != MODEL_FORMAT {
            return Err(DetectionError::Format {
                path: path.to_path_buf(),
                reason: format!(
                    "unexpected model format \"{}\" (expected \"{MODEL_FORMAT}\")",
                    model.format
                ),
            });
        }
        if model.version != MODEL_VERSION {
            return Err(DetectionError::Format {
                path: path.to_path_buf(),
                reason: format!(
                    "unsupported model version {} (expected {MODEL_VERSION})",
                    model.version
                ),
            });
        }
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<(), DetectionError> {
        let json = serde_json::to_vec_pretty(self).map_err(DetectionError::Encode)?;
        fs::write(path, json).map_err(|source| DetectionError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
