use image::RgbImage;

use crate::shared::error::ImageLoadError;

/// Turns a compressed in-memory buffer into an RGB pixel grid.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<RgbImage, ImageLoadError>;
}
