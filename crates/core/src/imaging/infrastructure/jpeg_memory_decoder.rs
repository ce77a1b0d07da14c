use image::{ImageFormat, RgbImage};

use crate::imaging::domain::image_decoder::ImageDecoder;
use crate::shared::error::ImageLoadError;

/// Decodes JPEG buffers only; any other container is rejected up front.
#[derive(Clone, Copy, Debug, Default)]
pub struct JpegMemoryDecoder;

impl JpegMemoryDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for JpegMemoryDecoder {
    fn decode(&self, data: &[u8]) -> Result<RgbImage, ImageLoadError> {
        if data.is_empty() {
            return Err(ImageLoadError::Empty);
        }
        if !matches!(image::guess_format(data), Ok(ImageFormat::Jpeg)) {
            return Err(ImageLoadError::NotJpeg);
        }
        let decoded = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
        Ok(decoded.to_rgb8())
    }
}
