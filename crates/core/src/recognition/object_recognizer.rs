use image::RgbImage;

use crate::detection::domain::detector_bank::DetectorBank;
use crate::detection::infrastructure::model_directory;
use crate::imaging::domain::image_decoder::ImageDecoder;
use crate::imaging::infrastructure::jpeg_memory_decoder::JpegMemoryDecoder;
use crate::recognition::recognizer_config::RecognizerConfig;
use crate::shared::error::RecognitionError;
use crate::shared::rectangle::Rectangle;

/// Recognition use case: decode → lock bank → evaluate → sort.
///
/// Every failure leaves as a [`RecognitionError`] so the boundary only has
/// to translate codes, never inspect engine errors.
pub struct ObjectRecognizer {
    bank: DetectorBank,
    decoder: Box<dyn ImageDecoder>,
    adjust_threshold: f64,
}

impl ObjectRecognizer {
    pub fn new(bank: DetectorBank, decoder: Box<dyn ImageDecoder>, adjust_threshold: f64) -> Self {
        Self {
            bank,
            decoder,
            adjust_threshold,
        }
    }

    /// Loads the configured model directory with the JPEG decoder.
    pub fn open(config: &RecognizerConfig) -> Result<Self, RecognitionError> {
        let bank = model_directory::load_bank(&config.model_dir, config.model_count)?;
        log::info!(
            "Loaded {} detector(s) from {}",
            bank.len(),
            config.model_dir.display()
        );
        Ok(Self::new(
            bank,
            Box::new(JpegMemoryDecoder::new()),
            config.adjust_threshold,
        ))
    }

    pub fn detector_count(&self) -> usize {
        self.bank.len()
    }

    /// Runs the bank on an already decoded image.
    pub fn recognize(&self, image: &RgbImage) -> Result<Vec<Rectangle>, RecognitionError> {
        let rects = self.bank.recognize(image, self.adjust_threshold)?;
        log::debug!(
            "Recognized {} object(s) in {}x{} image",
            rects.len(),
            image.width(),
            image.height()
        );
        Ok(rects)
    }

    /// Decodes `data` and runs the bank on it.
    ///
    /// A decode failure returns before the bank is locked.
    pub fn recognize_bytes(&self, data: &[u8]) -> Result<Vec<Rectangle>, RecognitionError> {
        let image = self.decoder.decode(data)?;
        self.recognize(&image)
    }
}
