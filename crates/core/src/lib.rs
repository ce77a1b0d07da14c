//! Detector bank and recognition core behind the `objrec` C library.
//!
//! Organized per concern, each split into `domain` (traits and pure logic)
//! and `infrastructure` (concrete adapters):
//!
//! - [`detection`]: sliding-window HOG detectors, their model files and
//!   the immutable bank evaluated jointly per call.
//! - [`imaging`]: in-memory JPEG decoding.
//! - [`recognition`]: the use case tying a bank and a decoder together.

pub mod detection;
pub mod imaging;
pub mod recognition;
pub mod shared;

pub use recognition::object_recognizer::ObjectRecognizer;
pub use recognition::recognizer_config::RecognizerConfig;
pub use shared::error::{ErrorCode, RecognitionError};
pub use shared::rectangle::Rectangle;
