use std::path::PathBuf;

use thiserror::Error;

/// Stable integer codes exported across the C boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    None = 0,
    Serialization = 1,
    ImageLoad = 2,
    Unknown = 3,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Failures of the detection engine and its model files.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("unable to open {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to deserialize {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to serialize detector model: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("{path}: {reason}")]
    Format { path: PathBuf, reason: String },
    #[error("invalid detector model: {0}")]
    InvalidModel(String),
    #[error("detector bank requires at least one detector")]
    EmptyBank,
    #[error("HOG feature extraction failed: {0}")]
    Features(String),
}

impl DetectionError {
    /// True for failures caused by a missing, unreadable or malformed model.
    pub fn is_model_error(&self) -> bool {
        matches!(
            self,
            Self::Read { .. }
                | Self::Parse { .. }
                | Self::Format { .. }
                | Self::InvalidModel(_)
                | Self::EmptyBank
        )
    }
}

/// Failures decoding an in-memory image.
#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("image buffer is empty")]
    Empty,
    #[error("image buffer is not a JPEG")]
    NotJpeg,
    #[error("unable to decode JPEG: {0}")]
    Decode(#[from] image::ImageError),
}

/// Boundary-facing outcome of an init or recognize call.
///
/// Each variant carries the human-readable message handed to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    #[error("{0}")]
    Serialization(String),
    #[error("{0}")]
    ImageLoad(String),
    #[error("{0}")]
    Unknown(String),
}

impl RecognitionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Serialization(_) => ErrorCode::Serialization,
            Self::ImageLoad(_) => ErrorCode::ImageLoad,
            Self::Unknown(_) => ErrorCode::Unknown,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Serialization(m) | Self::ImageLoad(m) | Self::Unknown(m) => m,
        }
    }
}

impl From<DetectionError> for RecognitionError {
    fn from(err: DetectionError) -> Self {
        if err.is_model_error() {
            Self::Serialization(err.to_string())
        } else {
            Self::Unknown(err.to_string())
        }
    }
}

impl From<ImageLoadError> for RecognitionError {
    fn from(err: ImageLoadError) -> Self {
        Self::ImageLoad(err.to_string())
    }
}
