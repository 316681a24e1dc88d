//! Error types shared by the whole crate.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, FsddError>;

#[derive(Debug, Error)]
pub enum FsddError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV decode error in {path}: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    /// `Version::Local` was requested without a directory.
    #[error("Expected path to be a directory containing WAV recordings")]
    MissingLocalPath,

    #[error("Recordings directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// Cloning the upstream repository or relocating its recordings failed.
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// File name does not follow `{digit}_{speaker}_{index}.wav`.
    #[error("Invalid recording file name {path}: {reason}")]
    InvalidFileName { path: PathBuf, reason: String },

    #[error("Invalid split proportion: {0}")]
    InvalidProportion(String),

    #[error("Silence threshold must lie in [0, 1], got {0}")]
    InvalidThreshold(f32),

    #[error("Invalid load options: {0}")]
    InvalidLoadOptions(String),

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Index {index} out of bounds for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}
