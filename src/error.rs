//! Error types for the comparison engine.
//!
//! A comparison has exactly one way to fail on valid pixel data: the two buffers
//! disagree on their dimensions. Everything else here guards the edges of the
//! crate (raw byte buffers, image files, configuration files, worker tasks).

use crate::config::ConfigError;

/// Errors surfaced by the comparison engine and its imaging boundary.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The two buffers handed to a comparison are not the same size.
    /// Raised before any pixel is read; no mask or cluster is produced.
    #[error("images must be the same size: {}x{} vs {}x{}", .left.0, .left.1, .right.0, .right.1)]
    DimensionMismatch {
        /// `(width, height)` of the first buffer.
        left: (u32, u32),
        /// `(width, height)` of the second buffer.
        right: (u32, u32),
    },
    /// A raw RGBA byte buffer does not hold exactly `width * height * 4` bytes.
    #[error("rgba buffer holds {actual} bytes, expected {expected}")]
    InvalidBufferLength { expected: usize, actual: usize },
    /// A pixel was built from a slice that is not 4 bytes long.
    #[error("cannot convert {0} bytes into a pixel")]
    InvalidPixelBytes(usize),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A blocking task driving part of the comparison panicked or was cancelled.
    #[error("comparison worker failed: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for DiffError {
    fn from(err: tokio::task::JoinError) -> Self {
        DiffError::Worker(err.to_string())
    }
}
