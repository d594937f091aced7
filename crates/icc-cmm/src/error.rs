//! Top-level error type for the crate's public API.

use thiserror::Error;

/// Result type for icc-cmm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in icc-cmm operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to parse ICC profile bytes
    #[error("profile parse error: {0}")]
    ProfileParse(#[from] crate::icc::IccError),

    /// Transform construction or application failed
    #[error("transform error: {0}")]
    Transform(#[from] crate::pipeline::CmmError),

    /// Unsupported profile version
    #[error("unsupported profile version: {0}")]
    UnsupportedVersion(String),

    /// Unsupported color space
    #[error("unsupported color space: {0}")]
    UnsupportedColorSpace(String),

    /// Buffer size mismatch
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
