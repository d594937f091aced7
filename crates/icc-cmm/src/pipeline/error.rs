//! The closed error enum surfaced by transform construction and application.
//!
//! Unlike [`crate::icc::IccError`] (malformed bytes) or the crate-level
//! [`crate::Error`] (the public wrapper), this enum has no `#[non_exhaustive]`
//! escape hatch: every kind a kernel, pipeline, or apply context can fail with
//! is enumerated here, matching the fixed vocabulary a CMM's callers expect
//! to exhaustively match on.

use thiserror::Error;

pub type CmmResult<T> = std::result::Result<T, CmmError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CmmError {
    /// Pipeline used before `begin()` sealed it
    #[error("transform not sealed: call begin() before apply")]
    BadXform,
    /// Adjacent kernels/elements don't share a compatible color space
    #[error("incompatible color space link: {0}")]
    BadSpaceLink(String),
    /// Unsupported or malformed LUT tag type
    #[error("unsupported LUT type: {0}")]
    BadLutType(String),
    /// Profile is structurally invalid for the requested operation
    #[error("invalid profile: {0}")]
    InvalidProfile(String),
    /// LUT dimensions are inconsistent (grid/channel mismatch)
    #[error("invalid LUT: {0}")]
    InvalidLut(String),
    /// A tag required to build this kernel variant is absent
    #[error("profile missing required tag: {0}")]
    ProfileMissingTag(String),
    /// Named-color lookup failed
    #[error("color not found: {0}")]
    ColorNotFound(String),
    /// Scratch buffer allocation failed (size mismatch, zero channels, etc)
    #[error("allocation error: {0}")]
    AllocErr(String),
    /// Apply called with a direction/interface incompatible with the kernel
    #[error("incorrect apply: {0}")]
    IncorrectApply(String),
    /// Pixel value doesn't fit the declared encoding
    #[error("bad color encoding: {0}")]
    BadColorEncoding(String),
    /// Profile bytes could not be opened/parsed at all
    #[error("cannot open profile: {0}")]
    CantOpenProfile(String),
}

impl From<crate::icc::IccError> for CmmError {
    fn from(e: crate::icc::IccError) -> Self {
        CmmError::InvalidProfile(e.to_string())
    }
}
