//! # icc-cmm
//!
//! A color management module: parses ICC v2/v4 profiles and composes them
//! into transform pipelines that apply device-to-device color conversions
//! through the profile connection space (PCS).
//!
//! ## Layout
//!
//! - [`icc`] parses profile bytes into a header, tag table, and typed tag
//!   data (curves, matrices, LUTs, multi-process elements, named colors).
//! - [`color`] carries the small CIE types (XYZ, Lab) the rest of the
//!   crate is built on.
//! - [`math`] holds the shared numerics: matrix inversion, 1-D/n-D
//!   interpolation, and parametric curve evaluation.
//! - [`pipeline`] is the transform-composition engine: kernels built from
//!   profile tags, the PCS mediator and PCS-adjust hook that sit at kernel
//!   boundaries, and the sealed [`pipeline::CmmPipeline`] that chains them.
//! - [`numeric`] holds the ICC fixed-point <-> float conversions every
//!   other module builds on.

#![forbid(unsafe_code)]

pub mod color;
pub mod error;
pub mod icc;
pub mod math;
pub mod numeric;
pub mod pipeline;
pub mod profile;
pub mod transform;

pub use error::{Error, Result};
pub use profile::ColorProfile;
pub use transform::Transform;
