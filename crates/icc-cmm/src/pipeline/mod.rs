//! Transform-composition engine: kernels, PCS mediation, PCS-adjust, and
//! the CMM pipeline that chains them.
//!
//! # Pipeline architecture
//!
//! A sealed [`cmm::CmmPipeline`] is a chain of [`kernel::TransformKernel`]s,
//! one per appended profile. Each kernel converts between its profile's
//! device space and the profile connection space; [`mediator::PcsMediator`]
//! reconciles the PCS encoding differences at each kernel boundary
//! (V2/V4 Lab rescale, Lab<->XYZ), and [`pcs_adjust`] applies the
//! intent-dependent PCS corrections (absolute-colorimetric scale, BPC).
//!
//! All mutable per-call state - the mediator's running conversion state,
//! scratch buffers, and the optional MRU cache - lives in an
//! [`context::ApplyContext`] obtained from a sealed pipeline, so the
//! pipeline itself stays `Sync` and shareable across threads.

pub mod clut;
pub mod cmm;
pub mod context;
pub mod curve;
pub mod error;
pub mod kernel;
pub mod matrix_eval;
pub mod mediator;
pub mod mpe;
pub mod mru;
pub mod pcs_adjust;

pub use clut::Clut;
pub use cmm::CmmPipeline;
pub use context::{ApplyContext, ApplyOptions};
pub use curve::{Curve, InverseCurve};
pub use error::{CmmError, CmmResult};
pub use kernel::{Direction, TransformKernel};
pub use matrix_eval::MatrixEval;
pub use mediator::{PcsDeclaration, PcsMediator};
pub use mpe::MpePipeline;
pub use mru::MruCache;
