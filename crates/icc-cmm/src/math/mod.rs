//! Foundational math shared by the transform kernels:
//! - 3x3 matrix operations for the Matrix evaluator
//! - ICC parametric curve evaluation
//! - N-dimensional CLUT interpolation

pub mod gamma;
pub mod interpolation;
pub mod matrix;

pub use gamma::{ParametricCurve, ParametricCurveType, parametric_curve_eval, parametric_curve_eval_inverse};
pub use interpolation::{lerp, nlinear_interp, tetrahedral_interp, trilinear_interp};
pub use matrix::Matrix3x3;
