//! ICC parametric curve evaluation (types 0-4, ICC.1:2022 Section 10.18).
//!
//! [`crate::pipeline::curve::Curve`] wraps [`ParametricCurve`] for the
//! non-table TRC/A-curve/B-curve case; this module owns only the curve's
//! shape and its forward/inverse evaluation, with no notion of where in a
//! kernel's stage chain it sits.

/// ICC parametric curve function type, as defined in ICC.1:2022 Section 10.18.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParametricCurveType {
    /// Type 0: Y = X^g
    Gamma,
    /// Type 1: Y = (aX + b)^g  if X >= -b/a, else 0
    CIE122,
    /// Type 2: Y = (aX + b)^g + c  if X >= -b/a, else c
    IEC61966_3,
    /// Type 3: Y = (aX + b)^g  if X >= d, else cX (sRGB-like)
    IEC61966_2_1,
    /// Type 4: Y = (aX + b)^g + e  if X >= d, else cX + f
    Full,
}

impl ParametricCurveType {
    pub fn from_icc(function_type: u16) -> Option<Self> {
        match function_type {
            0 => Some(Self::Gamma),
            1 => Some(Self::CIE122),
            2 => Some(Self::IEC61966_3),
            3 => Some(Self::IEC61966_2_1),
            4 => Some(Self::Full),
            _ => None,
        }
    }

    pub fn param_count(&self) -> usize {
        match self {
            Self::Gamma => 1,
            Self::CIE122 => 3,
            Self::IEC61966_3 => 4,
            Self::IEC61966_2_1 => 5,
            Self::Full => 7,
        }
    }
}

/// Parameters for one of the five ICC parametric curve shapes, stored as
/// defined in the spec regardless of which subset `curve_type` actually uses.
#[derive(Debug, Clone, Copy)]
pub struct ParametricCurve {
    pub curve_type: ParametricCurveType,
    pub g: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl ParametricCurve {
    /// The sRGB transfer function (type 3), used by profiles that encode
    /// their TRC as parameters rather than a sampled table.
    pub fn srgb() -> Self {
        Self {
            curve_type: ParametricCurveType::IEC61966_2_1,
            g: 2.4,
            a: 1.0 / 1.055,
            b: 0.055 / 1.055,
            c: 1.0 / 12.92,
            d: 0.04045,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn from_params(curve_type: ParametricCurveType, params: &[f64]) -> Option<Self> {
        if params.len() < curve_type.param_count() {
            return None;
        }

        let mut curve = Self {
            curve_type,
            g: params.first().copied().unwrap_or(1.0),
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 0.0,
            f: 0.0,
        };

        match curve_type {
            ParametricCurveType::Gamma => {}
            ParametricCurveType::CIE122 => {
                curve.a = params[1];
                curve.b = params[2];
            }
            ParametricCurveType::IEC61966_3 => {
                curve.a = params[1];
                curve.b = params[2];
                curve.c = params[3];
            }
            ParametricCurveType::IEC61966_2_1 => {
                curve.a = params[1];
                curve.b = params[2];
                curve.c = params[3];
                curve.d = params[4];
            }
            ParametricCurveType::Full => {
                curve.a = params[1];
                curve.b = params[2];
                curve.c = params[3];
                curve.d = params[4];
                curve.e = params[5];
                curve.f = params[6];
            }
        }

        Some(curve)
    }
}

/// Forward direction (encoded -> linear).
#[inline]
pub fn parametric_curve_eval(curve: &ParametricCurve, x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);

    match curve.curve_type {
        ParametricCurveType::Gamma => x.powf(curve.g),
        ParametricCurveType::CIE122 => {
            let threshold = if curve.a.abs() > 1e-10 { -curve.b / curve.a } else { 0.0 };
            if x >= threshold {
                (curve.a * x + curve.b).max(0.0).powf(curve.g)
            } else {
                0.0
            }
        }
        ParametricCurveType::IEC61966_3 => {
            let threshold = if curve.a.abs() > 1e-10 { -curve.b / curve.a } else { 0.0 };
            if x >= threshold {
                (curve.a * x + curve.b).max(0.0).powf(curve.g) + curve.c
            } else {
                curve.c
            }
        }
        ParametricCurveType::IEC61966_2_1 => {
            if x >= curve.d {
                (curve.a * x + curve.b).max(0.0).powf(curve.g)
            } else {
                curve.c * x
            }
        }
        ParametricCurveType::Full => {
            if x >= curve.d {
                (curve.a * x + curve.b).max(0.0).powf(curve.g) + curve.e
            } else {
                curve.c * x + curve.f
            }
        }
    }
}

/// Reverse direction (linear -> encoded). Types with no closed-form inverse
/// fall back to Newton-Raphson against the forward evaluator.
#[inline]
pub fn parametric_curve_eval_inverse(curve: &ParametricCurve, y: f64) -> f64 {
    let y = y.clamp(0.0, 1.0);

    match curve.curve_type {
        ParametricCurveType::Gamma => {
            if curve.g.abs() > 1e-10 {
                y.powf(1.0 / curve.g)
            } else {
                y
            }
        }
        ParametricCurveType::IEC61966_2_1 => {
            let linear_threshold = curve.c * curve.d;
            if y < linear_threshold {
                if curve.c.abs() > 1e-10 {
                    y / curve.c
                } else {
                    0.0
                }
            } else if curve.a.abs() > 1e-10 && curve.g.abs() > 1e-10 {
                (y.powf(1.0 / curve.g) - curve.b) / curve.a
            } else {
                y
            }
        }
        _ => {
            let mut x = if curve.g.abs() > 1e-10 { y.powf(1.0 / curve.g) } else { y };

            for _ in 0..8 {
                let fx = parametric_curve_eval(curve, x) - y;
                if fx.abs() < 1e-12 {
                    break;
                }
                let h = 1e-8;
                let dfx = (parametric_curve_eval(curve, x + h) - parametric_curve_eval(curve, x - h)) / (2.0 * h);
                if dfx.abs() > 1e-10 {
                    x -= fx / dfx;
                    x = x.clamp(0.0, 1.0);
                }
            }
            x
        }
    }
}
