//! Curve evaluator (§4.1): a single per-channel lookup used by every
//! transform kernel that shapes channels before/after a matrix or CLUT.
//!
//! Wraps both tag representations a profile can carry for a TRC -
//! the plain `curv`/`para` types ([`CurveData`]) used by MatrixTRC and
//! Monochrome kernels, and the richer [`CurveSegment`] used inside mAB/mBA
//! LUTs - behind one evaluator so kernels don't need to know which one a
//! given profile happened to store.

use crate::icc::tags::CurveSegment;
use crate::icc::CurveData;
use crate::math::gamma::{parametric_curve_eval, parametric_curve_eval_inverse, ParametricCurve, ParametricCurveType};
use crate::math::interpolation::lut1d_interp;

/// A single evaluatable TRC, plus a build-once inverse table for curve
/// shapes that have no closed-form inverse.
#[derive(Debug, Clone)]
pub enum Curve {
    Identity,
    Gamma(f64),
    Table(Vec<f64>),
    Parametric(ParametricCurve),
}

const INVERSE_LUT_SIZE: usize = 4096;

impl Curve {
    pub fn from_curve_data(curve: &CurveData) -> Self {
        match curve {
            CurveData::Identity => Curve::Identity,
            CurveData::Gamma(g) => Curve::Gamma(*g),
            CurveData::Table(table) => {
                Curve::Table(table.iter().map(|&v| v as f64 / 65535.0).collect())
            }
        }
    }

    pub fn from_segment(segment: &CurveSegment) -> Self {
        match segment {
            CurveSegment::Identity => Curve::Identity,
            CurveSegment::Table(values) => Curve::Table(values.clone()),
            CurveSegment::Parametric { curve_type, params } => {
                match ParametricCurveType::from_icc(*curve_type)
                    .and_then(|ct| ParametricCurve::from_params(ct, params))
                {
                    Some(curve) => Curve::Parametric(curve),
                    None => Curve::Identity,
                }
            }
        }
    }

    pub fn from_segments(segments: &[CurveSegment]) -> Vec<Curve> {
        segments.iter().map(Curve::from_segment).collect()
    }

    /// True when applying this curve is a no-op, letting the caller elide
    /// a kernel stage entirely rather than run an identity multiply.
    pub fn is_identity(&self) -> bool {
        match self {
            Curve::Identity => true,
            Curve::Gamma(g) => (*g - 1.0).abs() < 1e-9,
            Curve::Table(t) => is_linear_ramp(t),
            Curve::Parametric(_) => false,
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        match self {
            Curve::Identity => x,
            Curve::Gamma(g) => x.powf(*g),
            Curve::Table(t) => lut1d_interp(t, x),
            Curve::Parametric(c) => parametric_curve_eval(c, x),
        }
    }

    /// Closed-form inverse where one exists, else a build-once sampled
    /// inverse table evaluated via Newton-Raphson at construction time.
    pub fn inverse(&self) -> InverseCurve {
        match self {
            Curve::Identity => InverseCurve::Analytic(Curve::Identity),
            Curve::Gamma(g) if g.abs() > 1e-10 => InverseCurve::Analytic(Curve::Gamma(1.0 / g)),
            Curve::Parametric(c) if matches!(c.curve_type, ParametricCurveType::Gamma | ParametricCurveType::IEC61966_2_1) => {
                InverseCurve::ParametricClosed(*c)
            }
            _ => {
                let mut table = Vec::with_capacity(INVERSE_LUT_SIZE);
                for i in 0..INVERSE_LUT_SIZE {
                    let y = i as f64 / (INVERSE_LUT_SIZE - 1) as f64;
                    table.push(self.eval_inverse_direct(y));
                }
                InverseCurve::Sampled(table)
            }
        }
    }

    fn eval_inverse_direct(&self, y: f64) -> f64 {
        match self {
            Curve::Identity => y,
            Curve::Gamma(g) if g.abs() > 1e-10 => y.powf(1.0 / g),
            Curve::Gamma(_) => y,
            Curve::Table(t) => table_inverse(t, y),
            Curve::Parametric(c) => parametric_curve_eval_inverse(c, y),
        }
    }
}

/// Result of [`Curve::inverse`]: either evaluable directly or pre-sampled.
pub enum InverseCurve {
    Analytic(Curve),
    ParametricClosed(ParametricCurve),
    Sampled(Vec<f64>),
}

impl InverseCurve {
    pub fn eval(&self, y: f64) -> f64 {
        match self {
            InverseCurve::Analytic(c) => c.eval(y),
            InverseCurve::ParametricClosed(c) => parametric_curve_eval_inverse(c, y),
            InverseCurve::Sampled(table) => lut1d_interp(table, y),
        }
    }
}

fn is_linear_ramp(table: &[f64]) -> bool {
    if table.len() < 2 {
        return table.len() == 1 && (table[0] - 1.0).abs() < 1e-6;
    }
    let n = (table.len() - 1) as f64;
    table
        .iter()
        .enumerate()
        .all(|(i, &v)| (v - i as f64 / n).abs() < 1e-4)
}

fn table_inverse(table: &[f64], y: f64) -> f64 {
    if table.is_empty() {
        return y;
    }
    if table.len() == 1 {
        return 0.0;
    }
    let mut lo = 0usize;
    let mut hi = table.len() - 1;
    while lo < hi {
        let mid = (lo + hi) / 2;
        if table[mid] < y {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    if lo == 0 {
        return 0.0;
    }
    let v0 = table[lo - 1];
    let v1 = table[lo];
    let t = if (v1 - v0).abs() > 1e-12 {
        (y - v0) / (v1 - v0)
    } else {
        0.0
    };
    ((lo - 1) as f64 + t) / (table.len() - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_curve_elided() {
        assert!(Curve::Identity.is_identity());
        assert!(Curve::Gamma(1.0).is_identity());
        assert!(!Curve::Gamma(2.2).is_identity());
    }

    #[test]
    fn gamma_roundtrip_via_inverse() {
        let curve = Curve::Gamma(2.2);
        let inv = curve.inverse();
        for x in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let y = curve.eval(x);
            let back = inv.eval(y);
            assert!((back - x).abs() < 1e-6, "x={x} back={back}");
        }
    }

    #[test]
    fn table_curve_samples_endpoints() {
        let curve = Curve::Table(vec![0.0, 0.2, 0.6, 1.0]);
        assert!((curve.eval(0.0) - 0.0).abs() < 1e-9);
        assert!((curve.eval(1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn parametric_srgb_inverse_closed_form() {
        let curve = Curve::Parametric(ParametricCurve::srgb());
        let inv = curve.inverse();
        for x in [0.0, 0.1, 0.5, 0.9, 1.0] {
            let y = curve.eval(x);
            assert!((inv.eval(y) - x).abs() < 1e-6);
        }
    }
}
