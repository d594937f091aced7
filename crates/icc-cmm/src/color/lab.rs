//! CIELAB (L*a*b*) color space - the PCS mediator's non-XYZ encoding.
//!
//! - L*: Lightness (0 = black, 100 = white)
//! - a*: Green-red axis (negative = green, positive = red)
//! - b*: Blue-yellow axis (negative = blue, positive = yellow)

use crate::color::{D50, WhitePoint, Xyz};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    #[inline]
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Convert from XYZ with D50 white point (ICC PCS).
    pub fn from_xyz(xyz: Xyz) -> Self {
        Self::from_xyz_with_white(xyz, &D50)
    }

    pub fn from_xyz_with_white(xyz: Xyz, white: &WhitePoint) -> Self {
        let xr = xyz.x / white.xyz.x;
        let yr = xyz.y / white.xyz.y;
        let zr = xyz.z / white.xyz.z;

        let fx = lab_f(xr);
        let fy = lab_f(yr);
        let fz = lab_f(zr);

        Self {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    /// Convert to XYZ with D50 white point (ICC PCS).
    pub fn to_xyz(&self) -> Xyz {
        self.to_xyz_with_white(&D50)
    }

    pub fn to_xyz_with_white(&self, white: &WhitePoint) -> Xyz {
        let fy = (self.l + 16.0) / 116.0;
        let fx = self.a / 500.0 + fy;
        let fz = fy - self.b / 200.0;

        let xr = lab_f_inv(fx);
        let yr = lab_f_inv(fy);
        let zr = lab_f_inv(fz);

        Xyz::new(xr * white.xyz.x, yr * white.xyz.y, zr * white.xyz.z)
    }

    #[inline]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.l - other.l).abs() < epsilon
            && (self.a - other.a).abs() < epsilon
            && (self.b - other.b).abs() < epsilon
    }
}

/// Lab forward function: f(t) for XYZ -> Lab conversion.
#[inline]
fn lab_f(t: f64) -> f64 {
    const DELTA: f64 = 6.0 / 29.0;
    const DELTA_CUBED: f64 = DELTA * DELTA * DELTA;

    if t > DELTA_CUBED {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

/// Lab inverse function: f^-1(t) for Lab -> XYZ conversion.
#[inline]
fn lab_f_inv(t: f64) -> f64 {
    const DELTA: f64 = 6.0 / 29.0;

    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    #[test]
    fn white_is_l_100() {
        let white = Xyz::new(D50.xyz.x, D50.xyz.y, D50.xyz.z);
        let lab = Lab::from_xyz(white);
        assert!((lab.l - 100.0).abs() < EPSILON);
        assert!(lab.a.abs() < EPSILON);
        assert!(lab.b.abs() < EPSILON);
    }

    #[test]
    fn black_is_l_0() {
        let black = Xyz::new(0.0, 0.0, 0.0);
        let lab = Lab::from_xyz(black);
        assert!(lab.l.abs() < EPSILON);
    }

    #[test]
    fn xyz_roundtrip() {
        let original = Lab::new(50.0, 25.0, -30.0);
        let xyz = original.to_xyz();
        let roundtrip = Lab::from_xyz(xyz);
        assert!(original.approx_eq(&roundtrip, 1e-9), "roundtrip failed: {original:?} vs {roundtrip:?}");
    }

    #[test]
    fn non_d50_white_point_round_trips_too() {
        use crate::color::D65;
        let original = Lab::new(70.0, -10.0, 15.0);
        let xyz = original.to_xyz_with_white(&D65);
        let roundtrip = Lab::from_xyz_with_white(xyz, &D65);
        assert!(original.approx_eq(&roundtrip, 1e-9));
    }
}
