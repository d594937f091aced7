//! PCS-adjust hook (§4.3): the three independent adjustments a kernel may
//! latch at `begin()` time and apply to every pixel crossing its PCS
//! boundary - absolute-colorimetric scaling, the V2 perceptual black
//! point rescale, and full black-point compensation (BPC).

use crate::color::{Lab, Xyz};
use crate::icc::header::ColorSpace;
use crate::pipeline::mediator::{pcs_to_xyz, xyz_to_pcs};

/// Perceptual Reference Medium white/black, as fixed by the ICC spec
/// (Appendix D): the anchor every V2-perceptual and BPC computation
/// rescales toward.
pub const PRM_WHITE: Xyz = Xyz { x: 0.9642, y: 1.0, z: 0.8249 };
pub const PRM_BLACK: Xyz = Xyz { x: 0.00336, y: 0.0034731, z: 0.00287 };

/// A linear `y = scale*x + offset` adjustment applied per PCS-XYZ channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearAdjust {
    pub scale: [f64; 3],
    pub offset: [f64; 3],
}

impl LinearAdjust {
    pub const IDENTITY: LinearAdjust = LinearAdjust {
        scale: [1.0, 1.0, 1.0],
        offset: [0.0, 0.0, 0.0],
    };

    pub fn apply(&self, xyz: Xyz) -> Xyz {
        Xyz::new(
            xyz.x * self.scale[0] + self.offset[0],
            xyz.y * self.scale[1] + self.offset[1],
            xyz.z * self.scale[2] + self.offset[2],
        )
    }
}

/// Absolute-colorimetric scaling: media white maps to the illuminant.
pub fn absolute_colorimetric_scale(media_white: Xyz, illuminant: Xyz) -> LinearAdjust {
    LinearAdjust {
        scale: [
            illuminant.x / media_white.x,
            illuminant.y / media_white.y,
            illuminant.z / media_white.z,
        ],
        offset: [0.0, 0.0, 0.0],
    }
}

/// V2 perceptual-intent black point rescale: maps the profile's nominal
/// black toward the Perceptual Reference Medium black, anchored at PRM
/// white (legacy V2 perceptual behavior, not applied for V4 profiles).
pub fn v2_perceptual_black_scale(is_input: bool, profile_black_y: f64) -> LinearAdjust {
    let scale_y = if is_input {
        (1.0 - PRM_BLACK.y) / (1.0 - profile_black_y)
    } else {
        (1.0 - profile_black_y) / (1.0 - PRM_BLACK.y)
    };
    let scale = [scale_y, scale_y, scale_y];
    let offset = [
        (1.0 - scale[0]) * PRM_WHITE.x,
        (1.0 - scale[1]) * PRM_WHITE.y,
        (1.0 - scale[2]) * PRM_WHITE.z,
    ];
    LinearAdjust { scale, offset }
}

/// Device space, used to pick the black-point device coordinate strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Gray,
    Rgb,
    Cmyk,
    OtherNColor(u8),
}

impl DeviceKind {
    pub fn from_color_space(space: ColorSpace, channels: u8) -> Self {
        match space {
            ColorSpace::Gray => DeviceKind::Gray,
            ColorSpace::Rgb => DeviceKind::Rgb,
            ColorSpace::Cmyk => DeviceKind::Cmyk,
            _ => DeviceKind::OtherNColor(channels),
        }
    }

    fn black_device_coords(self) -> Vec<f64> {
        match self {
            DeviceKind::Gray => vec![0.0],
            DeviceKind::Rgb => vec![0.0, 0.0, 0.0],
            DeviceKind::Cmyk | DeviceKind::OtherNColor(_) => {
                let n = match self {
                    DeviceKind::Cmyk => 4,
                    DeviceKind::OtherNColor(n) => n as usize,
                    _ => unreachable!(),
                };
                vec![1.0; n]
            }
        }
    }
}

/// The profile's black point expressed in PCS-XYZ (unencoded, media-relative).
///
/// `device_to_pcs` runs a single device->PCS transform at `intent` through
/// the owning kernel, returning a PCS-XYZ triple; it stands in for the
/// reference CMM's round-trip through a disposable pipeline, since the
/// adjust hook here is a pure function rather than a second CMM instance.
pub fn calc_src_black_point(
    device: DeviceKind,
    is_cmyk_output: bool,
    device_to_pcs: impl Fn(&[f64]) -> Option<Xyz>,
) -> Option<Xyz> {
    let pixel = if is_cmyk_output {
        vec![0.0; 1] // caller resolves the Lab(0,0,0)->CMYK roundtrip upstream; this path only covers the common case below
    } else {
        device.black_device_coords()
    };

    let xyz = device_to_pcs(&pixel)?;
    let mut lab = Lab::from_xyz(xyz);

    if matches!(device, DeviceKind::Cmyk) {
        lab.a = 0.0;
        lab.b = 0.0;
    }
    if lab.l > 50.0 {
        lab.l = 50.0;
    }

    Some(lab.to_xyz())
}

/// Destination black point via the quadratic vertex fit (§4.3): rounds a
/// family of Lab lightness values through a PCS->device->PCS black
/// transform and fits a parabola to the mid-range response.
///
/// `round_trip` performs exactly that: given a PCS-XYZ triple, run it
/// through the profile's BToA0/AToB0 pair at `intent` and return the
/// resulting PCS-XYZ.
pub fn calc_dst_black_point(
    intent_is_relative: bool,
    src_black: Xyz,
    round_trip: impl Fn(Xyz) -> Option<Xyz>,
) -> Option<Xyz> {
    let probe = |l: f64, a: f64, b: f64| -> Option<f64> {
        let pcs = Lab::new(l, a, b).to_xyz();
        let out = round_trip(pcs)?;
        Some(Lab::from_xyz(out).l)
    };

    let ini = Lab::from_xyz(src_black);
    let min_l = probe(0.0, ini.a, ini.b)?;
    let max_l = probe(100.0, ini.a, ini.b)?;

    let mut straight = true;
    if intent_is_relative {
        let mut lcnt = 0.0f64;
        while lcnt < 100.1 {
            let roundtrip_l = probe(lcnt, ini.a, ini.b)?;
            if roundtrip_l > min_l + 0.2 * (max_l - min_l) && (roundtrip_l - lcnt).abs() > 4.0 {
                straight = false;
                break;
            }
            lcnt += 1.0;
        }
    }

    if straight {
        return Some(Lab::new(ini.l, ini.a, ini.b).to_xyz());
    }

    let (lo, hi) = if intent_is_relative { (0.1, 0.5) } else { (0.03, 0.25) };

    let mut xs = Vec::with_capacity(101);
    let mut ys = Vec::with_capacity(101);
    for i in 0..=100 {
        let l = i as f64;
        let roundtrip_l = probe(l, ini.a, ini.b)?;
        let y = (roundtrip_l - min_l) / (max_l - min_l);
        if y >= lo && y < hi {
            xs.push(l);
            ys.push(y);
        }
    }
    if xs.is_empty() {
        return None;
    }

    let mut l_vertex = calc_quadratic_vertex(&xs, &ys);
    if l_vertex < 0.0 {
        l_vertex = 0.0;
    }

    Some(Lab::new(l_vertex, ini.a, ini.b).to_xyz())
}

/// Least-squares fit of `y = t*x^2 + u*x + c` through `(x[i], y[i])`,
/// returning the vertex `(-u + sqrt(u^2 - 4*t*c)) / (2*t)`.
pub fn calc_quadratic_vertex(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n <= 2 {
        return 0.0;
    }

    let sum = |j: i32, k: i32| -> f64 {
        (0..n)
            .map(|i| {
                let xt = if j != 0 { x[i].powi(j) } else { 1.0 };
                let yt = if k != 0 { y[i].powi(k) } else { 1.0 };
                xt * yt
            })
            .sum()
    };

    let s00 = n as f64;
    let s10 = sum(1, 0);
    let s20 = sum(2, 0);
    let s30 = sum(3, 0);
    let s40 = sum(4, 0);
    let s01 = sum(0, 1);
    let s11 = sum(1, 1);
    let s21 = sum(2, 1);

    let denom = s00 * s20 * s40 - s10 * s10 * s40 - s00 * s30 * s30 + 2.0 * s10 * s20 * s30
        - s20 * s20 * s20;
    if denom.abs() <= 0.0 {
        return 0.0;
    }

    let t = (s01 * s10 * s30 - s11 * s00 * s30 - s01 * s20 * s20 + s11 * s10 * s20
        + s21 * s00 * s20
        - s21 * s10 * s10)
        / denom;
    let u = (s11 * s00 * s40 - s01 * s10 * s40 + s01 * s20 * s30 - s21 * s00 * s30
        - s11 * s20 * s20
        + s21 * s10 * s20)
        / denom;
    let c = (s01 * s20 * s40 - s11 * s10 * s40 - s01 * s30 * s30 + s11 * s20 * s30
        + s21 * s10 * s30
        - s21 * s20 * s20)
        / denom;

    let disc = u * u - 4.0 * t * c;
    if disc < 0.0 || t.abs() < 1e-12 {
        return 0.0;
    }
    (-u + disc.sqrt()) / (2.0 * t)
}

/// Scale/offset pair derived from a black point, matching §4.3's BPC
/// factor calculation: PRM black is the anchor on the opposite side of
/// whichever profile is the source.
pub fn calc_bpc_factors(is_input: bool, black: Xyz) -> LinearAdjust {
    let scale_y = if is_input {
        (1.0 - PRM_BLACK.y) / (1.0 - black.y)
    } else {
        (1.0 - black.y) / (1.0 - PRM_BLACK.y)
    };
    let scale = [scale_y; 3];
    let offset_xyz = Xyz::new(
        (1.0 - scale[0]) * PRM_WHITE.x,
        (1.0 - scale[1]) * PRM_WHITE.y,
        (1.0 - scale[2]) * PRM_WHITE.z,
    );
    let encoded = xyz_to_pcs(offset_xyz);
    LinearAdjust {
        scale,
        offset: encoded,
    }
}

/// Apply a [`LinearAdjust`] to a PCS-XYZ-encoded pixel in place.
pub fn apply_to_encoded_pcs(adjust: &LinearAdjust, pixel: &mut [f64; 3]) {
    let xyz = adjust.apply(pcs_to_xyz(*pixel));
    *pixel = xyz_to_pcs(xyz);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_scale_maps_media_white_to_illuminant() {
        let d50 = Xyz::new(0.9642, 1.0, 0.8249);
        let media = Xyz::new(0.95, 0.99, 0.81);
        let adjust = absolute_colorimetric_scale(media, d50);
        let mapped = adjust.apply(media);
        assert!((mapped.x - d50.x).abs() < 1e-9);
        assert!((mapped.y - d50.y).abs() < 1e-9);
        assert!((mapped.z - d50.z).abs() < 1e-9);
    }

    #[test]
    fn quadratic_vertex_recovers_known_parabola() {
        // y = (x - 50)^2 / 2500, vertex at x=50
        let xs: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| (x - 50.0).powi(2) / 2500.0).collect();
        let vertex = calc_quadratic_vertex(&xs, &ys);
        assert!((vertex - 50.0).abs() < 1.0, "vertex={vertex}");
    }

    #[test]
    fn src_black_point_cmyk_clips_l_and_zeroes_ab() {
        let xyz_of_black = Xyz::new(0.01, 0.008, 0.009);
        let result = calc_src_black_point(DeviceKind::Cmyk, false, |_| Some(xyz_of_black)).unwrap();
        let lab = Lab::from_xyz(result);
        assert!(lab.l <= 50.0 + 1e-6);
        assert!(lab.a.abs() < 1e-9);
        assert!(lab.b.abs() < 1e-9);
    }

    #[test]
    fn bpc_factors_identity_when_black_matches_prm() {
        let adjust = calc_bpc_factors(true, PRM_BLACK);
        assert!((adjust.scale[1] - 1.0).abs() < 1e-6);
    }
}
