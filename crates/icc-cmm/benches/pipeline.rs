//! Benchmarks for the two hot paths a CMM spends its time in: CLUT
//! interpolation and a sealed pipeline's per-pixel `apply`.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use icc_cmm::icc::header::{ColorSpace, IccHeader, ProfileClass, ProfileVersion, RenderingIntent};
use icc_cmm::icc::tags::{TagData, XyzTagData};
use icc_cmm::icc::{CurveData, DateTimeNumber, IccProfile, S15Fixed16, TagSignature, XyzNumber};
use icc_cmm::pipeline::kernel::Direction;
use icc_cmm::pipeline::{ApplyOptions, Clut, CmmPipeline};
use rand::SeedableRng;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

fn identity_cube(grid: usize) -> Clut {
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
    Clut::new(vec![grid as u8; 3], 3, data)
}

fn random_points(count: usize, seed: u64) -> Vec<[f64; 3]> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| [rng.r#gen::<f64>(), rng.r#gen::<f64>(), rng.r#gen::<f64>()])
        .collect()
}

fn bench_clut_interpolate(c: &mut Criterion) {
    let mut group = c.benchmark_group("clut_interpolate");

    for &grid in &[9usize, 17, 33] {
        let clut = identity_cube(grid);
        let points = random_points(1000, grid as u64);
        group.throughput(Throughput::Elements(points.len() as u64));
        group.bench_with_input(BenchmarkId::new("tetrahedral", grid), &points, |b, points| {
            b.iter(|| {
                for p in points {
                    black_box(clut.interpolate(black_box(p)));
                }
            })
        });
    }

    group.finish();
}

fn xyz_tag(x: f64, y: f64, z: f64) -> TagData {
    TagData::Xyz(XyzTagData {
        values: vec![XyzNumber {
            x: S15Fixed16::from_f64(x),
            y: S15Fixed16::from_f64(y),
            z: S15Fixed16::from_f64(z),
        }],
    })
}

fn blank_header(color_space: ColorSpace, pcs: ColorSpace) -> IccHeader {
    IccHeader {
        size: 128,
        cmm_type: 0,
        version: ProfileVersion { major: 4, minor: 4, patch: 0 },
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

fn identity_matrix_trc_profile() -> IccProfile {
    let mut tags: HashMap<u32, TagData> = HashMap::new();
    tags.insert(TagSignature::RED_COLORANT.0, xyz_tag(1.0, 0.0, 0.0));
    tags.insert(TagSignature::GREEN_COLORANT.0, xyz_tag(0.0, 1.0, 0.0));
    tags.insert(TagSignature::BLUE_COLORANT.0, xyz_tag(0.0, 0.0, 1.0));
    let identity_curve = TagData::Curve(CurveData::Identity);
    tags.insert(TagSignature::RED_TRC.0, identity_curve.clone());
    tags.insert(TagSignature::GREEN_TRC.0, identity_curve.clone());
    tags.insert(TagSignature::BLUE_TRC.0, identity_curve);
    IccProfile::from_parts(blank_header(ColorSpace::Rgb, ColorSpace::Xyz), tags, Vec::new())
}

fn bench_pipeline_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_apply");

    let src = identity_matrix_trc_profile();
    let dst = identity_matrix_trc_profile();
    let mut pipeline = CmmPipeline::new();
    pipeline.add_xform(&src, None, Direction::DeviceToPcs).unwrap();
    pipeline.add_xform(&dst, None, Direction::PcsToDevice).unwrap();
    pipeline.begin(false).unwrap();

    let points = random_points(1000, 7);

    group.throughput(Throughput::Elements(points.len() as u64));

    group.bench_function("no_cache", |b| {
        let mut ctx = pipeline.new_apply(ApplyOptions::default());
        let mut out = [0.0; 3];
        b.iter(|| {
            for p in &points {
                pipeline.apply(&mut ctx, &mut out, black_box(p)).unwrap();
                black_box(out);
            }
        })
    });

    group.bench_function("mru_cache_128", |b| {
        let mut ctx = pipeline.new_apply(ApplyOptions::default().with_mru(128));
        let mut out = [0.0; 3];
        b.iter(|| {
            for p in &points {
                pipeline.apply(&mut ctx, &mut out, black_box(p)).unwrap();
                black_box(out);
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_clut_interpolate, bench_pipeline_apply);
criterion_main!(benches);
