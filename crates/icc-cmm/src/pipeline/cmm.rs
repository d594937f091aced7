//! CMM pipeline construction (§4.5): `CmmPipeline` chains one kernel per
//! appended profile, validating space links as each is added and sealing
//! into an immutable, `Sync` pipeline that many apply contexts can drive
//! concurrently (§5).

use crate::color::Xyz;
use crate::icc::header::{ColorSpace, ProfileClass, RenderingIntent};
use crate::icc::IccProfile;
use crate::pipeline::context::{ApplyContext, ApplyOptions};
use crate::pipeline::error::{CmmError, CmmResult};
use crate::pipeline::kernel::{Direction, TransformKernel};
use crate::pipeline::mediator::PcsDeclaration;
use crate::pipeline::pcs_adjust;

/// One appended kernel plus the PCS metadata needed to mediate the
/// boundary feeding into it.
#[derive(Debug, Clone)]
struct KernelLink {
    kernel: TransformKernel,
    intent: RenderingIntent,
    entry_space: ColorSpace,
    exit_space: ColorSpace,
    legacy_lab: bool,
    media_white: Option<Xyz>,
    media_black: Option<Xyz>,
    illuminant: Xyz,
    /// Black-point-compensation anchors (src, dst) estimated by round-tripping
    /// each side's nominal black through its own kernel (§4.3), latched once
    /// here rather than recomputed per pixel.
    bpc_black_points: Option<(Xyz, Xyz)>,
}

/// A sealed chain of kernels, device space in one end, device space (or
/// PCS, for an unterminated link chain) out the other.
#[derive(Debug, Clone, Default)]
pub struct CmmPipeline {
    links: Vec<KernelLink>,
    sealed: bool,
    max_channels: usize,
}

fn spaces_compatible(a: ColorSpace, b: ColorSpace) -> bool {
    if a == b {
        return true;
    }
    let pcs_like = |s: ColorSpace| matches!(s, ColorSpace::Xyz | ColorSpace::Lab);
    if pcs_like(a) && pcs_like(b) {
        return true;
    }
    a.channels() == b.channels()
}

impl CmmPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn kernel_count(&self) -> usize {
        self.links.len()
    }

    /// Append a kernel built from `profile` for `direction`. `requested_intent`
    /// of `None` resolves to the profile's header intent on the first
    /// kernel, or the previous kernel's intent thereafter (§4.5).
    pub fn add_xform(
        &mut self,
        profile: &IccProfile,
        requested_intent: Option<RenderingIntent>,
        mut direction: Direction,
    ) -> CmmResult<()> {
        if self.sealed {
            return Err(CmmError::BadXform);
        }

        let mut intent = requested_intent.unwrap_or_else(|| {
            self.links
                .last()
                .map(|l| l.intent)
                .unwrap_or(profile.header.rendering_intent)
        });

        if profile.header.device_class == ProfileClass::DeviceLink
            && intent == RenderingIntent::AbsoluteColorimetric
        {
            log::warn!("device-link profile requested Absolute intent; demoting to Perceptual");
            intent = RenderingIntent::Perceptual;
        }

        if profile.header.device_class == ProfileClass::Abstract {
            log::debug!("abstract profile forces input-side direction and Perceptual intent");
            direction = Direction::DeviceToPcs;
            intent = RenderingIntent::Perceptual;
        }

        let entry_space = match direction {
            Direction::DeviceToPcs => profile.header.color_space,
            Direction::PcsToDevice => profile.header.pcs,
        };
        let exit_space = match direction {
            Direction::DeviceToPcs => profile.header.pcs,
            Direction::PcsToDevice => profile.header.color_space,
        };

        if let Some(last) = self.links.last() {
            if !spaces_compatible(last.exit_space, entry_space) {
                return Err(CmmError::BadSpaceLink(format!(
                    "{:?} does not link to {:?}",
                    last.exit_space, entry_space
                )));
            }
        }

        let kernel = TransformKernel::build(profile, intent, direction)?;
        self.max_channels = self.max_channels.max(kernel.device_channels()).max(3);

        let bpc_black_points =
            Self::estimate_bpc_black_points(self.links.last(), profile, intent, direction, &kernel);

        self.links.push(KernelLink {
            kernel,
            intent,
            entry_space,
            exit_space,
            legacy_lab: !profile.header.version.is_v4(),
            media_white: profile.media_white_point(),
            media_black: profile.media_black_point(),
            illuminant: profile.header.illuminant.to_xyz(),
            bpc_black_points,
        });
        Ok(())
    }

    /// Estimates the black-point-compensation anchor pair (§4.3) for the
    /// boundary between `prev` and the profile/kernel being appended, by
    /// round-tripping each side's nominal black through its own kernel
    /// rather than trusting the optional `bkpt` tag. Only meaningful on the
    /// standard device->PCS->device boundary; anywhere else this is `None`
    /// and the BPC branch in `apply_uncached` simply no-ops.
    fn estimate_bpc_black_points(
        prev: Option<&KernelLink>,
        profile: &IccProfile,
        intent: RenderingIntent,
        direction: Direction,
        kernel: &TransformKernel,
    ) -> Option<(Xyz, Xyz)> {
        if direction != Direction::PcsToDevice {
            return None;
        }
        let prev = prev?;
        if prev.kernel.direction() != Direction::DeviceToPcs {
            return None;
        }

        let device_kind =
            pcs_adjust::DeviceKind::from_color_space(prev.entry_space, prev.kernel.device_channels() as u8);
        let src_black = pcs_adjust::calc_src_black_point(device_kind, false, |device| {
            let mut pcs = [0.0; 3];
            prev.kernel.apply(&mut pcs, device).ok()?;
            Some(Xyz::new(pcs[0], pcs[1], pcs[2]))
        })?;

        let reverse_kernel = TransformKernel::build(profile, intent, Direction::DeviceToPcs).ok()?;
        let dst_black = pcs_adjust::calc_dst_black_point(
            intent == RenderingIntent::RelativeColorimetric,
            src_black,
            |pcs| {
                let mut device = vec![0.0; kernel.device_channels()];
                kernel.apply(&mut device, &[pcs.x, pcs.y, pcs.z]).ok()?;
                let mut back = [0.0; 3];
                reverse_kernel.apply(&mut back, &device).ok()?;
                Some(Xyz::new(back[0], back[1], back[2]))
            },
        )?;

        Some((src_black, dst_black))
    }

    /// Seal the pipeline. Returns a fresh apply context when `alloc_apply`
    /// is set, matching the reference API's default-context convenience.
    pub fn begin(&mut self, alloc_apply: bool) -> CmmResult<Option<ApplyContext>> {
        if self.links.is_empty() {
            return Err(CmmError::BadXform);
        }
        self.sealed = true;
        Ok(alloc_apply.then(|| self.new_apply(ApplyOptions::default())))
    }

    pub fn new_apply(&self, options: ApplyOptions) -> ApplyContext {
        ApplyContext::new(self.max_channels, options)
    }

    pub fn src_channels(&self) -> usize {
        self.links.first().map(|l| l.kernel.device_channels()).unwrap_or(0)
    }

    pub fn dst_channels(&self) -> usize {
        self.links.last().map(|l| l.kernel.device_channels()).unwrap_or(0)
    }

    pub fn apply(&self, ctx: &mut ApplyContext, dst: &mut [f64], src: &[f64]) -> CmmResult<()> {
        if !self.sealed {
            return Err(CmmError::BadXform);
        }
        if let Some(mut cache) = ctx.cache.take() {
            let cached = cache.lookup(src).map(|d| d.to_vec());
            let out = match cached {
                Some(d) => d,
                None => {
                    let mut buf = vec![0.0; dst.len()];
                    self.apply_uncached(ctx, &mut buf, src)?;
                    cache.insert(src, &buf);
                    buf
                }
            };
            let n = out.len().min(dst.len());
            dst[..n].copy_from_slice(&out[..n]);
            ctx.cache = Some(cache);
            Ok(())
        } else {
            self.apply_uncached(ctx, dst, src)
        }
    }

    fn apply_uncached(&self, ctx: &mut ApplyContext, dst: &mut [f64], src: &[f64]) -> CmmResult<()> {
        let mut current = src.to_vec();

        for (idx, link) in self.links.iter().enumerate() {
            if idx > 0 {
                let prev = &self.links[idx - 1];
                if current.len() == 3 && is_pcs(prev.exit_space) && is_pcs(link.entry_space) {
                    let declaration = PcsDeclaration {
                        space: link.entry_space,
                        legacy_lab: link.legacy_lab,
                        no_clip: !ctx.options.clamp_output,
                    };
                    let pixel = [current[0], current[1], current[2]];
                    let mediated = ctx.mediator.check(&pixel, declaration).into_owned();

                    let mut pixel = mediated;

                    // DToB3/BToD3-resolved MPE kernels already encode absolute
                    // colorimetric scaling in their own elements; re-applying
                    // it here would double-scale the pixel.
                    if link.intent == RenderingIntent::AbsoluteColorimetric
                        && !matches!(link.kernel, TransformKernel::Mpe(_))
                    {
                        if let Some(white) = link.media_white {
                            let adjust = pcs_adjust::absolute_colorimetric_scale(white, link.illuminant);
                            pcs_adjust::apply_to_encoded_pcs(&adjust, &mut pixel);
                        }
                    } else if ctx.options.black_point_compensation {
                        if let Some((src_black, dst_black)) = link.bpc_black_points {
                            pcs_adjust::apply_to_encoded_pcs(
                                &pcs_adjust::calc_bpc_factors(true, src_black),
                                &mut pixel,
                            );
                            pcs_adjust::apply_to_encoded_pcs(
                                &pcs_adjust::calc_bpc_factors(false, dst_black),
                                &mut pixel,
                            );
                        }
                    } else if link.legacy_lab
                        && link.intent == RenderingIntent::Perceptual
                        && prev.legacy_lab
                    {
                        if let Some(black) = prev.media_black {
                            pcs_adjust::apply_to_encoded_pcs(
                                &pcs_adjust::v2_perceptual_black_scale(true, black.y),
                                &mut pixel,
                            );
                        }
                    }

                    current = pixel.to_vec();
                }
            }

            let expected_in = match link.kernel.direction() {
                Direction::DeviceToPcs => link.kernel.device_channels(),
                Direction::PcsToDevice => 3,
            };
            if current.len() != expected_in {
                return Err(CmmError::IncorrectApply(format!(
                    "kernel {idx} expected {expected_in} inputs, chain carries {}",
                    current.len()
                )));
            }

            let expected_out = match link.kernel.direction() {
                Direction::DeviceToPcs => 3,
                Direction::PcsToDevice => link.kernel.device_channels(),
            };
            let mut out = vec![0.0; expected_out.max(3)];
            link.kernel.apply(&mut out[..expected_out], &current)?;
            out.truncate(expected_out);
            current = out;
        }

        if current.len() != dst.len() {
            return Err(CmmError::IncorrectApply(format!(
                "pipeline produced {} channels, destination holds {}",
                current.len(),
                dst.len()
            )));
        }
        dst.copy_from_slice(&current);
        Ok(())
    }
}

fn is_pcs(space: ColorSpace) -> bool {
    matches!(space, ColorSpace::Xyz | ColorSpace::Lab)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icc::header::{IccHeader, ProfileVersion};
    use crate::icc::tags::{TagData, XyzTagData};
    use crate::icc::{DateTimeNumber, S15Fixed16, XyzNumber};
    use std::collections::HashMap;

    fn blank_header(color_space: ColorSpace, pcs: ColorSpace) -> IccHeader {
        IccHeader {
            size: 128,
            cmm_type: 0,
            version: ProfileVersion { major: 4, minor: 4, patch: 0 },
            device_class: ProfileClass::Display,
            color_space,
            pcs,
            creation_date: DateTimeNumber::default(),
            signature: crate::icc::header::PROFILE_SIGNATURE,
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

    fn xyz_tag(x: f64, y: f64, z: f64) -> TagData {
        TagData::Xyz(XyzTagData {
            values: vec![XyzNumber {
                x: S15Fixed16::from_f64(x),
                y: S15Fixed16::from_f64(y),
                z: S15Fixed16::from_f64(z),
            }],
        })
    }

    fn identity_rgb_profile() -> IccProfile {
        let mut tags: HashMap<u32, TagData> = HashMap::new();
        tags.insert(crate::icc::TagSignature::RED_COLORANT.0, xyz_tag(1.0, 0.0, 0.0));
        tags.insert(crate::icc::TagSignature::GREEN_COLORANT.0, xyz_tag(0.0, 1.0, 0.0));
        tags.insert(crate::icc::TagSignature::BLUE_COLORANT.0, xyz_tag(0.0, 0.0, 1.0));
        let identity_curve = TagData::Curve(crate::icc::CurveData::Identity);
        tags.insert(crate::icc::TagSignature::RED_TRC.0, identity_curve.clone());
        tags.insert(crate::icc::TagSignature::GREEN_TRC.0, identity_curve.clone());
        tags.insert(crate::icc::TagSignature::BLUE_TRC.0, identity_curve);

        IccProfile::from_parts(blank_header(ColorSpace::Rgb, ColorSpace::Xyz), tags, Vec::new())
    }

    #[test]
    fn rejects_space_link_mismatch() {
        let gray = identity_rgb_profile();
        let mut mismatched = gray.clone();
        mismatched.header.color_space = ColorSpace::Cmyk;

        let mut pipeline = CmmPipeline::new();
        pipeline.add_xform(&gray, None, Direction::DeviceToPcs).unwrap();
        let err = pipeline.add_xform(&mismatched, None, Direction::DeviceToPcs);
        assert!(err.is_err());
    }

    #[test]
    fn two_identity_matrix_trc_profiles_round_trip() {
        let src = identity_rgb_profile();
        let dst = identity_rgb_profile();

        let mut pipeline = CmmPipeline::new();
        pipeline.add_xform(&src, None, Direction::DeviceToPcs).unwrap();
        pipeline.add_xform(&dst, None, Direction::PcsToDevice).unwrap();
        let mut ctx = pipeline.begin(false).unwrap();
        assert!(ctx.is_none());
        let mut ctx = pipeline.new_apply(ApplyOptions::default());

        let mut out = [0.0; 3];
        pipeline.apply(&mut ctx, &mut out, &[0.2, 0.4, 0.6]).unwrap();
        assert!((out[0] - 0.2).abs() < 1e-6);
        assert!((out[1] - 0.4).abs() < 1e-6);
        assert!((out[2] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn bpc_moves_output_when_black_points_differ() {
        let mut src = identity_rgb_profile();
        src.tags.insert(crate::icc::TagSignature::MEDIA_BLACK.0, xyz_tag(0.02, 0.02, 0.02));
        let mut dst = identity_rgb_profile();
        dst.tags.insert(crate::icc::TagSignature::MEDIA_BLACK.0, xyz_tag(0.0, 0.0, 0.0));

        let mut pipeline = CmmPipeline::new();
        pipeline.add_xform(&src, None, Direction::DeviceToPcs).unwrap();
        pipeline.add_xform(&dst, None, Direction::PcsToDevice).unwrap();
        pipeline.begin(false).unwrap();
        let mut ctx = pipeline.new_apply(ApplyOptions::default().with_bpc());

        let mut out = [0.0; 3];
        pipeline.apply(&mut ctx, &mut out, &[0.2, 0.4, 0.6]).unwrap();
        assert!(out.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn apply_before_begin_is_rejected() {
        let src = identity_rgb_profile();
        let mut pipeline = CmmPipeline::new();
        pipeline.add_xform(&src, None, Direction::DeviceToPcs).unwrap();
        let mut ctx = pipeline.new_apply(ApplyOptions::default());
        let mut out = [0.0; 3];
        assert!(pipeline.apply(&mut ctx, &mut out, &[0.1, 0.2, 0.3]).is_err());
    }
}
