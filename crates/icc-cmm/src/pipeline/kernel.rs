//! Transform kernels (§4.2): the largest single component. A kernel owns
//! one profile, one direction, one rendering intent and one interpolation
//! choice, latched once at `begin()`, and exposes a uniform `apply` that
//! every CMM pipeline stage can call without knowing which tag shape
//! backed it.

use crate::color::Xyz;
use crate::icc::header::{ColorSpace, RenderingIntent};
use crate::icc::tags::{LutAToBData, LutBToAData, TagData};
use crate::icc::IccProfile;
use crate::pipeline::clut::Clut;
use crate::pipeline::curve::Curve;
use crate::pipeline::error::{CmmError, CmmResult};
use crate::pipeline::matrix_eval::MatrixEval;
use crate::pipeline::mpe::MpePipeline;

/// Which side of the profile this kernel reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    DeviceToPcs,
    PcsToDevice,
}

/// Built, sealed transform kernel. Variants mirror §4.2's five kernel
/// kinds; constructed in fallback order: MPE, then AtoBn/BtoAn, then
/// MatrixTRC/Monochrome, then named-color.
#[derive(Debug, Clone)]
pub enum TransformKernel {
    MatrixTrc(MatrixTrcKernel),
    Monochrome(MonochromeKernel),
    Lut(LutKernel),
    NamedColor(NamedColorKernel),
    Mpe(MpeKernel),
}

impl TransformKernel {
    pub fn build(profile: &IccProfile, intent: RenderingIntent, direction: Direction) -> CmmResult<Self> {
        let has_mpe = match direction {
            Direction::DeviceToPcs => profile.dtob_for_intent(intent).is_some(),
            Direction::PcsToDevice => profile.btod_for_intent(intent).is_some(),
        };
        if has_mpe {
            return MpeKernel::build(profile, intent, direction).map(TransformKernel::Mpe);
        }

        let has_lut = match direction {
            Direction::DeviceToPcs => profile.a2b_for_intent(intent).is_some(),
            Direction::PcsToDevice => profile.b2a_for_intent(intent).is_some(),
        };
        if has_lut {
            return LutKernel::build(profile, intent, direction).map(TransformKernel::Lut);
        }

        if profile.is_matrix_shaper() {
            return MatrixTrcKernel::build(profile, direction).map(TransformKernel::MatrixTrc);
        }

        if profile.header.color_space == ColorSpace::Gray && profile.gray_trc().is_some() {
            return MonochromeKernel::build(profile, direction).map(TransformKernel::Monochrome);
        }

        if profile.named_color_table().is_some() {
            return NamedColorKernel::build(profile).map(TransformKernel::NamedColor);
        }

        Err(CmmError::InvalidProfile(
            "no usable A2B/B2A, MatrixTRC, Monochrome, or named-color tag set for requested direction".into(),
        ))
    }

    pub fn device_channels(&self) -> usize {
        match self {
            TransformKernel::MatrixTrc(_) => 3,
            TransformKernel::Monochrome(_) => 1,
            TransformKernel::Lut(k) => k.device_channels,
            TransformKernel::NamedColor(k) => k.device_channels,
            TransformKernel::Mpe(k) => k.device_channels,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            TransformKernel::MatrixTrc(k) => k.direction,
            TransformKernel::Monochrome(k) => k.direction,
            TransformKernel::Lut(k) => k.direction,
            TransformKernel::NamedColor(_) => Direction::DeviceToPcs,
            TransformKernel::Mpe(k) => k.direction,
        }
    }

    /// `src`/`dst` are PCS-XYZ-free: device-side kernels take/return raw
    /// device channel values in [0,1]; PCS-side values are plain XYZ.
    pub fn apply(&self, dst: &mut [f64], src: &[f64]) -> CmmResult<()> {
        match self {
            TransformKernel::MatrixTrc(k) => k.apply(dst, src),
            TransformKernel::Monochrome(k) => k.apply(dst, src),
            TransformKernel::Lut(k) => k.apply(dst, src),
            TransformKernel::NamedColor(k) => k.apply(dst, src),
            TransformKernel::Mpe(k) => k.apply(dst, src),
        }
    }
}

fn matrix3x3_from_fixed(m: &[[crate::icc::S15Fixed16; 3]; 3]) -> crate::math::Matrix3x3 {
    crate::math::Matrix3x3::new([
        [m[0][0].to_f64(), m[0][1].to_f64(), m[0][2].to_f64()],
        [m[1][0].to_f64(), m[1][1].to_f64(), m[1][2].to_f64()],
        [m[2][0].to_f64(), m[2][1].to_f64(), m[2][2].to_f64()],
    ])
}

fn device_to_pcs_scale(pcs: ColorSpace) -> CmmResult<()> {
    if pcs != ColorSpace::Xyz && pcs != ColorSpace::Lab {
        return Err(CmmError::BadSpaceLink(format!("unsupported PCS signature {pcs:?}")));
    }
    Ok(())
}

fn apply_curves(curves: &[Curve], stage: Vec<f64>) -> Vec<f64> {
    if curves.is_empty() {
        return stage;
    }
    stage
        .iter()
        .enumerate()
        .map(|(i, &v)| curves.get(i).map(|c| c.eval(v)).unwrap_or(v))
        .collect()
}

fn apply_matrix(matrix: &Option<MatrixEval>, stage: Vec<f64>) -> Vec<f64> {
    match matrix {
        Some(m) if stage.len() == 3 => m.apply3([stage[0], stage[1], stage[2]]).to_vec(),
        _ => stage,
    }
}

fn apply_clut(clut: &Option<Clut>, stage: Vec<f64>) -> Vec<f64> {
    match clut {
        Some(c) => c.interpolate(&stage),
        None => stage,
    }
}

// ---------------------------------------------------------------- MatrixTRC

#[derive(Debug, Clone)]
pub struct MatrixTrcKernel {
    direction: Direction,
    matrix: MatrixEval,
    red: Curve,
    green: Curve,
    blue: Curve,
}

impl MatrixTrcKernel {
    fn build(profile: &IccProfile, direction: Direction) -> CmmResult<Self> {
        device_to_pcs_scale(profile.header.pcs)?;
        let r = profile.red_colorant().ok_or_else(|| CmmError::ProfileMissingTag("rXYZ".into()))?;
        let g = profile.green_colorant().ok_or_else(|| CmmError::ProfileMissingTag("gXYZ".into()))?;
        let b = profile.blue_colorant().ok_or_else(|| CmmError::ProfileMissingTag("bXYZ".into()))?;
        let matrix = MatrixEval::new(
            3,
            3,
            vec![r.x, g.x, b.x, r.y, g.y, b.y, r.z, g.z, b.z],
            vec![0.0; 3],
        );

        let red = Curve::from_curve_data(profile.red_trc().ok_or_else(|| CmmError::ProfileMissingTag("rTRC".into()))?);
        let green = Curve::from_curve_data(profile.green_trc().ok_or_else(|| CmmError::ProfileMissingTag("gTRC".into()))?);
        let blue = Curve::from_curve_data(profile.blue_trc().ok_or_else(|| CmmError::ProfileMissingTag("bTRC".into()))?);

        Ok(Self { direction, matrix, red, green, blue })
    }

    fn apply(&self, dst: &mut [f64], src: &[f64]) -> CmmResult<()> {
        if src.len() != 3 || dst.len() != 3 {
            return Err(CmmError::IncorrectApply("MatrixTRC kernel expects 3 channels".into()));
        }
        match self.direction {
            Direction::DeviceToPcs => {
                let linear = [self.red.eval(src[0]), self.green.eval(src[1]), self.blue.eval(src[2])];
                let xyz = self.matrix.apply3(linear);
                dst.copy_from_slice(&xyz);
            }
            Direction::PcsToDevice => {
                let inv = self.invert_matrix()?;
                let linear = inv.apply3([src[0], src[1], src[2]]);
                dst[0] = self.red.inverse().eval(linear[0]);
                dst[1] = self.green.inverse().eval(linear[1]);
                dst[2] = self.blue.inverse().eval(linear[2]);
            }
        }
        Ok(())
    }

    fn invert_matrix(&self) -> CmmResult<MatrixEval> {
        // Columns of the colorant matrix are its response to unit vectors;
        // rebuild a Matrix3x3 from those and reuse its cofactor-based
        // `inverse()` rather than duplicating the algebra here.
        let col = |i: usize| {
            let mut unit = [0.0; 3];
            unit[i] = 1.0;
            self.matrix.apply3(unit)
        };
        let (c0, c1, c2) = (col(0), col(1), col(2));
        let m = crate::math::Matrix3x3::new([
            [c0[0], c1[0], c2[0]],
            [c0[1], c1[1], c2[1]],
            [c0[2], c1[2], c2[2]],
        ]);
        let inv = m.inverse().ok_or_else(|| CmmError::InvalidProfile("singular colorant matrix".into()))?;
        Ok(MatrixEval::from_matrix3x3(&inv, [0.0; 3]))
    }
}

// ----------------------------------------------------------------- Monochrome

#[derive(Debug, Clone)]
pub struct MonochromeKernel {
    direction: Direction,
    curve: Curve,
    white: Xyz,
}

impl MonochromeKernel {
    fn build(profile: &IccProfile, direction: Direction) -> CmmResult<Self> {
        device_to_pcs_scale(profile.header.pcs)?;
        let curve = Curve::from_curve_data(
            profile.gray_trc().ok_or_else(|| CmmError::ProfileMissingTag("kTRC".into()))?,
        );
        let white = profile
            .media_white_point()
            .unwrap_or(crate::pipeline::pcs_adjust::PRM_WHITE);
        Ok(Self { direction, curve, white })
    }

    fn apply(&self, dst: &mut [f64], src: &[f64]) -> CmmResult<()> {
        if src.is_empty() || dst.len() < src.len() {
            return Err(CmmError::IncorrectApply("Monochrome kernel size mismatch".into()));
        }
        match self.direction {
            Direction::DeviceToPcs => {
                let y = self.curve.eval(src[0]);
                dst[0] = y * self.white.x;
                dst[1] = y * self.white.y;
                dst[2] = y * self.white.z;
            }
            Direction::PcsToDevice => {
                let y = if self.white.y.abs() > 1e-12 { src[1] / self.white.y } else { src[1] };
                dst[0] = self.curve.inverse().eval(y);
            }
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------- Lut

#[derive(Debug, Clone)]
pub struct LutKernel {
    direction: Direction,
    device_channels: usize,
    pcs_channels: usize,
    input_curves: Vec<Curve>,
    matrix: Option<MatrixEval>,
    m_curves: Vec<Curve>,
    clut: Option<Clut>,
    output_curves: Vec<Curve>,
    /// True when the matrix stage runs before the CLUT (mBA/B2A and legacy
    /// mft1/mft2 tags); false when it runs after (mAB/A2B tags). Mirrors the
    /// reference 3D-LUT applier's input-matrix flag.
    matrix_before_clut: bool,
}

impl LutKernel {
    fn build(profile: &IccProfile, intent: RenderingIntent, direction: Direction) -> CmmResult<Self> {
        let tag = match direction {
            Direction::DeviceToPcs => profile.a2b_for_intent(intent),
            Direction::PcsToDevice => profile.b2a_for_intent(intent),
        }
        .ok_or_else(|| CmmError::ProfileMissingTag("A2Bn/B2An".into()))?;

        match (direction, tag) {
            (Direction::DeviceToPcs, TagData::LutAToB(data)) => Self::from_a2b(data, direction),
            (Direction::PcsToDevice, TagData::LutBToA(data)) => Self::from_b2a(data, direction),
            (Direction::DeviceToPcs, TagData::Lut8(_) | TagData::Lut16(_)) => {
                Self::from_legacy(tag, direction)
            }
            (Direction::PcsToDevice, TagData::Lut8(_) | TagData::Lut16(_)) => {
                Self::from_legacy(tag, direction)
            }
            _ => Err(CmmError::BadLutType("tag shape doesn't match requested direction".into())),
        }
    }

    fn from_a2b(data: &LutAToBData, direction: Direction) -> CmmResult<Self> {
        Ok(Self {
            direction,
            device_channels: data.input_channels as usize,
            pcs_channels: data.output_channels as usize,
            input_curves: data.a_curves.as_deref().map(Curve::from_segments).unwrap_or_default(),
            matrix: data.matrix.as_ref().map(MatrixEval::from_lut_matrix),
            m_curves: data.m_curves.as_deref().map(Curve::from_segments).unwrap_or_default(),
            clut: data.clut.as_ref().map(Clut::from_tag),
            output_curves: data.b_curves.as_deref().map(Curve::from_segments).unwrap_or_default(),
            matrix_before_clut: false,
        })
    }

    fn from_b2a(data: &LutBToAData, direction: Direction) -> CmmResult<Self> {
        Ok(Self {
            direction,
            device_channels: data.output_channels as usize,
            pcs_channels: data.input_channels as usize,
            input_curves: data.b_curves.as_deref().map(Curve::from_segments).unwrap_or_default(),
            matrix: data.matrix.as_ref().map(MatrixEval::from_lut_matrix),
            m_curves: data.m_curves.as_deref().map(Curve::from_segments).unwrap_or_default(),
            clut: data.clut.as_ref().map(Clut::from_tag),
            output_curves: data.a_curves.as_deref().map(Curve::from_segments).unwrap_or_default(),
            matrix_before_clut: true,
        })
    }

    fn from_legacy(tag: &TagData, direction: Direction) -> CmmResult<Self> {
        // mft1/mft2 always carry input curves -> matrix -> CLUT -> output
        // curves in that fixed order; represent them through the same
        // evaluator pipeline as mAB/mBA.
        let (input_channels, output_channels, grid_points, matrix_f64, input_curves, clut, output_curves) = match tag {
            TagData::Lut8(l) => {
                let matrix = matrix3x3_from_fixed(&l.matrix);
                let input_curves: Vec<Curve> = l
                    .input_curves
                    .iter()
                    .map(|t| Curve::Table(t.iter().map(|&v| v as f64 / 255.0).collect()))
                    .collect();
                let output_curves: Vec<Curve> = l
                    .output_curves
                    .iter()
                    .map(|t| Curve::Table(t.iter().map(|&v| v as f64 / 255.0).collect()))
                    .collect();
                let data: Vec<f64> = l.clut.iter().map(|&v| v as f64 / 255.0).collect();
                let grid = vec![l.grid_points; l.input_channels as usize];
                (l.input_channels as usize, l.output_channels as usize, grid, matrix, input_curves, data, output_curves)
            }
            TagData::Lut16(l) => {
                let matrix = matrix3x3_from_fixed(&l.matrix);
                let input_curves: Vec<Curve> = l
                    .input_curves
                    .iter()
                    .map(|t| Curve::Table(t.iter().map(|&v| v as f64 / 65535.0).collect()))
                    .collect();
                let output_curves: Vec<Curve> = l
                    .output_curves
                    .iter()
                    .map(|t| Curve::Table(t.iter().map(|&v| v as f64 / 65535.0).collect()))
                    .collect();
                let data: Vec<f64> = l.clut.iter().map(|&v| v as f64 / 65535.0).collect();
                let grid = vec![l.grid_points; l.input_channels as usize];
                (l.input_channels as usize, l.output_channels as usize, grid, matrix, input_curves, data, output_curves)
            }
            _ => return Err(CmmError::BadLutType("expected mft1/mft2".into())),
        };

        let clut = Clut::new(grid_points, output_channels, clut);

        Ok(Self {
            direction,
            device_channels: if direction == Direction::DeviceToPcs { input_channels } else { output_channels },
            pcs_channels: if direction == Direction::DeviceToPcs { output_channels } else { input_channels },
            input_curves,
            matrix: Some(MatrixEval::from_matrix3x3(&matrix_f64, [0.0; 3])),
            m_curves: Vec::new(),
            clut: Some(clut),
            output_curves,
            matrix_before_clut: true,
        })
    }

    fn apply(&self, dst: &mut [f64], src: &[f64]) -> CmmResult<()> {
        let (in_n, out_n) = match self.direction {
            Direction::DeviceToPcs => (self.device_channels, self.pcs_channels),
            Direction::PcsToDevice => (self.pcs_channels, self.device_channels),
        };
        if src.len() != in_n {
            return Err(CmmError::IncorrectApply(format!("expected {in_n} input channels, got {}", src.len())));
        }

        let mut stage: Vec<f64> = src.to_vec();
        stage = apply_curves(&self.input_curves, stage);
        if self.matrix_before_clut {
            stage = apply_matrix(&self.matrix, stage);
            stage = apply_curves(&self.m_curves, stage);
            stage = apply_clut(&self.clut, stage);
        } else {
            stage = apply_clut(&self.clut, stage);
            stage = apply_curves(&self.m_curves, stage);
            stage = apply_matrix(&self.matrix, stage);
        }
        stage = apply_curves(&self.output_curves, stage);

        if stage.len() != out_n || dst.len() < out_n {
            return Err(CmmError::InvalidLut(format!(
                "LUT stage produced {} channels, expected {out_n}",
                stage.len()
            )));
        }
        dst[..out_n].copy_from_slice(&stage);
        Ok(())
    }
}

// ------------------------------------------------------------------- NamedColor

/// Which of the named-color kernel's four interface modes a call uses
/// (§4.2/§6): whether each side of the lookup is a device/PCS pixel or an
/// exact color name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColorInterface {
    PixelToPixel,
    PixelToName,
    NameToPixel,
    NameToName,
}

/// Value carried across a named-color kernel's interface boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum NamedColorIo {
    Pixel(Vec<f64>),
    Name(String),
}

#[derive(Debug, Clone)]
pub struct NamedColorKernel {
    device_channels: usize,
    table: crate::icc::tags::NamedColorData,
}

impl NamedColorKernel {
    fn build(profile: &IccProfile) -> CmmResult<Self> {
        let tag = profile.named_color_table().ok_or_else(|| CmmError::ProfileMissingTag("ncl2".into()))?;
        match tag {
            TagData::NamedColor(data) => Ok(Self {
                device_channels: data.device_channels as usize,
                table: data.clone(),
            }),
            _ => Err(CmmError::BadLutType("expected namedColor2Type".into())),
        }
    }

    /// PixelToPixel: nearest named entry's PCS, given a device pixel. This is
    /// the only mode reachable through `TransformKernel::apply`'s uniform
    /// pixel signature; the other three go through [`Self::apply_named`].
    fn apply(&self, dst: &mut [f64], src: &[f64]) -> CmmResult<()> {
        let entry = self
            .table
            .nearest_to_device(src)
            .ok_or_else(|| CmmError::ColorNotFound("named color table is empty".into()))?;
        if dst.len() < 3 {
            return Err(CmmError::IncorrectApply("named color PCS output needs 3 channels".into()));
        }
        dst[0] = entry.pcs[0];
        dst[1] = entry.pcs[1];
        dst[2] = entry.pcs[2];
        Ok(())
    }

    /// Dispatches across all four named-color interface modes. `NameToPixel`
    /// and `NameToName` raise [`CmmError::ColorNotFound`] on an exact-name
    /// miss rather than falling back to a nearest match.
    pub fn apply_named(&self, interface: NamedColorInterface, input: &NamedColorIo) -> CmmResult<NamedColorIo> {
        match (interface, input) {
            (NamedColorInterface::PixelToPixel, NamedColorIo::Pixel(device)) => {
                let entry = self
                    .table
                    .nearest_to_device(device)
                    .ok_or_else(|| CmmError::ColorNotFound("named color table is empty".into()))?;
                Ok(NamedColorIo::Pixel(entry.pcs.to_vec()))
            }
            (NamedColorInterface::PixelToName, NamedColorIo::Pixel(device)) => {
                let entry = self
                    .table
                    .nearest_to_device(device)
                    .ok_or_else(|| CmmError::ColorNotFound("named color table is empty".into()))?;
                Ok(NamedColorIo::Name(entry.name.clone()))
            }
            (NamedColorInterface::NameToPixel, NamedColorIo::Name(name)) => {
                let entry = self
                    .lookup_by_name(name)
                    .ok_or_else(|| CmmError::ColorNotFound(format!("no named color entry '{name}'")))?;
                Ok(NamedColorIo::Pixel(entry.device.clone()))
            }
            (NamedColorInterface::NameToName, NamedColorIo::Name(name)) => {
                let entry = self
                    .lookup_by_name(name)
                    .ok_or_else(|| CmmError::ColorNotFound(format!("no named color entry '{name}'")))?;
                Ok(NamedColorIo::Name(entry.name.clone()))
            }
            _ => Err(CmmError::IncorrectApply("named color interface mode doesn't match input kind".into())),
        }
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&crate::icc::tags::NamedColorEntry> {
        self.table.find(name)
    }
}

// ------------------------------------------------------------------------- MPE

#[derive(Debug, Clone)]
pub struct MpeKernel {
    direction: Direction,
    device_channels: usize,
    pipeline: MpePipeline,
}

impl MpeKernel {
    fn build(profile: &IccProfile, intent: RenderingIntent, direction: Direction) -> CmmResult<Self> {
        let tag = match direction {
            Direction::DeviceToPcs => profile.dtob_for_intent(intent),
            Direction::PcsToDevice => profile.btod_for_intent(intent),
        }
        .ok_or_else(|| CmmError::ProfileMissingTag("DToBn/BToDn".into()))?;

        let mpe = match tag {
            TagData::MultiProcessElement(data) => data,
            _ => return Err(CmmError::BadLutType("expected mpet".into())),
        };
        let pipeline = MpePipeline::build(mpe)?;
        let device_channels = match direction {
            Direction::DeviceToPcs => mpe.input_channels as usize,
            Direction::PcsToDevice => mpe.output_channels as usize,
        };
        Ok(Self { direction, device_channels, pipeline })
    }

    fn apply(&self, dst: &mut [f64], src: &[f64]) -> CmmResult<()> {
        let out = self.pipeline.apply(src)?;
        if dst.len() < out.len() {
            return Err(CmmError::AllocErr("destination buffer too small for MPE output".into()));
        }
        dst[..out.len()].copy_from_slice(&out);
        Ok(())
    }
}

