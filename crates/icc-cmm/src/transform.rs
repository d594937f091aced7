//! Byte-buffer convenience layer over [`crate::pipeline::CmmPipeline`]:
//! picks an interleaved pixel [`Layout`], encodes/decodes 8-/16-bit
//! samples to the pipeline's internal float domain, and hides the apply
//! context behind an internally-mutable, single-threaded handle.

use std::cell::RefCell;

use crate::icc::header::RenderingIntent as IccRenderingIntent;
use crate::numeric::{ic_f_to_u16, ic_f_to_u8, ic_u16_to_f, ic_u8_to_f};
use crate::pipeline::kernel::Direction;
use crate::pipeline::{ApplyContext, ApplyOptions, CmmPipeline};
use crate::profile::ColorProfile;
use crate::{Error, Result};

/// Rendering intent for color transformations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderingIntent {
    #[default]
    Perceptual,
    RelativeColorimetric,
    Saturation,
    AbsoluteColorimetric,
}

impl From<RenderingIntent> for IccRenderingIntent {
    fn from(intent: RenderingIntent) -> Self {
        match intent {
            RenderingIntent::Perceptual => IccRenderingIntent::Perceptual,
            RenderingIntent::RelativeColorimetric => IccRenderingIntent::RelativeColorimetric,
            RenderingIntent::Saturation => IccRenderingIntent::Saturation,
            RenderingIntent::AbsoluteColorimetric => IccRenderingIntent::AbsoluteColorimetric,
        }
    }
}

/// Pixel layout for transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Rgb8,
    Rgba8,
    Rgb16,
    Rgba16,
    Cmyk8,
    Gray8,
}

impl Layout {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Layout::Rgb8 => 3,
            Layout::Rgba8 => 4,
            Layout::Rgb16 => 6,
            Layout::Rgba16 => 8,
            Layout::Cmyk8 => 4,
            Layout::Gray8 => 1,
        }
    }

    /// Color channels carried by this layout, excluding any alpha.
    fn channels(&self) -> usize {
        match self {
            Layout::Rgb8 | Layout::Rgb16 | Layout::Rgba8 | Layout::Rgba16 => 3,
            Layout::Cmyk8 => 4,
            Layout::Gray8 => 1,
        }
    }

    fn has_alpha(&self) -> bool {
        matches!(self, Layout::Rgba8 | Layout::Rgba16)
    }

    fn is_16_bit(&self) -> bool {
        matches!(self, Layout::Rgb16 | Layout::Rgba16)
    }
}

/// Options for transform creation
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOptions {
    pub intent: RenderingIntent,
    pub black_point_compensation: bool,
}

/// A byte-buffer color transform between two profiles, built from a
/// sealed two-kernel [`CmmPipeline`] (source device -> PCS -> destination
/// device).
pub struct Transform {
    pipeline: CmmPipeline,
    ctx: RefCell<ApplyContext>,
    src_layout: Layout,
    dst_layout: Layout,
}

impl Transform {
    pub fn new(
        src_profile: &ColorProfile,
        src_layout: Layout,
        dst_profile: &ColorProfile,
        dst_layout: Layout,
        options: TransformOptions,
    ) -> Result<Self> {
        let intent: IccRenderingIntent = options.intent.into();
        let mut pipeline = CmmPipeline::new();
        pipeline.add_xform(src_profile.inner(), Some(intent), Direction::DeviceToPcs)?;
        pipeline.add_xform(dst_profile.inner(), Some(intent), Direction::PcsToDevice)?;
        pipeline.begin(false)?;

        let apply_options = ApplyOptions {
            black_point_compensation: options.black_point_compensation,
            ..ApplyOptions::default()
        };
        let ctx = RefCell::new(pipeline.new_apply(apply_options));

        Ok(Self { pipeline, ctx, src_layout, dst_layout })
    }

    /// Transform pixel data from source to destination.
    pub fn transform(&self, src: &[u8], dst: &mut [u8]) -> Result<()> {
        let src_bpp = self.src_layout.bytes_per_pixel();
        let dst_bpp = self.dst_layout.bytes_per_pixel();
        if src.len() % src_bpp != 0 {
            return Err(Error::BufferSize { expected: src_bpp, actual: src.len() % src_bpp });
        }
        let pixel_count = src.len() / src_bpp;
        if dst.len() < pixel_count * dst_bpp {
            return Err(Error::BufferSize { expected: pixel_count * dst_bpp, actual: dst.len() });
        }

        let mut ctx = self.ctx.borrow_mut();
        let mut in_buf = vec![0.0; self.src_layout.channels()];
        let mut out_buf = vec![0.0; self.dst_layout.channels()];

        for i in 0..pixel_count {
            let src_pixel = &src[i * src_bpp..(i + 1) * src_bpp];
            decode_pixel(self.src_layout, src_pixel, &mut in_buf);

            self.pipeline
                .apply(&mut ctx, &mut out_buf, &in_buf)
                .map_err(Error::Transform)?;

            let dst_pixel = &mut dst[i * dst_bpp..(i + 1) * dst_bpp];
            encode_pixel(self.dst_layout, &out_buf, dst_pixel);
            if self.dst_layout.has_alpha()
                && self.src_layout.has_alpha()
                && self.dst_layout.is_16_bit() == self.src_layout.is_16_bit()
            {
                let alpha_width = if self.src_layout.is_16_bit() { 2 } else { 1 };
                let alpha_src = &src_pixel[src_pixel.len() - alpha_width..];
                let alpha_dst_start = dst_pixel.len() - alpha_width;
                dst_pixel[alpha_dst_start..].copy_from_slice(alpha_src);
            }
        }
        Ok(())
    }
}

fn decode_pixel(layout: Layout, src: &[u8], out: &mut [f64]) {
    if layout.is_16_bit() {
        for (i, chunk) in src.chunks_exact(2).take(layout.channels()).enumerate() {
            out[i] = ic_u16_to_f(u16::from_be_bytes([chunk[0], chunk[1]]));
        }
    } else {
        for (i, &b) in src.iter().take(layout.channels()).enumerate() {
            out[i] = ic_u8_to_f(b);
        }
    }
}

fn encode_pixel(layout: Layout, values: &[f64], dst: &mut [u8]) {
    if layout.is_16_bit() {
        for (i, v) in values.iter().take(layout.channels()).enumerate() {
            dst[i * 2..i * 2 + 2].copy_from_slice(&ic_f_to_u16(*v).to_be_bytes());
        }
    } else {
        for (i, v) in values.iter().take(layout.channels()).enumerate() {
            dst[i] = ic_f_to_u8(*v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_bytes_per_pixel() {
        assert_eq!(Layout::Rgb8.bytes_per_pixel(), 3);
        assert_eq!(Layout::Rgba8.bytes_per_pixel(), 4);
        assert_eq!(Layout::Cmyk8.bytes_per_pixel(), 4);
    }
}
