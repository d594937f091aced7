//! Multi-process element tag type (mpet)
//!
//! Backs the V4 `DToBn`/`BToDn` tags: an ordered pipeline of curve-set,
//! matrix, CLUT and alternate-connection-space elements chained by channel
//! count. See ICC.1:2022 Section 10.14 for the on-disk layout this mirrors;
//! element offsets here are taken relative to the start of the tag's type
//! data (after the 8-byte type-signature/reserved header), not the start of
//! the tag table entry.

use super::lut::{CurveSegment, parse_curve_set};
use crate::icc::error::IccError;

/// One stage of a multi-process element pipeline
#[derive(Debug, Clone)]
pub enum MpeElement {
    /// A curve per channel (input_channels == output_channels)
    Curves(Vec<CurveSegment>),
    /// A generic (not-necessarily-square) matrix plus per-output offset
    Matrix {
        input_channels: u16,
        output_channels: u16,
        matrix: Vec<f64>, // row-major, output_channels x input_channels
        offset: Vec<f64>, // output_channels
    },
    /// An n-dimensional CLUT
    Clut {
        grid_points: Vec<u8>,
        output_channels: u8,
        data: Vec<f64>,
    },
    /// Alternate connection space marker; channel-count-preserving passthrough
    Acs { begin: bool },
}

impl MpeElement {
    pub fn input_channels(&self, fallback: u16) -> u16 {
        match self {
            MpeElement::Curves(c) => c.len() as u16,
            MpeElement::Matrix { input_channels, .. } => *input_channels,
            MpeElement::Clut { grid_points, .. } => grid_points.len() as u16,
            MpeElement::Acs { .. } => fallback,
        }
    }

    pub fn output_channels(&self, fallback: u16) -> u16 {
        match self {
            MpeElement::Curves(c) => c.len() as u16,
            MpeElement::Matrix {
                output_channels, ..
            } => *output_channels,
            MpeElement::Clut {
                output_channels, ..
            } => *output_channels as u16,
            MpeElement::Acs { .. } => fallback,
        }
    }
}

/// Parsed `mpet` tag data: an ordered element chain plus declared channel counts
#[derive(Debug, Clone)]
pub struct MpeTagData {
    pub input_channels: u16,
    pub output_channels: u16,
    pub elements: Vec<MpeElement>,
}

impl MpeTagData {
    pub fn parse(data: &[u8]) -> Result<Self, IccError> {
        if data.len() < 8 {
            return Err(IccError::CorruptedData("mpet header too small".into()));
        }
        let input_channels = u16::from_be_bytes([data[0], data[1]]);
        let output_channels = u16::from_be_bytes([data[2], data[3]]);
        let num_elements = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;

        let pos_table_offset = 8;
        let mut positions = Vec::with_capacity(num_elements);
        for i in 0..num_elements {
            let off = pos_table_offset + i * 8;
            if off + 8 > data.len() {
                return Err(IccError::CorruptedData(
                    "mpet position table truncated".into(),
                ));
            }
            let elem_offset =
                u32::from_be_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
                    as usize;
            let elem_size = u32::from_be_bytes([
                data[off + 4],
                data[off + 5],
                data[off + 6],
                data[off + 7],
            ]) as usize;
            positions.push((elem_offset, elem_size));
        }

        let mut elements = Vec::with_capacity(num_elements);
        let mut running_channels = input_channels;
        for (offset, size) in positions {
            if offset + size > data.len() || offset + 8 > data.len() {
                return Err(IccError::CorruptedData("mpet element out of bounds".into()));
            }
            let elem_data = &data[offset..offset + size];
            let sig = &elem_data[0..4];
            let body = &elem_data[8..];
            let element = match sig {
                b"cvst" => parse_curve_element(body)?,
                b"matf" => parse_matrix_element(body, running_channels)?,
                b"clut" => parse_clut_element(body, running_channels)?,
                b"bACS" => MpeElement::Acs { begin: true },
                b"eACS" => MpeElement::Acs { begin: false },
                other => {
                    return Err(IccError::Unsupported(format!(
                        "unsupported MPE element signature {:?}",
                        String::from_utf8_lossy(other)
                    )));
                }
            };
            running_channels = element.output_channels(running_channels);
            elements.push(element);
        }

        Ok(Self {
            input_channels,
            output_channels,
            elements,
        })
    }
}

fn parse_curve_element(data: &[u8]) -> Result<MpeElement, IccError> {
    if data.len() < 2 {
        return Err(IccError::CorruptedData("cvst header too small".into()));
    }
    let num_curves = u16::from_be_bytes([data[0], data[1]]) as usize;
    let curves = parse_curve_set(data, 2, num_curves)?;
    Ok(MpeElement::Curves(curves))
}

fn parse_matrix_element(data: &[u8], running_channels: u16) -> Result<MpeElement, IccError> {
    // matf body has no explicit channel counts; it is square with the
    // in-flight channel count, matching the chain-verification rule in §4.4.
    let input_channels = running_channels;
    let output_channels = running_channels;
    let n_in = input_channels as usize;
    let n_out = output_channels as usize;
    let required = (n_in * n_out + n_out) * 4;
    if data.len() < required {
        return Err(IccError::CorruptedData("matf data truncated".into()));
    }
    let mut matrix = Vec::with_capacity(n_in * n_out);
    let mut pos = 0;
    for _ in 0..(n_in * n_out) {
        let raw = i32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
        matrix.push(raw as f64 / 65536.0);
        pos += 4;
    }
    let mut offset = Vec::with_capacity(n_out);
    for _ in 0..n_out {
        let raw = i32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
        offset.push(raw as f64 / 65536.0);
        pos += 4;
    }
    Ok(MpeElement::Matrix {
        input_channels,
        output_channels,
        matrix,
        offset,
    })
}

fn parse_clut_element(data: &[u8], running_channels: u16) -> Result<MpeElement, IccError> {
    if data.len() < 20 {
        return Err(IccError::CorruptedData("clut element too small".into()));
    }
    let input_channels = running_channels as usize;
    let mut grid_points = Vec::with_capacity(input_channels);
    for i in 0..input_channels {
        grid_points.push(data[i]);
    }
    // Byte 16: precision marker for this element (8 or 16 here means f32 per
    // the real mpet spec; this scaffold stores everything pre-normalized as
    // f32 doubles, matching LutClut's own normalized-float convention).
    let output_channels = data[17];
    let mut total = 1usize;
    for &g in &grid_points {
        total *= g as usize;
    }
    total *= output_channels as usize;

    let data_offset = 20;
    let required = total * 4;
    if data.len() < data_offset + required {
        return Err(IccError::CorruptedData("clut element data truncated".into()));
    }
    let mut values = Vec::with_capacity(total);
    for i in 0..total {
        let off = data_offset + i * 4;
        let bits = u32::from_be_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]]);
        values.push(f32::from_bits(bits) as f64);
    }

    Ok(MpeElement::Clut {
        grid_points,
        output_channels,
        data: values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_s15fixed16(v: f64) -> [u8; 4] {
        ((v * 65536.0) as i32).to_be_bytes()
    }

    #[test]
    fn parse_identity_matrix_element() {
        // 2x2 identity matrix, zero offset
        let mut body = Vec::new();
        for v in [1.0, 0.0, 0.0, 1.0, 0.0, 0.0] {
            body.extend_from_slice(&encode_s15fixed16(v));
        }
        let elem = parse_matrix_element(&body, 2).unwrap();
        match elem {
            MpeElement::Matrix {
                input_channels,
                output_channels,
                matrix,
                offset,
            } => {
                assert_eq!(input_channels, 2);
                assert_eq!(output_channels, 2);
                assert_eq!(matrix, vec![1.0, 0.0, 0.0, 1.0]);
                assert_eq!(offset, vec![0.0, 0.0]);
            }
            _ => panic!("expected matrix element"),
        }
    }

    #[test]
    fn mpet_header_parses_channel_counts() {
        let mut data = vec![0u8; 8];
        data[0..2].copy_from_slice(&3u16.to_be_bytes());
        data[2..4].copy_from_slice(&3u16.to_be_bytes());
        data[4..8].copy_from_slice(&0u32.to_be_bytes());
        let mpe = MpeTagData::parse(&data).unwrap();
        assert_eq!(mpe.input_channels, 3);
        assert_eq!(mpe.output_channels, 3);
        assert!(mpe.elements.is_empty());
    }
}
