//! Matrix evaluator (§4.2): applies an input_channels×output_channels
//! matrix plus a per-output offset. Backs both the fixed 3×3 MatrixTRC
//! matrix and the arbitrarily-sized matrix element MPE pipelines carry.

use crate::icc::tags::LutMatrix;
use crate::math::Matrix3x3;

#[derive(Debug, Clone)]
pub struct MatrixEval {
    input_channels: usize,
    output_channels: usize,
    matrix: Vec<f64>,
    offset: Vec<f64>,
}

impl MatrixEval {
    pub fn new(input_channels: usize, output_channels: usize, matrix: Vec<f64>, offset: Vec<f64>) -> Self {
        debug_assert_eq!(matrix.len(), input_channels * output_channels);
        debug_assert_eq!(offset.len(), output_channels);
        Self {
            input_channels,
            output_channels,
            matrix,
            offset,
        }
    }

    pub fn from_lut_matrix(m: &LutMatrix) -> Self {
        let mut flat = Vec::with_capacity(9);
        for row in &m.matrix {
            flat.extend_from_slice(row);
        }
        Self::new(3, 3, flat, m.offset.to_vec())
    }

    pub fn from_matrix3x3(m: &Matrix3x3, offset: [f64; 3]) -> Self {
        let flat = vec![
            m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
        ];
        Self::new(3, 3, flat, offset.to_vec())
    }

    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        debug_assert_eq!(input.len(), self.input_channels);
        let mut out = self.offset.clone();
        for o in 0..self.output_channels {
            let row = &self.matrix[o * self.input_channels..(o + 1) * self.input_channels];
            out[o] += row.iter().zip(input.iter()).map(|(m, x)| m * x).sum::<f64>();
        }
        out
    }

    pub fn apply3(&self, input: [f64; 3]) -> [f64; 3] {
        debug_assert_eq!((self.input_channels, self.output_channels), (3, 3));
        let out = self.apply(&input);
        [out[0], out[1], out[2]]
    }

    pub fn is_identity(&self, epsilon: f64) -> bool {
        if self.input_channels != self.output_channels {
            return false;
        }
        if self.offset.iter().any(|&v| v.abs() > epsilon) {
            return false;
        }
        for r in 0..self.output_channels {
            for c in 0..self.input_channels {
                let expected = if r == c { 1.0 } else { 0.0 };
                if (self.matrix[r * self.input_channels + c] - expected).abs() > epsilon {
                    return false;
                }
            }
        }
        true
    }
}
