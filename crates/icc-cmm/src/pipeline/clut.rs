//! CLUT interpolator (§4.2): evaluates a multidimensional lookup table
//! parsed from an mAB/mBA/mft1/mft2 tag, picking tetrahedral interpolation
//! for the common 3-input case and the generalized n-linear scheme
//! (§4.4's rationale applies equally here) otherwise.

use crate::icc::tags::LutClut;
use crate::math::interpolation::{nlinear_interp, tetrahedral_interp};

#[derive(Debug, Clone)]
pub struct Clut {
    grid_points: Vec<u8>,
    output_channels: usize,
    data: Vec<f64>,
}

impl Clut {
    pub fn from_tag(clut: &LutClut) -> Self {
        Self {
            grid_points: clut.grid_points.clone(),
            output_channels: clut.output_channels as usize,
            data: clut.data.clone(),
        }
    }

    pub fn new(grid_points: Vec<u8>, output_channels: usize, data: Vec<f64>) -> Self {
        Self { grid_points, output_channels, data }
    }

    pub fn input_dims(&self) -> usize {
        self.grid_points.len()
    }

    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    /// Interpolate at `input`, clamped to the unit hypercube. `input.len()`
    /// must equal [`Clut::input_dims`].
    pub fn interpolate(&self, input: &[f64]) -> Vec<f64> {
        debug_assert_eq!(input.len(), self.grid_points.len());
        if self.grid_points.len() == 3 && self.grid_points.iter().all(|&g| g == self.grid_points[0]) {
            let grid_size = self.grid_points[0] as usize;
            if self.output_channels == 3 {
                let point = [input[0], input[1], input[2]];
                return tetrahedral_interp(&self.data, grid_size, point).to_vec();
            }
        }
        nlinear_interp(&self.data, &self.grid_points, self.output_channels, input)
    }
}
