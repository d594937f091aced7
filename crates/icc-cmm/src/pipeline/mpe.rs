//! Multi-process element pipeline (§4.4): executes the element chain
//! parsed from a DToBn/BToDn tag (see [`crate::icc::tags::mpe`] for the
//! parser) against a double-buffered scratch sized to the widest element.

use crate::icc::tags::{MpeElement, MpeTagData};
use crate::pipeline::clut::Clut;
use crate::pipeline::curve::Curve;
use crate::pipeline::error::{CmmError, CmmResult};
use crate::pipeline::matrix_eval::MatrixEval;

#[derive(Debug, Clone)]
enum Stage {
    Curves(Vec<Curve>),
    Matrix(MatrixEval),
    Clut(Clut),
    /// Begin/end ACS markers bracket an "absolute colorimetric space"
    /// sub-chain this pipeline treats as a passthrough.
    Acs,
}

#[derive(Debug, Clone)]
pub struct MpePipeline {
    input_channels: usize,
    output_channels: usize,
    stages: Vec<Stage>,
}

impl MpePipeline {
    pub fn build(tag: &MpeTagData) -> CmmResult<Self> {
        let mut stages = Vec::with_capacity(tag.elements.len());
        let mut running = tag.input_channels;
        for element in &tag.elements {
            let stage = match element {
                MpeElement::Curves(segments) => Stage::Curves(Curve::from_segments(segments)),
                MpeElement::Matrix { input_channels, output_channels, matrix, offset } => {
                    if *input_channels as usize != running as usize {
                        return Err(CmmError::BadSpaceLink(format!(
                            "MPE matrix element expects {input_channels} inputs, chain carries {running}"
                        )));
                    }
                    Stage::Matrix(MatrixEval::new(
                        *input_channels as usize,
                        *output_channels as usize,
                        matrix.clone(),
                        offset.clone(),
                    ))
                }
                MpeElement::Clut { grid_points, output_channels, data } => {
                    if grid_points.len() != running as usize {
                        return Err(CmmError::BadSpaceLink(format!(
                            "MPE CLUT element expects {} inputs, chain carries {running}",
                            grid_points.len()
                        )));
                    }
                    Stage::Clut(Clut::new(grid_points.clone(), *output_channels as usize, data.clone()))
                }
                MpeElement::Acs { .. } => Stage::Acs,
            };
            running = element.output_channels(running);
            stages.push(stage);
        }

        if running != tag.output_channels {
            return Err(CmmError::InvalidLut(format!(
                "MPE chain ends with {running} channels, tag declares {}",
                tag.output_channels
            )));
        }

        Ok(Self {
            input_channels: tag.input_channels as usize,
            output_channels: tag.output_channels as usize,
            stages,
        })
    }

    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    pub fn apply(&self, input: &[f64]) -> CmmResult<Vec<f64>> {
        if input.len() != self.input_channels {
            return Err(CmmError::IncorrectApply(format!(
                "MPE pipeline expects {} inputs, got {}",
                self.input_channels,
                input.len()
            )));
        }

        let mut front = input.to_vec();
        let mut back = Vec::new();
        for stage in &self.stages {
            back = match stage {
                Stage::Curves(curves) => front
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| curves.get(i).map(|c| c.eval(v)).unwrap_or(v))
                    .collect(),
                Stage::Matrix(m) => m.apply(&front),
                Stage::Clut(c) => c.interpolate(&front),
                Stage::Acs => front.clone(),
            };
            std::mem::swap(&mut front, &mut back);
        }

        if front.len() != self.output_channels {
            return Err(CmmError::InvalidLut(format!(
                "MPE pipeline produced {} channels, expected {}",
                front.len(),
                self.output_channels
            )));
        }
        Ok(front)
    }
}
