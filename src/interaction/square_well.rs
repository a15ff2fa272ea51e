use super::ShellGeometry;
use crate::error::{Error, Result};

/// Hard core of one diameter with a single attractive shell at
/// `lambda * diameter`, depth `well_depth`.
#[derive(Debug, Clone, Copy)]
pub struct SquareWell {
    diameter: f64,
    lambda: f64,
    well_depth: f64,
}

impl SquareWell {
    pub fn new(diameter: f64, lambda: f64, well_depth: f64) -> Result<Self> {
        if !diameter.is_finite() || diameter <= 0.0 {
            return Err(Error::Config(format!(
                "square-well diameter must be finite and > 0, got {diameter}"
            )));
        }
        if !lambda.is_finite() || lambda <= 1.0 {
            return Err(Error::Config(format!(
                "square-well lambda must exceed 1, got {lambda}"
            )));
        }
        if !well_depth.is_finite() {
            return Err(Error::Config("square-well depth must be finite".into()));
        }
        Ok(Self {
            diameter,
            lambda,
            well_depth,
        })
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn well_depth(&self) -> f64 {
        self.well_depth
    }
}

impl ShellGeometry for SquareWell {
    fn shells(&self) -> usize {
        1
    }

    fn shell_radius(&self, _k: usize) -> f64 {
        self.lambda * self.diameter
    }

    /// A negative depth parameterises a repulsive shoulder.
    fn shell_energy(&self, _k: usize) -> f64 {
        -self.well_depth
    }

    fn core(&self) -> Option<f64> {
        Some(self.diameter)
    }
}
