//! Stepwise potential tables.
//!
//! A stepped potential is an ordered, strictly descending sequence of
//! discontinuity radii `r_0 > r_1 > ...` with a constant energy on each
//! region between them. Region `k` lies inside radius `r_k`; outside `r_0`
//! the energy is zero. Crossing radius `k` inward therefore costs
//! `E_k - E_{k-1}` (with `E_{-1} = 0`), of either sign.

mod lennard_jones;

pub use lennard_jones::{LennardJones, RMode, UMode};

use crate::error::{Error, Result};

/// A pair potential expressed as capture shells.
#[derive(Debug, Clone)]
pub enum Potential {
    /// Explicit step table.
    Stepped(Stepped),
    /// Lennard-Jones, discretised lazily on demand.
    LennardJones(LennardJones),
}

impl Potential {
    /// Number of crossable discontinuity radii. Energy-spaced
    /// discretisations are unbounded and report `usize::MAX`.
    pub fn steps(&self) -> usize {
        match self {
            Potential::Stepped(s) => s.radii.len(),
            Potential::LennardJones(lj) => lj.steps(),
        }
    }

    /// Radius of discontinuity `k` (`k < steps()`), extending lazy tables
    /// as needed.
    pub fn step_radius(&self, k: usize) -> f64 {
        match self {
            Potential::Stepped(s) => s.radii[k],
            Potential::LennardJones(lj) => lj.step_radius(k),
        }
    }

    /// Energy of region `k`, the shell just inside radius `k`.
    pub fn region_energy(&self, k: usize) -> f64 {
        match self {
            Potential::Stepped(s) => s.energies[k],
            Potential::LennardJones(lj) => lj.region_energy(k),
        }
    }

    /// Energy jump crossing radius `k` inward.
    pub fn delta_energy_in(&self, k: usize) -> f64 {
        let outer = if k == 0 {
            0.0
        } else {
            self.region_energy(k - 1)
        };
        self.region_energy(k) - outer
    }

    /// Outermost radius; no event can occur beyond it.
    pub fn max_radius(&self) -> f64 {
        self.step_radius(0)
    }

    /// Impenetrable inner boundary left by a truncated discretisation.
    pub fn core_radius(&self) -> Option<f64> {
        match self {
            Potential::Stepped(s) => s.core,
            Potential::LennardJones(lj) => lj.core_radius(),
        }
    }

    /// Region index for a pair at separation `dist`, from geometry alone.
    /// `None` means outside the outermost shell.
    pub fn region_of(&self, dist: f64) -> Option<u32> {
        if dist >= self.max_radius() {
            return None;
        }
        let steps = self.steps();
        let mut k = 0usize;
        while k + 1 < steps && self.step_radius(k + 1) > dist {
            k += 1;
        }
        Some(k as u32)
    }
}

/// An explicit step table, as parsed from `<Step R=".." E=".."/>` children.
#[derive(Debug, Clone)]
pub struct Stepped {
    radii: Vec<f64>,
    energies: Vec<f64>,
    core: Option<f64>,
}

impl Stepped {
    /// Build from `(radius, region energy)` pairs in any order; entries are
    /// sorted by descending radius. An optional `core` makes the innermost
    /// boundary impenetrable.
    pub fn new(mut steps: Vec<(f64, f64)>, core: Option<f64>) -> Result<Self> {
        if steps.is_empty() {
            return Err(Error::Config("stepped potential has no steps".into()));
        }
        steps.sort_by(|a, b| b.0.total_cmp(&a.0));
        for w in steps.windows(2) {
            if w[0].0 <= w[1].0 {
                return Err(Error::Config(format!(
                    "stepped potential radii must be strictly decreasing, got {} then {}",
                    w[0].0, w[1].0
                )));
            }
        }
        let innermost = steps[steps.len() - 1].0;
        if innermost <= 0.0 {
            return Err(Error::Config(format!(
                "stepped potential radii must be positive, got {innermost}"
            )));
        }
        if let Some(c) = core {
            if c <= 0.0 || c >= innermost {
                return Err(Error::Config(format!(
                    "core radius {c} must lie inside the innermost step {innermost}"
                )));
            }
        }
        let (radii, energies) = steps.into_iter().unzip();
        Ok(Self {
            radii,
            energies,
            core,
        })
    }

    /// `(radius, cumulative energy)` view, outermost first.
    pub fn entries(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.radii.iter().copied().zip(self.energies.iter().copied())
    }

    pub fn core(&self) -> Option<f64> {
        self.core
    }
}
