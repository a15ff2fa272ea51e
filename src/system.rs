//! Non-pair event sources and ensemble tags.
//!
//! System processes own FEL slots after the particle slots. Their events
//! carry no particle tokens and are always fresh; the thermostat is the
//! only one that reschedules itself.

use crate::core::event::{Event, EventKind};
use crate::core::particle::Particle;
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Exp, StandardNormal};

/// Thermodynamic ensemble label, cross-checked against the configured
/// systems and dynamics at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensemble {
    Nve,
    Nvt,
    NvShear,
    NeCompression,
    NtCompression,
}

impl Ensemble {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ensemble::Nve => "NVE",
            Ensemble::Nvt => "NVT",
            Ensemble::NvShear => "NVShear",
            Ensemble::NeCompression => "NECompression",
            Ensemble::NtCompression => "NTCompression",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "NVE" => Ok(Ensemble::Nve),
            "NVT" => Ok(Ensemble::Nvt),
            "NVShear" => Ok(Ensemble::NvShear),
            "NECompression" => Ok(Ensemble::NeCompression),
            "NTCompression" => Ok(Ensemble::NtCompression),
            other => Err(Error::Config(format!("unknown ensemble type \"{other}\""))),
        }
    }
}

/// Andersen thermostat: Poisson-timed firings at rate `nu * N`, each
/// resampling one uniformly chosen particle from Maxwell-Boltzmann.
#[derive(Debug, Clone, Copy)]
pub struct Andersen {
    pub rate: f64,
    pub temperature: f64,
}

impl Andersen {
    pub fn new(rate: f64, temperature: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::Config(format!(
                "thermostat rate must be finite and > 0, got {rate}"
            )));
        }
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(Error::Config(format!(
                "thermostat temperature must be finite and > 0, got {temperature}"
            )));
        }
        Ok(Self { rate, temperature })
    }

    /// Draw the next firing time after `now`.
    pub fn next_firing(&self, now: f64, n_particles: usize, rng: &mut StdRng) -> f64 {
        let total_rate = self.rate * n_particles as f64;
        // Exp::new only fails on a non-positive rate, excluded above.
        let gap = Exp::new(total_rate)
            .map(|d| d.sample(rng))
            .unwrap_or(f64::INFINITY);
        now + gap
    }

    /// Replace a particle's velocity with a Maxwell-Boltzmann draw.
    pub fn resample(&self, p: &mut Particle, rng: &mut StdRng) {
        let scale = (self.temperature / p.mass).sqrt();
        for k in 0..3 {
            let g: f64 = StandardNormal.sample(rng);
            p.v[k] = g * scale;
        }
    }

    /// Uniformly pick the particle to strike.
    pub fn pick(&self, n_particles: usize, rng: &mut StdRng) -> u32 {
        rng.random_range(0..n_particles as u32)
    }
}

/// The configured non-pair event sources.
#[derive(Debug, Clone, Copy)]
pub enum SystemProcess {
    Andersen(Andersen),
    /// Sentinel terminating the run at `t_end`.
    Halt { t_end: f64 },
    /// One-shot capture-state rebuild (scheduled by overlap squashing).
    Rebuild { at: f64 },
}

impl SystemProcess {
    /// The process's first scheduled event.
    pub fn initial_event(
        &self,
        now: f64,
        n_particles: usize,
        rng: &mut StdRng,
    ) -> Result<Event> {
        match *self {
            SystemProcess::Andersen(a) => Event::new(
                a.next_firing(now, n_particles, rng),
                EventKind::Thermostat,
                0,
                None,
            ),
            SystemProcess::Halt { t_end } => Event::new(t_end, EventKind::Halt, 0, None),
            SystemProcess::Rebuild { at } => Event::new(at, EventKind::Rebuild, 0, None),
        }
    }
}
