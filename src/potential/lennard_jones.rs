//! Lazily discretised Lennard-Jones potential.
//!
//! The continuous `U(r) = 4 eps ((sigma/r)^12 - (sigma/r)^6)`, truncated and
//! shifted at the cutoff, is approximated by capture shells. Shell radii
//! follow one of two stepping rules and shell energies one of five
//! assignment rules; both caches are append-only and extended on demand, so
//! a hot predict path only ever reads already-computed entries.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::f64::consts::PI;

/// Radial stepping rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RMode {
    /// Uniform radial spacing over the attractive range.
    DeltaR,
    /// Uniform energy spacing; radii recovered by bisection.
    DeltaU,
}

/// Energy assignment rule for a shell `[r_{k+1}, r_k]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UMode {
    Midpoint,
    Left,
    Right,
    /// Analytic volume average over the spherical shell.
    Volume,
    /// Match the shell's contribution to the second virial coefficient at
    /// the configured temperature.
    Virial,
}

const VIRIAL_INTERVALS: usize = 100_000;
const BISECT_MAX_ITER: usize = 1000;

#[derive(Debug, Clone, Default)]
struct ShellCache {
    /// Discontinuity radii; always one entry ahead of `energies` so a
    /// shell's bounds are known before its energy is assigned.
    radii: Vec<f64>,
    /// Region energies, index-aligned with the outer radius.
    energies: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct LennardJones {
    sigma: f64,
    epsilon: f64,
    cutoff: f64,
    attractive_steps: f64,
    u_mode: UMode,
    r_mode: RMode,
    /// Temperature used by the virial assignment rule.
    kt: f64,
    cache: RefCell<ShellCache>,
}

impl LennardJones {
    pub fn new(
        sigma: f64,
        epsilon: f64,
        cutoff: f64,
        attractive_steps: f64,
        u_mode: UMode,
        r_mode: RMode,
        kt: f64,
    ) -> Result<Self> {
        if sigma <= 0.0 || epsilon <= 0.0 {
            return Err(Error::Config(
                "Lennard-Jones sigma and epsilon must be positive".into(),
            ));
        }
        if attractive_steps <= 0.0 {
            return Err(Error::Config(
                "Lennard-Jones needs a positive number of attractive steps".into(),
            ));
        }
        if u_mode == UMode::Virial && kt <= 0.0 {
            return Err(Error::Config(
                "the virial energy rule needs a positive temperature".into(),
            ));
        }
        let lj = Self {
            sigma,
            epsilon,
            cutoff,
            attractive_steps,
            u_mode,
            r_mode,
            kt,
            cache: RefCell::new(ShellCache::default()),
        };
        if cutoff <= lj.minimum() {
            return Err(Error::Config(format!(
                "the cutoff ({cutoff}) cannot be at or before the minimum ({}) of the \
                 Lennard-Jones potential with these stepping parameters",
                lj.minimum()
            )));
        }
        if r_mode == RMode::DeltaR && lj.cutoff / lj.delta_r() < 1.0 {
            return Err(Error::Config(
                "radial stepping produces no steps; increase AttractiveSteps".into(),
            ));
        }
        lj.cache.borrow_mut().radii.push(cutoff);
        Ok(lj)
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn attractive_steps(&self) -> f64 {
        self.attractive_steps
    }

    pub fn u_mode(&self) -> UMode {
        self.u_mode
    }

    pub fn r_mode(&self) -> RMode {
        self.r_mode
    }

    pub fn temperature(&self) -> f64 {
        self.kt
    }

    fn u_uncut(&self, r: f64) -> f64 {
        let s6 = (self.sigma / r).powi(6);
        4.0 * self.epsilon * (s6 * s6 - s6)
    }

    /// Truncated-and-shifted potential.
    pub fn u(&self, r: f64) -> f64 {
        self.u_uncut(r) - self.u_uncut(self.cutoff)
    }

    /// Location of the potential minimum, `2^(1/6) sigma`.
    pub fn minimum(&self) -> f64 {
        self.sigma * 2.0_f64.powf(1.0 / 6.0)
    }

    fn delta_r(&self) -> f64 {
        (self.cutoff - self.minimum()) / self.attractive_steps
    }

    /// Number of crossable discontinuity radii.
    pub fn steps(&self) -> usize {
        match self.r_mode {
            RMode::DeltaR => {
                let steps = self.cutoff / self.delta_r();
                // A step landing exactly on r = 0 is not a discontinuity.
                let n = steps as usize;
                n - usize::from(n as f64 == steps)
            }
            RMode::DeltaU => usize::MAX,
        }
    }

    /// Hard core left by a truncated radial stepping.
    pub fn core_radius(&self) -> Option<f64> {
        match self.r_mode {
            RMode::DeltaR => {
                let inner = self.cutoff - self.steps() as f64 * self.delta_r();
                (inner > 1e-12 * self.cutoff).then_some(inner)
            }
            RMode::DeltaU => None,
        }
    }

    pub fn step_radius(&self, k: usize) -> f64 {
        self.extend_to(k);
        self.cache.borrow().radii[k]
    }

    pub fn region_energy(&self, k: usize) -> f64 {
        self.extend_to(k);
        self.cache.borrow().energies[k]
    }

    fn b2_integrand(&self, r: f64) -> f64 {
        -2.0 * PI * r * r * ((-self.u(r) / self.kt).exp() - 1.0)
    }

    /// Extend both caches so shell `k` has known bounds and energy.
    fn extend_to(&self, k: usize) {
        let mut cache = self.cache.borrow_mut();
        debug_assert!(k < self.steps(), "step {k} beyond the potential table");

        match self.r_mode {
            RMode::DeltaR => {
                let dr = self.delta_r();
                for i in cache.radii.len()..=k + 1 {
                    cache.radii.push(self.cutoff - i as f64 * dr);
                }
            }
            RMode::DeltaU => {
                let du = -self.u(self.minimum()) / self.attractive_steps;
                let minimum_step = (-self.u(self.minimum()) / du) as usize;

                for i in cache.radii.len()..=k + 1 {
                    // Bisect between a radius whose energy is above the
                    // target and one below it. Before the minimum the
                    // target descends and the previous radius bounds from
                    // above; past it the target climbs again and an upper
                    // bound is found by halving toward the core.
                    let mut target_u = -(i as f64) * du;
                    let mut r_above = cache.radii[i - 1];
                    let mut r_below = self.minimum();
                    if i > minimum_step {
                        target_u = (i as f64 - 2.0 * minimum_step as f64 - 1.0) * du;
                        r_below = cache.radii[i - 1].min(self.minimum());
                        r_above = r_below / 2.0;
                        while self.u(r_above) < target_u {
                            r_above /= 2.0;
                        }
                    }

                    for _ in 0..BISECT_MAX_ITER {
                        let mid = (r_above + r_below) * 0.5;
                        let diff = self.u(mid) - target_u;
                        if diff > 0.0 {
                            r_above = mid;
                        } else {
                            r_below = mid;
                        }
                        if diff.abs() <= du * 1e-15 {
                            break;
                        }
                    }
                    cache.radii.push((r_above + r_below) * 0.5);
                }
            }
        }

        for i in cache.energies.len()..=k {
            let (r_out, r_in) = (cache.radii[i], cache.radii[i + 1]);
            let e = match self.u_mode {
                UMode::Midpoint => self.u((r_out + r_in) * 0.5),
                UMode::Left => self.u(r_in),
                UMode::Right => self.u(r_out),
                UMode::Volume => {
                    let s6 = self.sigma.powi(6);
                    let ro3 = r_out.powi(3);
                    let ri3 = r_in.powi(3);
                    (4.0 * self.epsilon * s6 / (ro3 - ri3))
                        * (1.0 / ro3 - 1.0 / ri3
                            - (s6 / 3.0) * (1.0 / (ro3 * ro3 * ro3) - 1.0 / (ri3 * ri3 * ri3)))
                        - self.u_uncut(self.cutoff)
                }
                UMode::Virial => {
                    // Integrate the shell's B2 contribution, then pick the
                    // constant energy reproducing it at this temperature.
                    let h = (r_out - r_in) / VIRIAL_INTERVALS as f64;
                    let mut b2 = 0.0;
                    for j in 0..=VIRIAL_INTERVALS {
                        b2 += self.b2_integrand(r_in + j as f64 * h);
                    }
                    b2 *= h;
                    let arg = 1.0 - 3.0 * b2 / (2.0 * PI * ro3_minus(r_out, r_in));
                    if arg > 0.0 {
                        -self.kt * arg.ln()
                    } else {
                        // The shell excludes everything at this temperature;
                        // an infinite step is the matching hard wall.
                        f64::INFINITY
                    }
                }
            };
            cache.energies.push(e);
        }
    }
}

#[inline]
fn ro3_minus(r_out: f64, r_in: f64) -> f64 {
    r_out.powi(3) - r_in.powi(3)
}
