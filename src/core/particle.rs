use crate::error::{Error, Result};
use crate::math::{self, Vec3};

/// A particle in the event engine.
///
/// Between events a particle moves ballistically in its own frame:
/// `r(t) = r + v * (t - t_local)` for any `t` up to its next event. Only
/// participants of an event are streamed, so `t_local` lags the global clock
/// for everyone else.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Stable identifier, also the FEL owner slot.
    pub id: u32,
    /// Species index into the interaction registry.
    pub species: u32,
    /// Position at `t_local`.
    pub r: Vec3,
    /// Velocity.
    pub v: Vec3,
    /// Mass (> 0), immutable after construction.
    pub mass: f64,
    /// Simulation time at which `r` was last synchronised.
    pub t_local: f64,
    /// Freshness counter, bumped on every kinematic update. Scheduled
    /// events snapshot it; a mismatch marks them stale.
    pub token: u64,
}

impl Particle {
    pub fn new(id: u32, species: u32, r: Vec3, v: Vec3, mass: f64) -> Result<Self> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam(format!(
                "particle {id}: mass must be finite and > 0"
            )));
        }
        if !math::is_finite(&r) {
            return Err(Error::InvalidParam(format!(
                "particle {id}: position must be finite"
            )));
        }
        if !math::is_finite(&v) {
            return Err(Error::InvalidParam(format!(
                "particle {id}: velocity must be finite"
            )));
        }
        Ok(Self {
            id,
            species,
            r,
            v,
            mass,
            t_local: 0.0,
            token: 0,
        })
    }

    /// Position extrapolated to absolute time `t` without mutating.
    #[inline]
    pub fn pos_at(&self, t: f64) -> Vec3 {
        math::add_scaled(&self.r, &self.v, t - self.t_local)
    }

    /// Synchronise the stored position to absolute time `t`.
    #[inline]
    pub fn stream_to(&mut self, t: f64) {
        self.r = math::add_scaled(&self.r, &self.v, t - self.t_local);
        self.t_local = t;
    }

    /// Invalidate every event predicted against this particle's state.
    #[inline]
    pub fn bump_token(&mut self) {
        self.token = self.token.wrapping_add(1);
    }

    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * math::norm2(&self.v)
    }

    #[inline]
    pub fn momentum(&self) -> Vec3 {
        math::scale(&self.v, self.mass)
    }
}
