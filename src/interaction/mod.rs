//! Pair interactions: event prediction and impulse resolution.
//!
//! Every interaction presents the same capability surface: predict the next
//! shell crossing of a pair under ballistic motion, resolve the impulse when
//! it fires, and classify a pair's capture state from geometry alone. The
//! set of interaction kinds is closed, so dispatch is a plain `match` on a
//! tagged variant; the hot path neither allocates nor indirects per pair.

mod hard_sphere;
mod square_bond;
mod square_well;
mod stepped;

pub use hard_sphere::HardSphere;
pub use square_bond::SquareBond;
pub use square_well::SquareWell;
pub use stepped::SteppedInteraction;

use crate::core::event::CrossDir;
use crate::dynamics::Dynamics;
use crate::error::{Error, Result};
use crate::math::Vec3;

/// Relative kinematic state of a pair, streamed to a common time.
#[derive(Debug, Clone, Copy)]
pub struct PairState {
    /// Minimum-image displacement `r_a - r_b`.
    pub dr: Vec3,
    /// Relative velocity `v_a - v_b`, including any boundary correction.
    pub dv: Vec3,
    /// Reduced mass `m_a m_b / (m_a + m_b)`.
    pub mu: f64,
    /// Absolute time the state refers to.
    pub now: f64,
}

/// A predicted shell crossing, `dt` after `PairState::now`.
#[derive(Debug, Clone, Copy)]
pub struct Crossing {
    pub dt: f64,
    /// Index of the discontinuity radius being crossed; for a core contact
    /// this is one past the last shell.
    pub shell: u32,
    pub dir: CrossDir,
}

/// What an executed crossing did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveKind {
    /// Entered a deeper shell.
    Capture,
    /// Escaped to a shallower shell (or out of the well entirely).
    Release,
    /// Elastic core contact.
    Bounce,
    /// Insufficient normal kinetic energy to cross; velocity reversed.
    Reflect,
}

/// Outcome of resolving a crossing. The scalar `impulse` acts along the
/// line of centres `dr / |dr|`: `v_a += impulse / m_a * n`, `v_b -=
/// impulse / m_b * n`.
#[derive(Debug, Clone, Copy)]
pub struct Resolution {
    pub impulse: f64,
    pub new_state: Option<u32>,
    pub kind: ResolveKind,
    /// Potential-energy change actually realised (zero on reflections).
    pub delta_e: f64,
}

/// The closed set of pair-interaction kinds.
#[derive(Debug, Clone)]
pub enum Interaction {
    HardSphere(HardSphere),
    SquareWell(SquareWell),
    SquareBond(SquareBond),
    Stepped(SteppedInteraction),
}

/// Shell-table view shared by every interaction kind: a descending ladder
/// of discontinuity radii with constant region energies between them, and
/// optionally an impenetrable core below the innermost shell.
pub(crate) trait ShellGeometry {
    fn shells(&self) -> usize;
    fn shell_radius(&self, k: usize) -> f64;
    /// Energy of the region just inside radius `k`.
    fn shell_energy(&self, k: usize) -> f64;
    fn core(&self) -> Option<f64>;
    /// Bonded pairs never escape the outermost shell.
    fn bonded(&self) -> bool {
        false
    }
}

impl Interaction {
    /// Largest separation at which this interaction can generate an event.
    pub fn max_distance(&self) -> f64 {
        match self {
            Interaction::HardSphere(i) => stepped::max_distance(i),
            Interaction::SquareWell(i) => stepped::max_distance(i),
            Interaction::SquareBond(i) => stepped::max_distance(i),
            Interaction::Stepped(i) => stepped::max_distance(i),
        }
    }

    /// Hard-core diameter, if the interaction has one.
    pub fn core_distance(&self) -> Option<f64> {
        match self {
            Interaction::HardSphere(i) => i.core(),
            Interaction::SquareWell(i) => i.core(),
            Interaction::SquareBond(i) => i.core(),
            Interaction::Stepped(i) => i.core(),
        }
    }

    /// Capture state implied by the separation `dist`.
    pub fn capture_test(&self, dist: f64) -> Option<u32> {
        match self {
            Interaction::HardSphere(i) => stepped::capture_test(i, dist),
            Interaction::SquareWell(i) => stepped::capture_test(i, dist),
            Interaction::SquareBond(i) => stepped::capture_test(i, dist),
            Interaction::Stepped(i) => stepped::capture_test(i, dist),
        }
    }

    /// Potential energy of a pair in capture state `state`.
    pub fn pair_energy(&self, state: Option<u32>) -> f64 {
        match self {
            Interaction::HardSphere(i) => stepped::pair_energy(i, state),
            Interaction::SquareWell(i) => stepped::pair_energy(i, state),
            Interaction::SquareBond(i) => stepped::pair_energy(i, state),
            Interaction::Stepped(i) => stepped::pair_energy(i, state),
        }
    }

    /// Earliest future shell crossing, or `None` for a pair that never
    /// meets a discontinuity.
    pub fn predict(
        &self,
        s: &PairState,
        state: Option<u32>,
        dynamics: &Dynamics,
    ) -> Option<Crossing> {
        match self {
            Interaction::HardSphere(i) => stepped::predict(i, s, state, dynamics),
            Interaction::SquareWell(i) => stepped::predict(i, s, state, dynamics),
            Interaction::SquareBond(i) => stepped::predict(i, s, state, dynamics),
            Interaction::Stepped(i) => stepped::predict(i, s, state, dynamics),
        }
    }

    /// Impulse for a crossing whose geometry the caller has streamed to the
    /// event time.
    pub fn resolve(
        &self,
        s: &PairState,
        state: Option<u32>,
        crossing: &Crossing,
        dynamics: &Dynamics,
    ) -> Result<Resolution> {
        match self {
            Interaction::HardSphere(i) => stepped::resolve(i, s, state, crossing, dynamics),
            Interaction::SquareWell(i) => stepped::resolve(i, s, state, crossing, dynamics),
            Interaction::SquareBond(i) => stepped::resolve(i, s, state, crossing, dynamics),
            Interaction::Stepped(i) => stepped::resolve(i, s, state, crossing, dynamics),
        }
    }

    /// Whether pairs governed by this interaction are permanently bonded.
    pub fn is_bonded(&self) -> bool {
        matches!(self, Interaction::SquareBond(_))
    }

    fn geometry(&self) -> &dyn ShellGeometry {
        match self {
            Interaction::HardSphere(i) => i,
            Interaction::SquareWell(i) => i,
            Interaction::SquareBond(i) => i,
            Interaction::Stepped(i) => i,
        }
    }

    /// Nominal radius of the discontinuity a crossing fires at.
    pub fn crossing_radius(&self, crossing: &Crossing) -> f64 {
        let g = self.geometry();
        match crossing.dir {
            CrossDir::Core => g.core().unwrap_or(0.0),
            _ => g.shell_radius(crossing.shell as usize),
        }
    }

    /// Capture state a crossing was predicted from.
    pub fn state_before(crossing: &Crossing) -> Option<u32> {
        match crossing.dir {
            CrossDir::Inward | CrossDir::Core => crossing.shell.checked_sub(1),
            CrossDir::Outward => Some(crossing.shell),
        }
    }
}

/// Species-pair lookup table. Unordered pairs `(a, b)` and `(b, a)` share
/// one entry; the table is dense and immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct Registry {
    n_species: usize,
    table: Vec<Option<usize>>,
    interactions: Vec<Interaction>,
}

impl Registry {
    pub fn new(n_species: usize) -> Self {
        Self {
            n_species,
            table: vec![None; n_species * n_species],
            interactions: Vec::new(),
        }
    }

    fn slot(&self, sa: u32, sb: u32) -> usize {
        let (lo, hi) = if sa <= sb { (sa, sb) } else { (sb, sa) };
        lo as usize * self.n_species + hi as usize
    }

    pub fn register(&mut self, sa: u32, sb: u32, interaction: Interaction) -> Result<()> {
        if sa as usize >= self.n_species || sb as usize >= self.n_species {
            return Err(Error::Config(format!(
                "species pair ({sa}, {sb}) outside the {} registered species",
                self.n_species
            )));
        }
        let slot = self.slot(sa, sb);
        if self.table[slot].is_some() {
            return Err(Error::Config(format!(
                "species pair ({sa}, {sb}) has two interactions"
            )));
        }
        self.table[slot] = Some(self.interactions.len());
        self.interactions.push(interaction);
        Ok(())
    }

    pub fn lookup(&self, sa: u32, sb: u32) -> Option<&Interaction> {
        self.table[self.slot(sa, sb)].map(|i| &self.interactions[i])
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Registered `(species_a, species_b, interaction)` entries, each
    /// unordered pair once.
    pub fn pairs(&self) -> impl Iterator<Item = (u32, u32, &Interaction)> + '_ {
        self.table.iter().enumerate().filter_map(|(slot, idx)| {
            idx.map(|i| {
                let lo = (slot / self.n_species) as u32;
                let hi = (slot % self.n_species) as u32;
                (lo, hi, &self.interactions[i])
            })
        })
    }

    pub fn n_species(&self) -> usize {
        self.n_species
    }

    /// Largest interaction distance over all registered pairs; the cell
    /// side must not be smaller.
    pub fn max_distance(&self) -> f64 {
        self.interactions
            .iter()
            .map(Interaction::max_distance)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_symmetric() -> Result<()> {
        let mut reg = Registry::new(2);
        reg.register(0, 1, Interaction::HardSphere(HardSphere::new(1.0)?))?;
        assert!(reg.lookup(0, 1).is_some());
        assert!(reg.lookup(1, 0).is_some());
        assert!(reg.lookup(0, 0).is_none());
        Ok(())
    }

    #[test]
    fn duplicate_pair_rejected() -> Result<()> {
        let mut reg = Registry::new(1);
        reg.register(0, 0, Interaction::HardSphere(HardSphere::new(1.0)?))?;
        let err = reg
            .register(0, 0, Interaction::HardSphere(HardSphere::new(2.0)?))
            .unwrap_err();
        assert!(err.to_string().contains("two interactions"));
        Ok(())
    }

    #[test]
    fn max_distance_covers_all_pairs() -> Result<()> {
        let mut reg = Registry::new(2);
        reg.register(0, 0, Interaction::HardSphere(HardSphere::new(1.0)?))?;
        reg.register(
            0,
            1,
            Interaction::SquareWell(SquareWell::new(1.0, 1.5, 1.0)?),
        )?;
        assert!((reg.max_distance() - 1.5).abs() < 1e-15);
        Ok(())
    }

    #[test]
    fn out_of_range_species_rejected() -> Result<()> {
        let mut reg = Registry::new(1);
        let err = reg
            .register(0, 1, Interaction::HardSphere(HardSphere::new(1.0)?))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        Ok(())
    }
}
