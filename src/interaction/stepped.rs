//! Generic shell-crossing machinery, plus the interaction driven by an
//! arbitrary stepped potential.
//!
//! Hard spheres, square wells and bonds are all special cases of one
//! picture: a descending ladder of discontinuity radii with constant
//! energies between them. The free functions here implement prediction and
//! impulse resolution once, against the `ShellGeometry` view.

use super::{Crossing, PairState, Resolution, ResolveKind, ShellGeometry};
use crate::core::event::CrossDir;
use crate::dynamics::Dynamics;
use crate::error::{Error, Result};
use crate::math;
use crate::potential::Potential;

/// Largest separation at which events can occur.
pub(super) fn max_distance<G: ShellGeometry>(g: &G) -> f64 {
    if g.shells() > 0 {
        g.shell_radius(0)
    } else {
        g.core().unwrap_or(0.0)
    }
}

/// Capture state from geometry alone: the index of the region `dist` falls
/// in, `None` outside the outermost shell.
pub(super) fn capture_test<G: ShellGeometry>(g: &G, dist: f64) -> Option<u32> {
    if g.shells() == 0 || dist >= g.shell_radius(0) {
        return None;
    }
    let mut k = 0usize;
    while k + 1 < g.shells() && g.shell_radius(k + 1) > dist {
        k += 1;
    }
    Some(k as u32)
}

pub(super) fn pair_energy<G: ShellGeometry>(g: &G, state: Option<u32>) -> f64 {
    state.map_or(0.0, |k| g.shell_energy(k as usize))
}

/// Next crossing for a pair in capture state `state`. Candidates are the
/// next radius inward (shell `state + 1`, or the outermost shell from
/// outside, or the core once the ladder is exhausted) and, when captured,
/// the current shell radius outward; the earlier wins.
pub(super) fn predict<G: ShellGeometry>(
    g: &G,
    s: &PairState,
    state: Option<u32>,
    dynamics: &Dynamics,
) -> Option<Crossing> {
    let shells = g.shells();

    let inward_target = match state {
        None => {
            if shells > 0 {
                Some((0u32, CrossDir::Inward))
            } else {
                g.core().map(|_| (0u32, CrossDir::Core))
            }
        }
        Some(k) => {
            if (k as usize) + 1 < shells {
                Some((k + 1, CrossDir::Inward))
            } else {
                g.core().map(|_| (k + 1, CrossDir::Core))
            }
        }
    };

    let mut best: Option<Crossing> = None;

    if let Some((shell, dir)) = inward_target {
        let radius = match dir {
            CrossDir::Core => g.core().unwrap_or(0.0),
            _ => g.shell_radius(shell as usize),
        };
        if let Some(dt) = dynamics.time_to_contact_in(&s.dr, &s.dv, radius, s.now) {
            best = Some(Crossing { dt, shell, dir });
        }
    }

    if let Some(k) = state {
        let radius = g.shell_radius(k as usize);
        if let Some(dt) = dynamics.time_to_contact_out(&s.dr, &s.dv, radius, s.now) {
            if best.map_or(true, |b| dt < b.dt) {
                best = Some(Crossing {
                    dt,
                    shell: k,
                    dir: CrossDir::Outward,
                });
            }
        }
    }

    best
}

/// Impulse for a crossing, with the pair geometry streamed to the event
/// time. Inward crossings with insufficient normal kinetic energy become
/// reflections; bonded pairs reflect off their outermost shell
/// unconditionally.
pub(super) fn resolve<G: ShellGeometry>(
    g: &G,
    s: &PairState,
    state: Option<u32>,
    crossing: &Crossing,
    dynamics: &Dynamics,
) -> Result<Resolution> {
    let dist = math::norm(&s.dr);
    if !dist.is_finite() || dist <= 0.0 {
        return Err(Error::Numerical(format!(
            "degenerate contact normal at separation {dist}"
        )));
    }
    let n = math::scale(&s.dr, 1.0 / dist);
    let radius = match crossing.dir {
        CrossDir::Core => g.core().unwrap_or(dist),
        _ => g.shell_radius(crossing.shell as usize),
    };
    // Growing diameters add the surface speed to the approach rate.
    let vn = math::dot(&s.dv, &n) - dynamics.radius_rate(radius);
    if !vn.is_finite() {
        return Err(Error::Numerical("NaN normal velocity in resolve".into()));
    }

    match crossing.dir {
        CrossDir::Core => {
            // Elastic: delta E = 0, sign reversal.
            Ok(Resolution {
                impulse: -2.0 * s.mu * vn,
                new_state: state,
                kind: ResolveKind::Bounce,
                delta_e: 0.0,
            })
        }
        CrossDir::Inward => {
            let k = crossing.shell as usize;
            let outer = if k == 0 { 0.0 } else { g.shell_energy(k - 1) };
            let delta_e = g.shell_energy(k) - outer;
            let gain = vn * vn - 2.0 * delta_e / s.mu;
            if gain < 0.0 {
                // Not enough kinetic energy in the normal channel.
                Ok(Resolution {
                    impulse: -2.0 * s.mu * vn,
                    new_state: state,
                    kind: ResolveKind::Reflect,
                    delta_e: 0.0,
                })
            } else {
                // Continues inward: the normal velocity keeps its sign.
                let vn_after = -gain.sqrt();
                Ok(Resolution {
                    impulse: s.mu * (vn_after - vn),
                    new_state: Some(crossing.shell),
                    kind: ResolveKind::Capture,
                    delta_e,
                })
            }
        }
        CrossDir::Outward => {
            let k = crossing.shell as usize;
            let outer = if k == 0 { 0.0 } else { g.shell_energy(k - 1) };
            let delta_e = outer - g.shell_energy(k);
            let gain = vn * vn - 2.0 * delta_e / s.mu;
            if (g.bonded() && k == 0) || gain < 0.0 {
                Ok(Resolution {
                    impulse: -2.0 * s.mu * vn,
                    new_state: state,
                    kind: ResolveKind::Reflect,
                    delta_e: 0.0,
                })
            } else {
                let vn_after = gain.sqrt();
                Ok(Resolution {
                    impulse: s.mu * (vn_after - vn),
                    new_state: if k == 0 { None } else { Some(crossing.shell - 1) },
                    kind: ResolveKind::Release,
                    delta_e,
                })
            }
        }
    }
}

/// Interaction driven by a stepped potential table (explicit steps or a
/// lazily discretised continuous potential).
#[derive(Debug, Clone)]
pub struct SteppedInteraction {
    potential: Potential,
}

impl SteppedInteraction {
    pub fn new(potential: Potential) -> Self {
        Self { potential }
    }

    pub fn potential(&self) -> &Potential {
        &self.potential
    }
}

impl ShellGeometry for SteppedInteraction {
    fn shells(&self) -> usize {
        self.potential.steps()
    }

    fn shell_radius(&self, k: usize) -> f64 {
        self.potential.step_radius(k)
    }

    fn shell_energy(&self, k: usize) -> f64 {
        self.potential.region_energy(k)
    }

    fn core(&self) -> Option<f64> {
        self.potential.core_radius()
    }
}
