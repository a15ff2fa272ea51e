use super::ShellGeometry;
use crate::error::{Error, Result};

/// A permanent square-well bond: a hard core at one diameter and an
/// unbreakable outer wall at `lambda * diameter`. Pairs governed by a bond
/// are captured at initialisation and never escape; the outward crossing of
/// the outer wall always reflects.
#[derive(Debug, Clone, Copy)]
pub struct SquareBond {
    diameter: f64,
    lambda: f64,
}

impl SquareBond {
    pub fn new(diameter: f64, lambda: f64) -> Result<Self> {
        if !diameter.is_finite() || diameter <= 0.0 {
            return Err(Error::Config(format!(
                "square-bond diameter must be finite and > 0, got {diameter}"
            )));
        }
        if !lambda.is_finite() || lambda <= 1.0 {
            return Err(Error::Config(format!(
                "square-bond lambda must exceed 1, got {lambda}"
            )));
        }
        Ok(Self { diameter, lambda })
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl ShellGeometry for SquareBond {
    fn shells(&self) -> usize {
        1
    }

    fn shell_radius(&self, _k: usize) -> f64 {
        self.lambda * self.diameter
    }

    fn shell_energy(&self, _k: usize) -> f64 {
        0.0
    }

    fn core(&self) -> Option<f64> {
        Some(self.diameter)
    }

    fn bonded(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::stepped::{predict, resolve};
    use super::super::{PairState, ResolveKind};
    use super::*;
    use crate::core::event::CrossDir;
    use crate::dynamics::Dynamics;

    #[test]
    fn bond_wall_always_reflects() -> Result<()> {
        let b = SquareBond::new(1.0, 1.5)?;
        // Fast outward motion toward the wall; an ordinary well would
        // release at this speed.
        let s = PairState {
            dr: [1.4, 0.0, 0.0],
            dv: [10.0, 0.0, 0.0],
            mu: 0.5,
            now: 0.0,
        };
        let c = predict(&b, &s, Some(0), &Dynamics::Newtonian).expect("wall crossing");
        assert_eq!(c.dir, CrossDir::Outward);
        assert!((c.dt - 0.01).abs() < 1e-14);
        let at_wall = PairState {
            dr: [1.5, 0.0, 0.0],
            ..s
        };
        let r = resolve(&b, &at_wall, Some(0), &c, &Dynamics::Newtonian)?;
        assert_eq!(r.kind, ResolveKind::Reflect);
        assert_eq!(r.new_state, Some(0));
        assert!((r.impulse - -10.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn bonded_pair_bounces_between_walls() -> Result<()> {
        let b = SquareBond::new(1.0, 1.5)?;
        let s = PairState {
            dr: [1.2, 0.0, 0.0],
            dv: [-1.0, 0.0, 0.0],
            mu: 0.5,
            now: 0.0,
        };
        let c = predict(&b, &s, Some(0), &Dynamics::Newtonian).expect("core contact");
        assert_eq!(c.dir, CrossDir::Core);
        assert!((c.dt - 0.2).abs() < 1e-14);
        Ok(())
    }
}
