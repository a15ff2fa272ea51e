use super::ShellGeometry;
use crate::error::{Error, Result};

/// Smooth elastic hard spheres: a single impenetrable contact at the
/// diameter, no capture shells.
#[derive(Debug, Clone, Copy)]
pub struct HardSphere {
    diameter: f64,
}

impl HardSphere {
    pub fn new(diameter: f64) -> Result<Self> {
        if !diameter.is_finite() || diameter <= 0.0 {
            return Err(Error::Config(format!(
                "hard-sphere diameter must be finite and > 0, got {diameter}"
            )));
        }
        Ok(Self { diameter })
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }
}

impl ShellGeometry for HardSphere {
    fn shells(&self) -> usize {
        0
    }

    fn shell_radius(&self, _k: usize) -> f64 {
        unreachable!("hard spheres have no capture shells")
    }

    fn shell_energy(&self, _k: usize) -> f64 {
        unreachable!("hard spheres have no capture shells")
    }

    fn core(&self) -> Option<f64> {
        Some(self.diameter)
    }
}

#[cfg(test)]
mod tests {
    use super::super::stepped::{capture_test, predict, resolve};
    use super::super::{Crossing, PairState, ResolveKind};
    use super::*;
    use crate::core::event::CrossDir;
    use crate::dynamics::Dynamics;

    #[test]
    fn head_on_contact_and_bounce() -> Result<()> {
        let hs = HardSphere::new(1.0)?;
        let s = PairState {
            dr: [2.0, 0.0, 0.0],
            dv: [-2.0, 0.0, 0.0],
            mu: 0.5,
            now: 0.0,
        };
        let c = predict(&hs, &s, None, &Dynamics::Newtonian).expect("must collide");
        assert_eq!(c.dir, CrossDir::Core);
        assert!((c.dt - 0.5).abs() < 1e-14);

        let at_contact = PairState {
            dr: [1.0, 0.0, 0.0],
            ..s
        };
        let r = resolve(&hs, &at_contact, None, &c, &Dynamics::Newtonian)?;
        assert_eq!(r.kind, ResolveKind::Bounce);
        // Equal masses swap normal velocities: impulse = -2 mu vn = 2.
        assert!((r.impulse - 2.0).abs() < 1e-14);
        Ok(())
    }

    #[test]
    fn never_captured() -> Result<()> {
        let hs = HardSphere::new(1.0)?;
        assert_eq!(capture_test(&hs, 0.5), None);
        assert_eq!(capture_test(&hs, 5.0), None);
        Ok(())
    }

    #[test]
    fn coincident_centres_is_a_numerical_error() -> Result<()> {
        let hs = HardSphere::new(1.0)?;
        let s = PairState {
            dr: [0.0, 0.0, 0.0],
            dv: [1.0, 0.0, 0.0],
            mu: 0.5,
            now: 0.0,
        };
        let c = Crossing {
            dt: 0.0,
            shell: 0,
            dir: CrossDir::Core,
        };
        assert!(resolve(&hs, &s, None, &c, &Dynamics::Newtonian).is_err());
        Ok(())
    }
}
