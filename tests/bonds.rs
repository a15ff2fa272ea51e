//! Bonded square wells: the pair is captured at initialisation and can
//! never escape the outer bond radius.

use stepdyn::boundary::Boundary;
use stepdyn::core::sim::SimulationParts;
use stepdyn::dynamics::Dynamics;
use stepdyn::error::{Error, Result};
use stepdyn::interaction::{Interaction, Registry, SquareBond};
use stepdyn::scheduler::SorterKind;
use stepdyn::system::Ensemble;
use stepdyn::{Particle, RunLength, Simulation};

fn bonded_pair(separation: f64, v_rel: f64) -> Result<Simulation> {
    let mut registry = Registry::new(1);
    registry.register(0, 0, Interaction::SquareBond(SquareBond::new(1.0, 1.5)?))?;
    Simulation::new(SimulationParts {
        particles: vec![
            Particle::new(0, 0, [5.0, 5.0, 5.0], [v_rel / 2.0, 0.0, 0.0], 1.0)?,
            Particle::new(
                1,
                0,
                [5.0 + separation, 5.0, 5.0],
                [-v_rel / 2.0, 0.0, 0.0],
                1.0,
            )?,
        ],
        boundary: Boundary::Periodic {
            box_len: [10.0, 10.0, 10.0],
        },
        dynamics: Dynamics::Newtonian,
        registry,
        systems: Vec::new(),
        ensemble: Ensemble::Nve,
        sorter: SorterKind::Heap,
        overlap_squash: false,
        seed: 1,
    })
}

/// A receding bonded pair rattles between the core and the bond wall
/// forever instead of separating.
#[test]
fn bonded_pair_never_separates() -> Result<()> {
    let mut sim = bonded_pair(1.2, -2.0)?;
    assert_eq!(sim.capture_state(0, 1), Some(0));
    sim.run(RunLength::Time(50.0))?;

    // Many wall reflections and core bounces, no releases.
    assert!(sim.stats().reflections > 10);
    assert!(sim.stats().bounces > 10);
    assert_eq!(sim.stats().releases, 0);
    assert_eq!(sim.capture_state(0, 1), Some(0));

    let r = sim.positions_now();
    let raw = [
        r[0][0] - r[1][0],
        r[0][1] - r[1][1],
        r[0][2] - r[1][2],
    ];
    let (dr, _) = sim.boundary().delta(raw, sim.time());
    let dist = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();
    assert!(
        (1.0 - 1e-9..=1.5 + 1e-9).contains(&dist),
        "bonded pair at separation {dist}"
    );
    Ok(())
}

/// Bond kinematics are elastic: the rattling conserves energy exactly.
#[test]
fn bond_rattling_conserves_energy() -> Result<()> {
    let mut sim = bonded_pair(1.3, 3.0)?;
    let e0 = sim.total_energy();
    sim.run(RunLength::Events(1000))?;
    assert!((sim.total_energy() - e0).abs() < 1e-9);
    Ok(())
}

/// A pair starting outside the bond range is a configuration error.
#[test]
fn bonded_pair_outside_range_rejected() {
    let err = bonded_pair(2.0, 0.0).unwrap_err();
    assert!(matches!(err, Error::Overlap(_)));
}
