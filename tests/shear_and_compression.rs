//! Lees-Edwards wrapping and compression dynamics, end to end.

use stepdyn::boundary::Boundary;
use stepdyn::core::sim::SimulationParts;
use stepdyn::dynamics::Dynamics;
use stepdyn::error::Result;
use stepdyn::interaction::{HardSphere, Interaction, Registry};
use stepdyn::scheduler::SorterKind;
use stepdyn::system::Ensemble;
use stepdyn::{EventKind, Particle, RunLength, Simulation};

fn hard_sphere_registry() -> Result<Registry> {
    let mut registry = Registry::new(1);
    registry.register(0, 0, Interaction::HardSphere(HardSphere::new(1.0)?))?;
    Ok(registry)
}

/// A particle crossing the sheared y face picks up the image offset in x
/// and one shear speed on its x velocity.
#[test]
fn sheared_face_crossing_adjusts_position_and_velocity() -> Result<()> {
    let shear_rate = 0.5;
    let mut sim = Simulation::new(SimulationParts {
        particles: vec![Particle::new(
            0,
            0,
            [0.5, 9.99, 5.0],
            [0.0, 1.0, 0.0],
            1.0,
        )?],
        boundary: Boundary::LeesEdwards {
            box_len: [10.0, 10.0, 10.0],
            shear_rate,
        },
        dynamics: Dynamics::Newtonian,
        registry: hard_sphere_registry()?,
        systems: Vec::new(),
        ensemble: Ensemble::NvShear,
        sorter: SorterKind::Heap,
        overlap_squash: false,
        seed: 1,
    })?;
    sim.enable_trace();
    sim.run(RunLength::Events(1))?;

    let (t, kind) = sim.trace()[0];
    assert!(matches!(kind, EventKind::CellCross { p: 0, face: 3 }));
    assert!((t - 0.01).abs() < 1e-12);

    let p = &sim.particles[0];
    // Offset at t = 0.01 is 0.5 * 10 * 0.01 = 0.05; shear speed is 5.
    assert!((p.r[1] - 0.0).abs() < 1e-9, "y = {}", p.r[1]);
    assert!((p.r[0] - 0.45).abs() < 1e-9, "x = {}", p.r[0]);
    assert!((p.v[0] - -5.0).abs() < 1e-12, "vx = {}", p.v[0]);
    assert!((p.v[1] - 1.0).abs() < 1e-12);
    Ok(())
}

/// Two particles colliding through the sheared face: the prediction must
/// use the image velocity, so the collision is head-on in the image frame.
#[test]
fn collision_through_the_sheared_face() -> Result<()> {
    let shear_rate = 0.1;
    let mut sim = Simulation::new(SimulationParts {
        particles: vec![
            // Near the top face, drifting up.
            Particle::new(0, 0, [5.0, 9.2, 5.0], [0.0, 1.0, 0.0], 1.0)?,
            // Its collision partner sits across the wrap. With
            // vx = -shear_rate * L_y the image above particle 0 has no
            // relative x motion, so the pair meets head-on in y.
            Particle::new(1, 0, [5.0, 0.8, 5.0], [-1.0, -1.0, 0.0], 1.0)?,
        ],
        boundary: Boundary::LeesEdwards {
            box_len: [10.0, 10.0, 10.0],
            shear_rate,
        },
        dynamics: Dynamics::Newtonian,
        registry: hard_sphere_registry()?,
        systems: Vec::new(),
        ensemble: Ensemble::NvShear,
        sorter: SorterKind::Heap,
        overlap_squash: false,
        seed: 1,
    })?;
    let e0 = sim.kinetic_energy();
    sim.run(RunLength::Time(2.0))?;
    // The pair met through the wrap; kinetic energy is conserved by the
    // elastic impulse.
    assert!(sim.stats().pair_events >= 1);
    assert!((sim.kinetic_energy() - e0).abs() < 1e-9);
    Ok(())
}

/// Growing diameters close a static gap; the impulse then includes the
/// surface growth speed and pushes the pair apart.
#[test]
fn compression_collides_static_particles() -> Result<()> {
    let growth_rate = 0.1;
    let mut sim = Simulation::new(SimulationParts {
        particles: vec![
            Particle::new(0, 0, [0.0, 0.0, 0.0], [0.0; 3], 1.0)?,
            Particle::new(1, 0, [2.0, 0.0, 0.0], [0.0; 3], 1.0)?,
        ],
        boundary: Boundary::None,
        dynamics: Dynamics::Compression { growth_rate },
        registry: hard_sphere_registry()?,
        systems: Vec::new(),
        ensemble: Ensemble::NeCompression,
        sorter: SorterKind::Heap,
        overlap_squash: false,
        seed: 1,
    })?;
    sim.enable_trace();
    sim.run(RunLength::Events(1))?;

    // Contact when 1 + 0.1 t = 2.
    let (t, kind) = sim.trace()[0];
    assert!(matches!(kind, EventKind::Pair { .. }));
    assert!((t - 10.0).abs() < 1e-8, "contact at {t}");

    // Each particle recoils at the surface growth speed.
    assert!(sim.particles[0].v[0] < 0.0);
    assert!(sim.particles[1].v[0] > 0.0);
    assert!((sim.particles[1].v[0] - 0.1).abs() < 1e-8);
    Ok(())
}

/// Under compression a moving pair meets earlier than the static
/// prediction, and momentum stays conserved through the impulse.
#[test]
fn compression_preserves_momentum() -> Result<()> {
    let mut sim = Simulation::new(SimulationParts {
        particles: vec![
            Particle::new(0, 0, [0.0, 0.0, 0.0], [0.3, 0.0, 0.0], 1.0)?,
            Particle::new(1, 0, [4.0, 0.1, 0.0], [-0.3, 0.0, 0.0], 2.0)?,
        ],
        boundary: Boundary::None,
        dynamics: Dynamics::Compression { growth_rate: 0.05 },
        registry: hard_sphere_registry()?,
        systems: Vec::new(),
        ensemble: Ensemble::NeCompression,
        sorter: SorterKind::Heap,
        overlap_squash: false,
        seed: 1,
    })?;
    let p0 = sim.momentum();
    sim.run(RunLength::Events(1))?;
    assert_eq!(sim.stats().bounces, 1);
    let p1 = sim.momentum();
    for k in 0..3 {
        assert!((p1[k] - p0[k]).abs() < 1e-12);
    }
    Ok(())
}
