use stepdyn::boundary::Boundary;
use stepdyn::core::sim::SimulationParts;
use stepdyn::dynamics::Dynamics;
use stepdyn::error::Result;
use stepdyn::interaction::{Interaction, Registry, SquareWell};
use stepdyn::scheduler::SorterKind;
use stepdyn::system::Ensemble;
use stepdyn::{EventKind, Particle, RunLength, Simulation};

/// Two particles approaching head-on through a square well or shoulder of
/// the given depth (positive = attractive well).
fn pair_sim(speed: f64, well_depth: f64) -> Result<Simulation> {
    let mut registry = Registry::new(1);
    registry.register(
        0,
        0,
        Interaction::SquareWell(SquareWell::new(1.0, 1.5, well_depth)?),
    )?;
    Simulation::new(SimulationParts {
        particles: vec![
            Particle::new(0, 0, [4.0, 5.0, 5.0], [speed, 0.0, 0.0], 1.0)?,
            Particle::new(1, 0, [6.0, 5.0, 5.0], [-speed, 0.0, 0.0], 1.0)?,
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

/// Capture releases the well depth into the normal channel: the first
/// event fires when the gap closes to the shell at r = 1.5, and afterwards
/// each particle moves at sqrt(2).
#[test]
fn well_capture_accelerates_the_pair() -> Result<()> {
    let mut sim = pair_sim(1.0, 1.0)?;
    sim.enable_trace();
    let e0 = sim.total_energy();
    sim.run(RunLength::Time(0.3))?;

    let pair_events: Vec<_> = sim
        .trace()
        .iter()
        .filter(|(_, kind)| matches!(kind, EventKind::Pair { .. }))
        .collect();
    assert_eq!(pair_events.len(), 1);
    assert!((pair_events[0].0 - 0.25).abs() < 1e-12);

    assert_eq!(sim.capture_state(0, 1), Some(0));
    assert_eq!(sim.stats().captures, 1);

    // mu vn'^2 / 2 = mu vn^2 / 2 + depth with mu = 0.5, vn = 2 gives a
    // relative speed of sqrt(8), i.e. sqrt(2) per particle.
    let v = 2.0f64.sqrt();
    assert!((sim.particles[0].v[0] - v).abs() < 1e-12);
    assert!((sim.particles[1].v[0] - -v).abs() < 1e-12);

    // Kinetic gain is exactly the well depth; the total is conserved.
    assert!((sim.kinetic_energy() - (e0 + 1.0)).abs() < 1e-12);
    assert!((sim.total_energy() - e0).abs() < 1e-12);
    Ok(())
}

/// A slow pair meeting a repulsive shoulder lacks the normal kinetic
/// energy to climb it and reflects instead, leaving no capture behind.
#[test]
fn shoulder_reflects_a_slow_pair() -> Result<()> {
    // Depth -1 parameterises a +1 shoulder; speeds 0.1 reach the shell at
    // t = 0.5 / 0.2 = 2.5 with normal kinetic energy 0.01.
    let mut sim = pair_sim(0.1, -1.0)?;
    sim.enable_trace();
    sim.run(RunLength::Time(3.0))?;

    let first_pair = sim
        .trace()
        .iter()
        .find(|(_, kind)| matches!(kind, EventKind::Pair { .. }))
        .expect("the pair must meet the shoulder");
    assert!((first_pair.0 - 2.5).abs() < 1e-9);

    assert_eq!(sim.stats().reflections, 1);
    assert_eq!(sim.capture_state(0, 1), None);
    assert!((sim.particles[0].v[0] - -0.1).abs() < 1e-12);
    assert!((sim.particles[1].v[0] - 0.1).abs() < 1e-12);
    Ok(())
}

/// A fast pair crosses the same shoulder and is captured inside it.
#[test]
fn shoulder_admits_a_fast_pair() -> Result<()> {
    let mut sim = pair_sim(3.0, -1.0)?;
    sim.run(RunLength::Events(2))?;
    assert_eq!(sim.stats().reflections, 0);
    assert!(sim.stats().captures >= 1);
    assert_eq!(sim.capture_state(0, 1), Some(0));
    Ok(())
}

/// The full bounce cycle: capture, core collision, escape. Energy returns
/// to its initial value and the pair separates at the approach speed.
#[test]
fn capture_bounce_release_cycle() -> Result<()> {
    let mut sim = pair_sim(1.0, 1.0)?;
    let e0 = sim.total_energy();
    sim.run(RunLength::Time(1.0))?;

    assert_eq!(sim.stats().captures, 1);
    assert_eq!(sim.stats().bounces, 1);
    assert_eq!(sim.stats().releases, 1);
    assert_eq!(sim.capture_state(0, 1), None);

    // Outside the well again at the original speed, now receding.
    assert!((sim.particles[0].v[0] - -1.0).abs() < 1e-12);
    assert!((sim.particles[1].v[0] - 1.0).abs() < 1e-12);
    assert!((sim.total_energy() - e0).abs() < 1e-12);
    assert_eq!(sim.stats().capture_repairs, 0);
    Ok(())
}

/// Capture agreement: after a long run every captured pair's separation
/// lies inside its shell.
#[test]
fn capture_map_agrees_with_geometry() -> Result<()> {
    let mut registry = Registry::new(1);
    registry.register(0, 0, Interaction::SquareWell(SquareWell::new(1.0, 1.5, 0.5)?))?;
    let mut particles = Vec::new();
    let mut id = 0;
    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                let r = [
                    1.0 + 2.0 * i as f64,
                    1.0 + 2.0 * j as f64,
                    1.0 + 2.0 * k as f64,
                ];
                // Deterministic varied velocities.
                let v = [
                    ((id * 7 + 1) % 5) as f64 / 5.0 - 0.4,
                    ((id * 13 + 2) % 5) as f64 / 5.0 - 0.4,
                    ((id * 3 + 4) % 5) as f64 / 5.0 - 0.4,
                ];
                particles.push(Particle::new(id, 0, r, v, 1.0)?);
                id += 1;
            }
        }
    }
    let mut sim = Simulation::new(SimulationParts {
        particles,
        boundary: Boundary::Periodic {
            box_len: [8.0, 8.0, 8.0],
        },
        dynamics: Dynamics::Newtonian,
        registry,
        systems: Vec::new(),
        ensemble: Ensemble::Nve,
        sorter: SorterKind::Heap,
        overlap_squash: false,
        seed: 3,
    })?;
    let e0 = sim.total_energy();
    sim.run(RunLength::Events(5000))?;

    let positions = sim.positions_now();
    for a in 0..sim.particles.len() as u32 {
        for b in (a + 1)..sim.particles.len() as u32 {
            let raw = [
                positions[a as usize][0] - positions[b as usize][0],
                positions[a as usize][1] - positions[b as usize][1],
                positions[a as usize][2] - positions[b as usize][2],
            ];
            let (dr, _) = sim.boundary().delta(raw, sim.time());
            let dist = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();
            match sim.capture_state(a, b) {
                Some(0) => assert!(
                    dist < 1.5 + 1e-9 && dist > 1.0 - 1e-9,
                    "captured pair ({a}, {b}) at separation {dist}"
                ),
                Some(s) => panic!("square well cannot capture to shell {s}"),
                None => assert!(
                    dist > 1.5 - 1e-9,
                    "uncaptured pair ({a}, {b}) at separation {dist}"
                ),
            }
        }
    }
    // Well events exchange kinetic and potential energy but conserve the sum.
    let drift = (sim.total_energy() - e0).abs() / e0.abs().max(1.0);
    assert!(
        drift <= 1e-9 * (sim.stats().executed as f64).sqrt(),
        "energy drift {drift}"
    );
    Ok(())
}
