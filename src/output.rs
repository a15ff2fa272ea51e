//! Output hooks.
//!
//! The core exposes one seam to the output layer: every executed event is
//! offered to the subscribed plugins together with the particle array.
//! Plugins accumulate whatever statistics they like and render a one-line
//! summary at the end of the run.

use crate::core::event::{Event, EventKind};
use crate::core::particle::Particle;

pub trait OutputPlugin: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Called after each executed event, with participants streamed to the
    /// event time.
    fn on_event(&mut self, ev: &Event, particles: &[Particle]);

    /// Human-readable end-of-run summary.
    fn summary(&self) -> String;
}

/// Counts executed events by kind, and events whose time ran backwards
/// relative to the previous one (a floating-point pathology worth
/// surfacing even though the engine clamps it).
#[derive(Debug, Default)]
pub struct EventCounter {
    pairs: u64,
    cell_crossings: u64,
    thermostat: u64,
    rebuilds: u64,
    reverse_events: u64,
    last_time: f64,
}

impl EventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reverse_events(&self) -> u64 {
        self.reverse_events
    }

    pub fn pairs(&self) -> u64 {
        self.pairs
    }
}

impl OutputPlugin for EventCounter {
    fn name(&self) -> &'static str {
        "EventCounter"
    }

    fn on_event(&mut self, ev: &Event, _particles: &[Particle]) {
        let t = ev.time_f64();
        if t < self.last_time {
            self.reverse_events += 1;
        } else {
            self.last_time = t;
        }
        match ev.kind {
            EventKind::Pair { .. } => self.pairs += 1,
            EventKind::CellCross { .. } => self.cell_crossings += 1,
            EventKind::Thermostat => self.thermostat += 1,
            EventKind::Rebuild => self.rebuilds += 1,
            EventKind::Halt => {}
        }
    }

    fn summary(&self) -> String {
        format!(
            "pairs {} cell crossings {} thermostat {} rebuilds {} reverse {}",
            self.pairs, self.cell_crossings, self.thermostat, self.rebuilds, self.reverse_events
        )
    }
}

/// Samples the instantaneous kinetic temperature every `interval` events.
#[derive(Debug)]
pub struct KineticTemperature {
    interval: u64,
    seen: u64,
    samples: Vec<(f64, f64)>,
}

impl KineticTemperature {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            seen: 0,
            samples: Vec::new(),
        }
    }

    pub fn samples(&self) -> &[(f64, f64)] {
        &self.samples
    }

    fn temperature(particles: &[Particle]) -> f64 {
        if particles.is_empty() {
            return 0.0;
        }
        let twice_ke: f64 = particles.iter().map(|p| 2.0 * p.kinetic_energy()).sum();
        twice_ke / (3.0 * particles.len() as f64)
    }
}

impl OutputPlugin for KineticTemperature {
    fn name(&self) -> &'static str {
        "KineticTemperature"
    }

    fn on_event(&mut self, ev: &Event, particles: &[Particle]) {
        self.seen += 1;
        if self.seen % self.interval == 0 {
            self.samples
                .push((ev.time_f64(), Self::temperature(particles)));
        }
    }

    fn summary(&self) -> String {
        let mean = if self.samples.is_empty() {
            0.0
        } else {
            self.samples.iter().map(|(_, t)| t).sum::<f64>() / self.samples.len() as f64
        };
        format!("{} samples, mean T {:.6}", self.samples.len(), mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::CrossDir;

    fn pair_at(t: f64) -> Event {
        Event::new(
            t,
            EventKind::Pair {
                a: 0,
                b: 1,
                dir: CrossDir::Inward,
                shell: 0,
            },
            0,
            Some(0),
        )
        .unwrap()
    }

    #[test]
    fn counter_tallies_kinds_and_reversals() {
        let mut c = EventCounter::new();
        c.on_event(&pair_at(1.0), &[]);
        c.on_event(&pair_at(2.0), &[]);
        // Time running backwards is counted, not silently absorbed.
        c.on_event(&pair_at(1.5), &[]);
        assert_eq!(c.pairs(), 3);
        assert_eq!(c.reverse_events(), 1);
        assert!(c.summary().contains("pairs 3"));
    }

    #[test]
    fn temperature_of_a_known_state() {
        let particles = vec![
            Particle::new(0, 0, [0.0; 3], [1.0, 0.0, 0.0], 1.0).unwrap(),
            Particle::new(1, 0, [0.0; 3], [-1.0, 0.0, 0.0], 1.0).unwrap(),
        ];
        let mut kt = KineticTemperature::new(1);
        kt.on_event(&pair_at(1.0), &particles);
        // 2 KE / (3 N) = 2 / 6.
        assert!((kt.samples()[0].1 - 1.0 / 3.0).abs() < 1e-12);
    }
}
