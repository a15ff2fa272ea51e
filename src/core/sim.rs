//! The simulation root and its event loop.
//!
//! One instance owns all state; components never hold references back.
//! Each step pops the globally earliest PEL head, discards it if its
//! freshness tokens mismatch (the only cancellation path), and otherwise
//! streams the participants to the event time, applies the impulse, and
//! repredicts every particle whose trajectory changed.

use crate::boundary::Boundary;
use crate::capture::{CaptureMap, EPS_CAP};
use crate::core::event::{Event, EventKind};
use crate::core::particle::Particle;
use crate::dynamics::Dynamics;
use crate::error::{Error, Result};
use crate::interaction::{Crossing, Interaction, PairState, Registry, ResolveKind};
use crate::math;
use crate::neighbour::Neighbourhood;
use crate::output::OutputPlugin;
use crate::scheduler::{self, EventSorter, OwnerId, SorterKind};
use crate::system::{Andersen, Ensemble, SystemProcess};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

/// How far to drive a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunLength {
    /// Until the clock reaches this absolute time.
    Time(f64),
    /// For this many executed events.
    Events(u64),
}

/// What one call to `step` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed,
    Halted,
    LimitReached,
    /// Nothing left to schedule.
    Idle,
}

#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub executed: u64,
    pub stale: u64,
    pub pair_events: u64,
    pub cell_crossings: u64,
    pub thermostat_firings: u64,
    pub captures: u64,
    pub releases: u64,
    pub bounces: u64,
    pub reflections: u64,
    pub reverse_events: u64,
    pub capture_repairs: u64,
    pub rebuilds: u64,
}

/// Everything needed to assemble a simulation.
pub struct SimulationParts {
    pub particles: Vec<Particle>,
    pub boundary: Boundary,
    pub dynamics: Dynamics,
    pub registry: Registry,
    pub systems: Vec<SystemProcess>,
    pub ensemble: Ensemble,
    pub sorter: SorterKind,
    pub overlap_squash: bool,
    pub seed: u64,
}

pub struct Simulation {
    time: f64,
    pub particles: Vec<Particle>,
    boundary: Boundary,
    dynamics: Dynamics,
    registry: Registry,
    captures: CaptureMap,
    neighbourhood: Neighbourhood,
    sorter: Box<dyn EventSorter>,
    systems: Vec<SystemProcess>,
    ensemble: Ensemble,
    sorter_kind: SorterKind,
    overlap_squash: bool,
    seed: u64,
    rng: StdRng,
    plugins: Vec<Box<dyn OutputPlugin>>,
    stats: RunStats,
    trace: Option<Vec<(f64, EventKind)>>,
    /// Reused neighbour scratch; the hot path must not allocate.
    scratch: Vec<u32>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("time", &self.time)
            .field("particles", &self.particles.len())
            .field("ensemble", &self.ensemble)
            .finish()
    }
}

impl Simulation {
    pub fn new(parts: SimulationParts) -> Result<Self> {
        let SimulationParts {
            mut particles,
            boundary,
            dynamics,
            registry,
            mut systems,
            ensemble,
            sorter,
            overlap_squash,
            seed,
        } = parts;

        if particles.is_empty() {
            return Err(Error::Config("a simulation needs particles".into()));
        }
        for p in &particles {
            if p.species as usize >= registry.n_species() {
                return Err(Error::Config(format!(
                    "particle {} has species {} but only {} are configured",
                    p.id,
                    p.species,
                    registry.n_species()
                )));
            }
        }

        for (slot, p) in particles.iter_mut().enumerate() {
            if p.id as usize != slot {
                return Err(Error::Config(format!(
                    "particle ids must be dense and ordered; found {} at slot {slot}",
                    p.id
                )));
            }
            boundary.wrap(&mut p.r, &mut p.v, 0.0);
        }

        let neighbourhood = Neighbourhood::build(&boundary, registry.max_distance(), &particles)?;
        let n = particles.len();
        let mut sim = Self {
            time: 0.0,
            particles,
            boundary,
            dynamics,
            registry,
            captures: CaptureMap::new(),
            neighbourhood,
            sorter: scheduler::build(sorter, n + systems.len() + 1),
            systems: Vec::new(),
            ensemble,
            sorter_kind: sorter,
            overlap_squash,
            seed,
            rng: StdRng::seed_from_u64(seed),
            plugins: Vec::new(),
            stats: RunStats::default(),
            trace: None,
            scratch: Vec::new(),
        };

        let overlapped = sim.init_captures(overlap_squash)?;
        if overlapped {
            warn!("overlaps squashed; scheduling a capture rebuild");
            systems.push(SystemProcess::Rebuild { at: 0.0 });
            // An extra owner slot was reserved above for exactly this.
        }
        sim.systems = systems;

        for i in 0..n as u32 {
            sim.predict_initial_for(i)?;
        }
        for k in 0..sim.systems.len() {
            let ev = sim.systems[k].initial_event(0.0, n, &mut sim.rng)?;
            sim.sorter.push(n + k, ev);
        }
        sim.sorter.rebuild();
        Ok(sim)
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn ensemble(&self) -> Ensemble {
        self.ensemble
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn dynamics(&self) -> &Dynamics {
        &self.dynamics
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn systems(&self) -> &[SystemProcess] {
        &self.systems
    }

    pub fn sorter_kind(&self) -> SorterKind {
        self.sorter_kind
    }

    pub fn overlap_squash(&self) -> bool {
        self.overlap_squash
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn capture_state(&self, a: u32, b: u32) -> Option<u32> {
        self.captures.get(a, b)
    }

    pub fn add_plugin(&mut self, plugin: Box<dyn OutputPlugin>) {
        self.plugins.push(plugin);
    }

    pub fn plugins(&self) -> &[Box<dyn OutputPlugin>] {
        &self.plugins
    }

    /// Record `(time, kind)` of every executed event (determinism tests and
    /// debugging; off by default).
    pub fn enable_trace(&mut self) {
        self.trace = Some(Vec::new());
    }

    pub fn trace(&self) -> &[(f64, EventKind)] {
        self.trace.as_deref().unwrap_or(&[])
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(Particle::kinetic_energy).sum()
    }

    /// Kinetic plus capture potential energy.
    pub fn total_energy(&self) -> f64 {
        let mut e = self.kinetic_energy();
        for ((a, b), shell) in self.captures.iter() {
            let (sa, sb) = (
                self.particles[a as usize].species,
                self.particles[b as usize].species,
            );
            if let Some(interaction) = self.registry.lookup(sa, sb) {
                e += interaction.pair_energy(Some(shell));
            }
        }
        e
    }

    pub fn momentum(&self) -> math::Vec3 {
        let mut p = [0.0; 3];
        for particle in &self.particles {
            p = math::add(&p, &particle.momentum());
        }
        p
    }

    /// Positions streamed to the current clock and folded into the primary
    /// cell, without touching simulation state.
    pub fn positions_now(&self) -> Vec<math::Vec3> {
        self.particles
            .iter()
            .map(|p| {
                let mut r = p.pos_at(self.time);
                let mut v = p.v;
                self.boundary.wrap(&mut r, &mut v, self.time);
                r
            })
            .collect()
    }

    /// Velocities consistent with `positions_now` (Lees-Edwards wraps
    /// adjust the x component).
    pub fn velocities_now(&self) -> Vec<math::Vec3> {
        self.particles
            .iter()
            .map(|p| {
                let mut r = p.pos_at(self.time);
                let mut v = p.v;
                self.boundary.wrap(&mut r, &mut v, self.time);
                v
            })
            .collect()
    }

    /// Drive the loop until the run length is exhausted, a halt fires, or
    /// the FEL drains.
    pub fn run(&mut self, length: RunLength) -> Result<RunStats> {
        let (max_events, t_limit) = match length {
            RunLength::Time(t) => (u64::MAX, Some(t)),
            RunLength::Events(n) => (n, None),
        };
        let started = std::time::Instant::now();
        let (executed, _) = self.run_events_until(max_events, t_limit)?;
        info!(
            events = executed,
            stale = self.stats.stale,
            sim_time = self.time,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        for plugin in &self.plugins {
            info!(plugin = plugin.name(), "{}", plugin.summary());
        }
        Ok(self.stats.clone())
    }

    /// Execute up to `max_events` events, optionally bounded by an absolute
    /// time; reports how many ran and why the loop stopped.
    pub fn run_events_until(
        &mut self,
        max_events: u64,
        t_limit: Option<f64>,
    ) -> Result<(u64, StepOutcome)> {
        let mut executed = 0u64;
        while executed < max_events {
            match self.step(t_limit)? {
                StepOutcome::Executed => executed += 1,
                outcome => return Ok((executed, outcome)),
            }
        }
        Ok((executed, StepOutcome::Executed))
    }

    /// Execute the next fresh event, if any at or before `t_limit`.
    pub fn step(&mut self, t_limit: Option<f64>) -> Result<StepOutcome> {
        loop {
            let Some((owner, ev)) = self.sorter.next() else {
                if let Some(limit) = t_limit {
                    if limit > self.time {
                        self.advance_clock(limit);
                    }
                }
                return Ok(StepOutcome::Idle);
            };
            let t_ev = ev.time_f64();
            if let Some(limit) = t_limit {
                if t_ev > limit {
                    if limit > self.time {
                        self.advance_clock(limit);
                    }
                    return Ok(StepOutcome::LimitReached);
                }
            }
            if !self.event_fresh(&ev) {
                self.sorter.pop_next_pel_event(owner);
                self.stats.stale += 1;
                continue;
            }
            // Freshness soundness: no executed event may carry a token
            // mismatch.
            debug_assert!(self.event_fresh(&ev));

            // Clamp roundoff-reversed times to the clock; the counter
            // plugin still sees the original time.
            let t_exec = if t_ev < self.time {
                self.stats.reverse_events += 1;
                self.time
            } else {
                t_ev
            };

            let outcome = self.execute(owner, ev, t_exec)?;
            self.stats.executed += 1;
            self.notify(&ev);
            return Ok(outcome);
        }
    }

    fn advance_clock(&mut self, to: f64) {
        let dt = to - self.time;
        self.time = to;
        self.sorter.stream(dt);
    }

    fn event_fresh(&self, ev: &Event) -> bool {
        match ev.kind {
            EventKind::Pair { a, b, .. } => ev.is_fresh(
                self.particles[a as usize].token,
                Some(self.particles[b as usize].token),
            ),
            EventKind::CellCross { p, .. } => {
                ev.is_fresh(self.particles[p as usize].token, None)
            }
            _ => true,
        }
    }

    fn execute(&mut self, owner: OwnerId, ev: Event, t_exec: f64) -> Result<StepOutcome> {
        self.sorter.pop_next_pel_event(owner);
        match ev.kind {
            EventKind::Pair { a, b, dir, shell } => {
                self.execute_pair(a, b, Crossing { dt: 0.0, shell, dir }, t_exec)?;
            }
            EventKind::CellCross { p, face } => {
                self.execute_cell_cross(p, face, t_exec)?;
            }
            EventKind::Thermostat => {
                self.execute_thermostat(owner, t_exec)?;
            }
            EventKind::Rebuild => {
                self.rebuild_from_geometry(t_exec)?;
            }
            EventKind::Halt => {
                self.advance_clock(t_exec);
                return Ok(StepOutcome::Halted);
            }
        }
        Ok(StepOutcome::Executed)
    }

    fn execute_pair(&mut self, a: u32, b: u32, crossing: Crossing, t_exec: f64) -> Result<()> {
        let (ai, bi) = (a as usize, b as usize);
        self.particles[ai].stream_to(t_exec);
        self.particles[bi].stream_to(t_exec);

        let (sa, sb) = (self.particles[ai].species, self.particles[bi].species);
        let interaction = self.registry.lookup(sa, sb).ok_or_else(|| {
            Error::Numerical(format!(
                "pair event for species ({sa}, {sb}) with no interaction"
            ))
        })?;

        let (dr, dvc) = self.boundary.delta(
            math::sub(&self.particles[ai].r, &self.particles[bi].r),
            t_exec,
        );
        let dv = math::add(
            &math::sub(&self.particles[ai].v, &self.particles[bi].v),
            &dvc,
        );
        let dist = math::norm(&dr);
        let state = self.captures.get(a, b);

        // Capture agreement: the pair must sit on the predicted
        // discontinuity and in the capture state the prediction assumed.
        // Violations are expected truncation drift and repaired locally.
        let radius = self
            .dynamics
            .radius_at(interaction.crossing_radius(&crossing), t_exec);
        let tol = EPS_CAP * radius.max(1.0);
        if (dist - radius).abs() > tol || state != Interaction::state_before(&crossing) {
            self.stats.capture_repairs += 1;
            warn!(
                a,
                b,
                dist,
                radius,
                ?state,
                "capture state disagrees with geometry; rebuilding the pair"
            );
            self.advance_clock(t_exec);
            self.repair_pair(a, b, t_exec)?;
            return Ok(());
        }

        let (ma, mb) = (self.particles[ai].mass, self.particles[bi].mass);
        let pair_state = PairState {
            dr,
            dv,
            mu: ma * mb / (ma + mb),
            now: t_exec,
        };
        let resolution = interaction.resolve(&pair_state, state, &crossing, &self.dynamics)?;
        if !resolution.impulse.is_finite() {
            return Err(Error::Numerical(format!(
                "non-finite impulse for pair ({a}, {b}) at t = {t_exec}: \
                 dr = {dr:?}, dv = {dv:?}"
            )));
        }

        let n = math::scale(&dr, 1.0 / dist);
        for k in 0..3 {
            self.particles[ai].v[k] += resolution.impulse / ma * n[k];
            self.particles[bi].v[k] -= resolution.impulse / mb * n[k];
        }
        self.captures.set(a, b, resolution.new_state);

        match resolution.kind {
            ResolveKind::Capture => self.stats.captures += 1,
            ResolveKind::Release => self.stats.releases += 1,
            ResolveKind::Bounce => self.stats.bounces += 1,
            ResolveKind::Reflect => self.stats.reflections += 1,
        }
        self.stats.pair_events += 1;

        self.advance_clock(t_exec);
        // Both tokens bump before either side repredicts, so the fresh
        // predictions carry the final token pair.
        self.particles[ai].bump_token();
        self.particles[bi].bump_token();
        self.sorter.clear_pel(ai);
        self.sorter.clear_pel(bi);
        self.predict_all_for(a)?;
        self.predict_all_for(b)?;
        Ok(())
    }

    fn execute_cell_cross(&mut self, p: u32, face: u8, t_exec: f64) -> Result<()> {
        let pi = p as usize;
        self.particles[pi].stream_to(t_exec);
        let wrapped = self.neighbourhood.apply_crossing(p, face);
        if wrapped {
            let particle = &mut self.particles[pi];
            self.boundary
                .wrap(&mut particle.r, &mut particle.v, t_exec);
        }
        self.stats.cell_crossings += 1;
        self.advance_clock(t_exec);
        self.invalidate_and_repredict(p)?;
        Ok(())
    }

    fn execute_thermostat(&mut self, owner: OwnerId, t_exec: f64) -> Result<()> {
        let n = self.particles.len();
        let andersen = match self.systems.get(owner - n) {
            Some(SystemProcess::Andersen(a)) => *a,
            _ => {
                return Err(Error::Numerical(
                    "thermostat event scheduled without a thermostat".into(),
                ))
            }
        };
        let victim = andersen.pick(n, &mut self.rng);
        let vi = victim as usize;
        self.particles[vi].stream_to(t_exec);
        andersen.resample(&mut self.particles[vi], &mut self.rng);
        self.stats.thermostat_firings += 1;

        self.advance_clock(t_exec);
        self.invalidate_and_repredict(victim)?;
        let next = Event::new(
            andersen.next_firing(t_exec, n, &mut self.rng),
            EventKind::Thermostat,
            0,
            None,
        )?;
        self.sorter.push(owner, next);
        Ok(())
    }

    /// Re-derive every capture state from geometry and repredict the world.
    fn rebuild_from_geometry(&mut self, t_exec: f64) -> Result<()> {
        self.stats.rebuilds += 1;
        for p in &mut self.particles {
            p.stream_to(t_exec);
        }
        let time = t_exec;
        for p in &mut self.particles {
            self.boundary.wrap(&mut p.r, &mut p.v, time);
            p.bump_token();
        }
        self.neighbourhood.rebuild(&self.particles);
        self.advance_clock(t_exec);
        self.captures.clear();
        self.init_captures(true)?;
        for i in 0..self.particles.len() {
            self.sorter.clear_pel(i);
        }
        for i in 0..self.particles.len() as u32 {
            self.predict_all_for(i)?;
        }
        Ok(())
    }

    /// Capture/overlap scan over all in-range pairs. Returns whether any
    /// hard-core overlap was found (fatal unless `squash`).
    fn init_captures(&mut self, squash: bool) -> Result<bool> {
        let n = self.particles.len();
        let mut overlapped = false;
        let mut scratch = std::mem::take(&mut self.scratch);
        for i in 0..n as u32 {
            self.neighbourhood.neighbours_into(i, n, &mut scratch);
            for &j in &scratch {
                if j <= i {
                    continue;
                }
                let (sa, sb) = (
                    self.particles[i as usize].species,
                    self.particles[j as usize].species,
                );
                let Some(interaction) = self.registry.lookup(sa, sb) else {
                    continue;
                };
                let (dr, _) = self.boundary.delta(
                    math::sub(
                        &self.particles[i as usize].pos_at(self.time),
                        &self.particles[j as usize].pos_at(self.time),
                    ),
                    self.time,
                );
                let dist = math::norm(&dr);
                if let Some(core) = interaction.core_distance() {
                    let core_eff = self.dynamics.radius_at(core, self.time);
                    if dist < core_eff * (1.0 - EPS_CAP) {
                        if !squash {
                            self.scratch = scratch;
                            return Err(Error::Overlap(format!(
                                "particles {i} and {j} at separation {dist} inside the \
                                 hard core {core_eff}"
                            )));
                        }
                        overlapped = true;
                    }
                }
                if interaction.is_bonded() {
                    if dist >= interaction.max_distance() {
                        if !squash {
                            self.scratch = scratch;
                            return Err(Error::Overlap(format!(
                                "bonded pair ({i}, {j}) at separation {dist} outside the \
                                 bond range {}",
                                interaction.max_distance()
                            )));
                        }
                        overlapped = true;
                    }
                    self.captures.set(i, j, Some(0));
                } else {
                    self.captures.set(i, j, interaction.capture_test(dist));
                }
            }
        }
        self.scratch = scratch;
        Ok(overlapped)
    }

    /// Reinitialise one pair's capture state from geometry and repredict
    /// both participants. Recovered, not surfaced.
    fn repair_pair(&mut self, a: u32, b: u32, now: f64) -> Result<()> {
        let (sa, sb) = (
            self.particles[a as usize].species,
            self.particles[b as usize].species,
        );
        if let Some(interaction) = self.registry.lookup(sa, sb) {
            let (dr, _) = self.boundary.delta(
                math::sub(
                    &self.particles[a as usize].pos_at(now),
                    &self.particles[b as usize].pos_at(now),
                ),
                now,
            );
            let state = if interaction.is_bonded() {
                Some(0)
            } else {
                interaction.capture_test(math::norm(&dr))
            };
            self.captures.set(a, b, state);
        }
        self.particles[a as usize].bump_token();
        self.particles[b as usize].bump_token();
        self.sorter.clear_pel(a as usize);
        self.sorter.clear_pel(b as usize);
        self.predict_all_for(a)?;
        self.predict_all_for(b)
    }

    /// Token bump, PEL wipe, full reprediction for one particle.
    fn invalidate_and_repredict(&mut self, p: u32) -> Result<()> {
        self.particles[p as usize].bump_token();
        self.sorter.clear_pel(p as usize);
        self.predict_all_for(p)
    }

    /// Predict pair events against the current neighbourhood plus the next
    /// cell crossing.
    fn predict_all_for(&mut self, p: u32) -> Result<()> {
        let n = self.particles.len();
        let mut scratch = std::mem::take(&mut self.scratch);
        self.neighbourhood.neighbours_into(p, n, &mut scratch);
        for &j in &scratch {
            if let Some(ev) = self.predict_pair(p, j)? {
                self.sorter.push(p as usize, ev);
            }
        }
        self.scratch = scratch;
        self.predict_cell_crossing(p)?;
        Ok(())
    }

    /// Initial scheduling: each unordered pair once, plus the crossing.
    fn predict_initial_for(&mut self, p: u32) -> Result<()> {
        let n = self.particles.len();
        let mut scratch = std::mem::take(&mut self.scratch);
        self.neighbourhood.neighbours_into(p, n, &mut scratch);
        for &j in &scratch {
            if j > p {
                if let Some(ev) = self.predict_pair(p, j)? {
                    self.sorter.push(p as usize, ev);
                }
            }
        }
        self.scratch = scratch;
        self.predict_cell_crossing(p)?;
        Ok(())
    }

    fn predict_cell_crossing(&mut self, p: u32) -> Result<()> {
        if let Some((dt, face)) = self
            .neighbourhood
            .crossing(&self.particles[p as usize], self.time)
        {
            let ev = Event::new(
                self.time + dt,
                EventKind::CellCross { p, face },
                self.particles[p as usize].token,
                None,
            )?;
            self.sorter.push(p as usize, ev);
        }
        Ok(())
    }

    fn predict_pair(&self, a: u32, b: u32) -> Result<Option<Event>> {
        let (ai, bi) = (a as usize, b as usize);
        let (pa, pb) = (&self.particles[ai], &self.particles[bi]);
        let Some(interaction) = self.registry.lookup(pa.species, pb.species) else {
            return Ok(None);
        };
        let (dr, dvc) = self
            .boundary
            .delta(math::sub(&pa.pos_at(self.time), &pb.pos_at(self.time)), self.time);
        let dv = math::add(&math::sub(&pa.v, &pb.v), &dvc);
        if !math::is_finite(&dr) || !math::is_finite(&dv) {
            return Err(Error::Numerical(format!(
                "non-finite pair state for ({a}, {b}): dr = {dr:?}, dv = {dv:?}"
            )));
        }
        let state = self.captures.get(a, b);
        let pair_state = PairState {
            dr,
            dv,
            mu: pa.mass * pb.mass / (pa.mass + pb.mass),
            now: self.time,
        };
        let Some(crossing) = interaction.predict(&pair_state, state, &self.dynamics) else {
            return Ok(None);
        };
        let ev = Event::new(
            self.time + crossing.dt,
            EventKind::Pair {
                a,
                b,
                dir: crossing.dir,
                shell: crossing.shell,
            },
            pa.token,
            Some(pb.token),
        )?;
        Ok(Some(ev))
    }

    fn notify(&mut self, ev: &Event) {
        if let Some(trace) = &mut self.trace {
            trace.push((ev.time_f64(), ev.kind));
        }
        if self.plugins.is_empty() {
            return;
        }
        let mut plugins = std::mem::take(&mut self.plugins);
        for plugin in &mut plugins {
            plugin.on_event(ev, &self.particles);
        }
        self.plugins = plugins;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::HardSphere;

    fn two_spheres(r0: math::Vec3, v0: math::Vec3, r1: math::Vec3, v1: math::Vec3) -> Simulation {
        let mut registry = Registry::new(1);
        registry
            .register(0, 0, Interaction::HardSphere(HardSphere::new(1.0).unwrap()))
            .unwrap();
        Simulation::new(SimulationParts {
            particles: vec![
                Particle::new(0, 0, r0, v0, 1.0).unwrap(),
                Particle::new(1, 0, r1, v1, 1.0).unwrap(),
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
        .unwrap()
    }

    #[test]
    fn head_on_spheres_swap_velocities() -> Result<()> {
        let mut sim = two_spheres(
            [4.0, 5.0, 5.0],
            [1.0, 0.0, 0.0],
            [6.0, 5.0, 5.0],
            [-1.0, 0.0, 0.0],
        );
        sim.run(RunLength::Time(0.6))?;
        assert!((sim.time() - 0.6).abs() < 1e-12);
        assert!((sim.particles[0].v[0] - -1.0).abs() < 1e-12);
        assert!((sim.particles[1].v[0] - 1.0).abs() < 1e-12);
        assert_eq!(sim.stats().pair_events, 1);
        assert_eq!(sim.stats().bounces, 1);
        Ok(())
    }

    #[test]
    fn overlapping_start_is_fatal_without_squash() {
        let mut registry = Registry::new(1);
        registry
            .register(0, 0, Interaction::HardSphere(HardSphere::new(1.0).unwrap()))
            .unwrap();
        let err = Simulation::new(SimulationParts {
            particles: vec![
                Particle::new(0, 0, [5.0, 5.0, 5.0], [0.0; 3], 1.0).unwrap(),
                Particle::new(1, 0, [5.4, 5.0, 5.0], [0.0; 3], 1.0).unwrap(),
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
        .unwrap_err();
        assert!(matches!(err, Error::Overlap(_)));
    }

    #[test]
    fn halt_event_terminates_the_loop() -> Result<()> {
        let mut registry = Registry::new(1);
        registry.register(0, 0, Interaction::HardSphere(HardSphere::new(1.0)?))?;
        let mut sim = Simulation::new(SimulationParts {
            particles: vec![Particle::new(0, 0, [5.0, 5.0, 5.0], [1.0, 0.0, 0.0], 1.0)?],
            boundary: Boundary::Periodic {
                box_len: [10.0, 10.0, 10.0],
            },
            dynamics: Dynamics::Newtonian,
            registry,
            systems: vec![SystemProcess::Halt { t_end: 2.5 }],
            ensemble: Ensemble::Nve,
            sorter: SorterKind::Heap,
            overlap_squash: false,
            seed: 1,
        })?;
        sim.run(RunLength::Events(u64::MAX))?;
        assert!((sim.time() - 2.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn stale_events_are_discarded_not_executed() -> Result<()> {
        // A three-body line: the middle particle's first collision
        // invalidates the outer pair's prediction against it.
        let mut registry = Registry::new(1);
        registry.register(0, 0, Interaction::HardSphere(HardSphere::new(1.0)?))?;
        let mut sim = Simulation::new(SimulationParts {
            particles: vec![
                Particle::new(0, 0, [3.0, 5.0, 5.0], [1.0, 0.0, 0.0], 1.0)?,
                Particle::new(1, 0, [5.0, 5.0, 5.0], [0.0, 0.0, 0.0], 1.0)?,
                Particle::new(2, 0, [7.0, 5.0, 5.0], [-1.0, 0.0, 0.0], 1.0)?,
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
        })?;
        sim.run(RunLength::Time(3.0))?;
        // The cradle relays the impulse through the middle particle; no
        // stale prediction may fire as a real collision.
        assert!(sim.stats().pair_events >= 3);
        assert!((sim.particles[0].v[0] - -1.0).abs() < 1e-12);
        assert!((sim.particles[1].v[0]).abs() < 1e-12);
        assert!((sim.particles[2].v[0] - 1.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn time_limited_run_streams_the_clock() -> Result<()> {
        let mut sim = two_spheres(
            [4.0, 5.0, 5.0],
            [0.1, 0.0, 0.0],
            [6.0, 5.0, 5.0],
            [0.1, 0.0, 0.0],
        );
        sim.run(RunLength::Time(1.5))?;
        assert!((sim.time() - 1.5).abs() < 1e-12);
        let r = sim.positions_now();
        assert!((r[0][0] - 4.15).abs() < 1e-12);
        Ok(())
    }
}
