//! XML configuration documents.
//!
//! One `<Simulation>` tree carries the ensemble, scheduler choice, boundary
//! condition, dynamics, interactions (with nested potentials), system
//! processes, and the particle array. The writer emits a fixed field order
//! and shortest-round-trip floats, so writing a snapshot and reparsing it
//! reproduces the state bit for bit.

use crate::boundary::Boundary;
use crate::core::particle::Particle;
use crate::core::sim::{Simulation, SimulationParts};
use crate::dynamics::Dynamics;
use crate::error::{Error, Result};
use crate::interaction::{HardSphere, Interaction, Registry, SquareBond, SquareWell, SteppedInteraction};
use crate::math::Vec3;
use crate::potential::{LennardJones, Potential, RMode, Stepped, UMode};
use crate::scheduler::SorterKind;
use crate::system::{Andersen, Ensemble, SystemProcess};
use quick_xml::events::{BytesEnd, BytesStart, Event as XmlEvent};
use quick_xml::{Reader, Writer};
use std::path::Path;

/// One interaction bound to an unordered species pair.
#[derive(Debug, Clone)]
pub struct InteractionSpec {
    pub species_a: u32,
    pub species_b: u32,
    pub interaction: Interaction,
}

#[derive(Debug, Clone, Copy)]
pub struct ParticleSpec {
    pub id: u32,
    pub species: u32,
    pub mass: f64,
    pub r: Vec3,
    pub v: Vec3,
}

/// A parsed configuration document.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub ensemble: Ensemble,
    pub sorter: SorterKind,
    pub boundary: Boundary,
    pub dynamics: Dynamics,
    pub interactions: Vec<InteractionSpec>,
    pub systems: Vec<SystemProcess>,
    pub particles: Vec<ParticleSpec>,
    pub overlap_squash: bool,
}

impl SimConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_str(&text)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_xml_string()?)?;
        Ok(())
    }

    /// Cross-check the ensemble label against the configured systems and
    /// dynamics, the way the original groups its ensembles.
    pub fn validate(&self) -> Result<()> {
        let has_thermostat = self
            .systems
            .iter()
            .any(|s| matches!(s, SystemProcess::Andersen(_)));
        let compressing = matches!(self.dynamics, Dynamics::Compression { .. });
        let shearing = matches!(self.boundary, Boundary::LeesEdwards { .. });
        match self.ensemble {
            Ensemble::Nvt if !has_thermostat => Err(Error::Config(
                "NVT ensemble needs an Andersen thermostat system".into(),
            )),
            Ensemble::NvShear if !shearing => Err(Error::Config(
                "NVShear ensemble needs Lees-Edwards boundary conditions".into(),
            )),
            Ensemble::NeCompression | Ensemble::NtCompression if !compressing => {
                Err(Error::Config(
                    "compression ensembles need compression dynamics".into(),
                ))
            }
            Ensemble::NtCompression if !has_thermostat => Err(Error::Config(
                "NTCompression ensemble needs an Andersen thermostat system".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Assemble a runnable simulation.
    pub fn build(&self, seed: u64) -> Result<Simulation> {
        self.validate()?;
        if self.particles.is_empty() {
            return Err(Error::Config("configuration has no particles".into()));
        }
        let n_species = self
            .particles
            .iter()
            .map(|p| p.species)
            .chain(
                self.interactions
                    .iter()
                    .flat_map(|i| [i.species_a, i.species_b]),
            )
            .max()
            .unwrap_or(0) as usize
            + 1;
        let mut registry = Registry::new(n_species);
        for spec in &self.interactions {
            registry.register(spec.species_a, spec.species_b, spec.interaction.clone())?;
        }
        let particles = self
            .particles
            .iter()
            .map(|p| Particle::new(p.id, p.species, p.r, p.v, p.mass))
            .collect::<Result<Vec<_>>>()?;
        Simulation::new(SimulationParts {
            particles,
            boundary: self.boundary.clone(),
            dynamics: self.dynamics,
            registry,
            systems: self.systems.clone(),
            ensemble: self.ensemble,
            sorter: self.sorter,
            overlap_squash: self.overlap_squash,
            seed,
        })
    }

    /// Capture the simulation's current state as a document.
    pub fn snapshot(sim: &Simulation) -> Self {
        let positions = sim.positions_now();
        let velocities = sim.velocities_now();
        let particles = sim
            .particles
            .iter()
            .map(|p| ParticleSpec {
                id: p.id,
                species: p.species,
                mass: p.mass,
                r: positions[p.id as usize],
                v: velocities[p.id as usize],
            })
            .collect();
        let interactions = sim
            .registry()
            .pairs()
            .map(|(a, b, interaction)| InteractionSpec {
                species_a: a,
                species_b: b,
                interaction: interaction.clone(),
            })
            .collect();
        Self {
            ensemble: sim.ensemble(),
            sorter: sim.sorter_kind(),
            boundary: sim.boundary().clone(),
            dynamics: *sim.dynamics(),
            interactions,
            systems: sim.systems().to_vec(),
            particles,
            overlap_squash: sim.overlap_squash(),
        }
    }

    pub fn parse_str(text: &str) -> Result<Self> {
        Parser::default().run(text)
    }

    pub fn to_xml_string(&self) -> Result<String> {
        let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);

        let mut root = BytesStart::new("Simulation");
        if self.overlap_squash {
            root.push_attribute(("OverlapSquash", "true"));
        }
        w.write_event(XmlEvent::Start(root))?;

        w.write_event(XmlEvent::Empty(
            BytesStart::new("Ensemble").with_attributes([("Type", self.ensemble.as_str())]),
        ))?;

        w.write_event(XmlEvent::Start(BytesStart::new("Scheduler")))?;
        let sorter = match self.sorter {
            SorterKind::Heap => "Heap",
            SorterKind::CalendarQueue => "CalendarQueue",
        };
        w.write_event(XmlEvent::Empty(
            BytesStart::new("Sorter").with_attributes([("Type", sorter)]),
        ))?;
        w.write_event(XmlEvent::End(BytesEnd::new("Scheduler")))?;

        let mut bc = BytesStart::new("BC");
        match &self.boundary {
            Boundary::None => bc.push_attribute(("Type", "None")),
            Boundary::Periodic { box_len } => {
                bc.push_attribute(("Type", "Periodic"));
                push_box(&mut bc, box_len);
            }
            Boundary::LeesEdwards {
                box_len,
                shear_rate,
            } => {
                bc.push_attribute(("Type", "LeesEdwards"));
                push_box(&mut bc, box_len);
                bc.push_attribute(("Rate", fmt(*shear_rate).as_str()));
            }
        }
        w.write_event(XmlEvent::Empty(bc))?;

        let mut dynamics = BytesStart::new("Dynamics");
        match self.dynamics {
            Dynamics::Newtonian => dynamics.push_attribute(("Type", "Newtonian")),
            Dynamics::Compression { growth_rate } => {
                dynamics.push_attribute(("Type", "Compression"));
                dynamics.push_attribute(("GrowthRate", fmt(growth_rate).as_str()));
            }
        }
        w.write_event(XmlEvent::Empty(dynamics))?;

        w.write_event(XmlEvent::Start(BytesStart::new("Interactions")))?;
        for spec in &self.interactions {
            write_interaction(&mut w, spec)?;
        }
        w.write_event(XmlEvent::End(BytesEnd::new("Interactions")))?;

        w.write_event(XmlEvent::Start(BytesStart::new("Systems")))?;
        for sys in &self.systems {
            let mut e = BytesStart::new("System");
            match sys {
                SystemProcess::Andersen(a) => {
                    e.push_attribute(("Type", "Andersen"));
                    e.push_attribute(("Rate", fmt(a.rate).as_str()));
                    e.push_attribute(("Temperature", fmt(a.temperature).as_str()));
                }
                SystemProcess::Halt { t_end } => {
                    e.push_attribute(("Type", "Halt"));
                    e.push_attribute(("Time", fmt(*t_end).as_str()));
                }
                SystemProcess::Rebuild { at } => {
                    e.push_attribute(("Type", "Rebuild"));
                    e.push_attribute(("Time", fmt(*at).as_str()));
                }
            }
            w.write_event(XmlEvent::Empty(e))?;
        }
        w.write_event(XmlEvent::End(BytesEnd::new("Systems")))?;

        w.write_event(XmlEvent::Start(BytesStart::new("Particles")))?;
        for p in &self.particles {
            let mut e = BytesStart::new("Pt");
            e.push_attribute(("ID", p.id.to_string().as_str()));
            e.push_attribute(("Species", p.species.to_string().as_str()));
            e.push_attribute(("Mass", fmt(p.mass).as_str()));
            for (name, value) in [("X", p.r[0]), ("Y", p.r[1]), ("Z", p.r[2])] {
                e.push_attribute((name, fmt(value).as_str()));
            }
            for (name, value) in [("VX", p.v[0]), ("VY", p.v[1]), ("VZ", p.v[2])] {
                e.push_attribute((name, fmt(value).as_str()));
            }
            w.write_event(XmlEvent::Empty(e))?;
        }
        w.write_event(XmlEvent::End(BytesEnd::new("Particles")))?;

        w.write_event(XmlEvent::End(BytesEnd::new("Simulation")))?;
        String::from_utf8(w.into_inner())
            .map_err(|e| Error::Config(format!("generated configuration is not UTF-8: {e}")))
    }
}

/// Shortest round-trip float formatting.
fn fmt(v: f64) -> String {
    format!("{v}")
}

fn push_box(e: &mut BytesStart, box_len: &Vec3) {
    e.push_attribute(("LX", fmt(box_len[0]).as_str()));
    e.push_attribute(("LY", fmt(box_len[1]).as_str()));
    e.push_attribute(("LZ", fmt(box_len[2]).as_str()));
}

fn write_interaction(w: &mut Writer<Vec<u8>>, spec: &InteractionSpec) -> Result<()> {
    let mut e = BytesStart::new("Interaction");
    let species = |e: &mut BytesStart| {
        e.push_attribute(("SpeciesA", spec.species_a.to_string().as_str()));
        e.push_attribute(("SpeciesB", spec.species_b.to_string().as_str()));
    };
    match &spec.interaction {
        Interaction::HardSphere(i) => {
            e.push_attribute(("Type", "HardSphere"));
            species(&mut e);
            e.push_attribute(("Diameter", fmt(i.diameter()).as_str()));
            w.write_event(XmlEvent::Empty(e))?;
        }
        Interaction::SquareWell(i) => {
            e.push_attribute(("Type", "SquareWell"));
            species(&mut e);
            e.push_attribute(("Diameter", fmt(i.diameter()).as_str()));
            e.push_attribute(("Lambda", fmt(i.lambda()).as_str()));
            e.push_attribute(("WellDepth", fmt(i.well_depth()).as_str()));
            w.write_event(XmlEvent::Empty(e))?;
        }
        Interaction::SquareBond(i) => {
            e.push_attribute(("Type", "SquareBond"));
            species(&mut e);
            e.push_attribute(("Diameter", fmt(i.diameter()).as_str()));
            e.push_attribute(("Lambda", fmt(i.lambda()).as_str()));
            w.write_event(XmlEvent::Empty(e))?;
        }
        Interaction::Stepped(i) => {
            e.push_attribute(("Type", "Stepped"));
            species(&mut e);
            w.write_event(XmlEvent::Start(e))?;
            write_potential(w, i.potential())?;
            w.write_event(XmlEvent::End(BytesEnd::new("Interaction")))?;
        }
    }
    Ok(())
}

fn write_potential(w: &mut Writer<Vec<u8>>, potential: &Potential) -> Result<()> {
    match potential {
        Potential::Stepped(s) => {
            let mut e = BytesStart::new("Potential");
            e.push_attribute(("Type", "Stepped"));
            if let Some(core) = s.core() {
                e.push_attribute(("Core", fmt(core).as_str()));
            }
            w.write_event(XmlEvent::Start(e))?;
            for (r, energy) in s.entries() {
                let mut step = BytesStart::new("Step");
                step.push_attribute(("R", fmt(r).as_str()));
                step.push_attribute(("E", fmt(energy).as_str()));
                w.write_event(XmlEvent::Empty(step))?;
            }
            w.write_event(XmlEvent::End(BytesEnd::new("Potential")))?;
        }
        Potential::LennardJones(lj) => {
            let mut e = BytesStart::new("Potential");
            e.push_attribute(("Type", "LennardJones"));
            e.push_attribute(("Sigma", fmt(lj.sigma()).as_str()));
            e.push_attribute(("Epsilon", fmt(lj.epsilon()).as_str()));
            e.push_attribute(("CutOff", fmt(lj.cutoff()).as_str()));
            e.push_attribute(("AttractiveSteps", fmt(lj.attractive_steps()).as_str()));
            let u_mode = match lj.u_mode() {
                UMode::Midpoint => "Midpoint",
                UMode::Left => "Left",
                UMode::Right => "Right",
                UMode::Volume => "Volume",
                UMode::Virial => "Virial",
            };
            e.push_attribute(("UMode", u_mode));
            let r_mode = match lj.r_mode() {
                RMode::DeltaR => "DeltaR",
                RMode::DeltaU => "DeltaU",
            };
            e.push_attribute(("RMode", r_mode));
            if lj.u_mode() == UMode::Virial {
                e.push_attribute(("Temperature", fmt(lj.temperature()).as_str()));
            }
            w.write_event(XmlEvent::Empty(e))?;
        }
    }
    Ok(())
}

/// Streaming parser over the document; tracks just enough nesting for the
/// interaction/potential/step hierarchy.
#[derive(Default)]
struct Parser {
    ensemble: Option<Ensemble>,
    sorter: Option<SorterKind>,
    boundary: Option<Boundary>,
    dynamics: Option<Dynamics>,
    interactions: Vec<InteractionSpec>,
    systems: Vec<SystemProcess>,
    particles: Vec<ParticleSpec>,
    overlap_squash: bool,
    pending: Option<PendingInteraction>,
}

struct PendingInteraction {
    species_a: u32,
    species_b: u32,
    potential: Option<PendingPotential>,
}

enum PendingPotential {
    Stepped {
        core: Option<f64>,
        steps: Vec<(f64, f64)>,
    },
    LennardJones(LennardJones),
}

impl Parser {
    fn run(mut self, text: &str) -> Result<SimConfig> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);
        loop {
            match reader.read_event().map_err(Error::Xml)? {
                XmlEvent::Start(e) => self.element(&e, false)?,
                XmlEvent::Empty(e) => self.element(&e, true)?,
                XmlEvent::End(e) => {
                    if e.name().as_ref() == b"Interaction" {
                        self.finish_interaction()?;
                    }
                }
                XmlEvent::Eof => break,
                _ => {}
            }
        }
        self.finish()
    }

    fn element(&mut self, e: &BytesStart, is_empty: bool) -> Result<()> {
        match e.name().as_ref() {
            b"Simulation" => {
                self.overlap_squash = attr(e, "OverlapSquash")?
                    .map(|v| v == "true")
                    .unwrap_or(false);
            }
            b"Ensemble" => {
                self.ensemble = Some(Ensemble::parse(&req_attr(e, "Type")?)?);
            }
            b"Scheduler" => {}
            b"Sorter" => {
                self.sorter = Some(match req_attr(e, "Type")?.as_str() {
                    "Heap" => SorterKind::Heap,
                    "CalendarQueue" => SorterKind::CalendarQueue,
                    other => {
                        return Err(Error::Config(format!("unknown sorter type \"{other}\"")))
                    }
                });
            }
            b"BC" => {
                self.boundary = Some(match req_attr(e, "Type")?.as_str() {
                    "None" => Boundary::None,
                    "Periodic" => Boundary::Periodic {
                        box_len: read_box(e)?,
                    },
                    "LeesEdwards" => Boundary::LeesEdwards {
                        box_len: read_box(e)?,
                        shear_rate: req_f64(e, "Rate")?,
                    },
                    other => {
                        return Err(Error::Config(format!("unknown BC type \"{other}\"")))
                    }
                });
            }
            b"Dynamics" => {
                self.dynamics = Some(match req_attr(e, "Type")?.as_str() {
                    "Newtonian" => Dynamics::Newtonian,
                    "Compression" => Dynamics::Compression {
                        growth_rate: req_f64(e, "GrowthRate")?,
                    },
                    other => {
                        return Err(Error::Config(format!("unknown dynamics type \"{other}\"")))
                    }
                });
            }
            b"Interactions" | b"Systems" | b"Particles" => {}
            b"Interaction" => {
                self.begin_interaction(e)?;
                // A self-closing element gets no End event; a stepped
                // interaction without children is caught here.
                if is_empty {
                    self.finish_interaction()?;
                }
            }
            b"Potential" => self.begin_potential(e)?,
            b"Step" => {
                let r = req_f64(e, "R")?;
                let energy = req_f64(e, "E")?;
                match &mut self.pending {
                    Some(PendingInteraction {
                        potential: Some(PendingPotential::Stepped { steps, .. }),
                        ..
                    }) => steps.push((r, energy)),
                    _ => {
                        return Err(Error::Config(
                            "<Step> outside a stepped <Potential>".into(),
                        ))
                    }
                }
            }
            b"System" => {
                let system = match req_attr(e, "Type")?.as_str() {
                    "Andersen" => SystemProcess::Andersen(Andersen::new(
                        req_f64(e, "Rate")?,
                        req_f64(e, "Temperature")?,
                    )?),
                    "Halt" => SystemProcess::Halt {
                        t_end: req_f64(e, "Time")?,
                    },
                    "Rebuild" => SystemProcess::Rebuild {
                        at: req_f64(e, "Time")?,
                    },
                    other => {
                        return Err(Error::Config(format!("unknown system type \"{other}\"")))
                    }
                };
                self.systems.push(system);
            }
            b"Pt" => {
                self.particles.push(ParticleSpec {
                    id: req_u32(e, "ID")?,
                    species: attr(e, "Species")?
                        .map(|s| parse_u32(&s, "Species"))
                        .transpose()?
                        .unwrap_or(0),
                    mass: attr(e, "Mass")?
                        .map(|s| parse_f64(&s, "Mass"))
                        .transpose()?
                        .unwrap_or(1.0),
                    r: [req_f64(e, "X")?, req_f64(e, "Y")?, req_f64(e, "Z")?],
                    v: [req_f64(e, "VX")?, req_f64(e, "VY")?, req_f64(e, "VZ")?],
                });
            }
            other => {
                return Err(Error::Config(format!(
                    "unknown element <{}>",
                    String::from_utf8_lossy(other)
                )))
            }
        }
        Ok(())
    }

    fn begin_interaction(&mut self, e: &BytesStart) -> Result<()> {
        let species_a = req_u32(e, "SpeciesA")?;
        let species_b = req_u32(e, "SpeciesB")?;
        match req_attr(e, "Type")?.as_str() {
            "HardSphere" => {
                self.interactions.push(InteractionSpec {
                    species_a,
                    species_b,
                    interaction: Interaction::HardSphere(HardSphere::new(req_f64(
                        e, "Diameter",
                    )?)?),
                });
            }
            "SquareWell" => {
                self.interactions.push(InteractionSpec {
                    species_a,
                    species_b,
                    interaction: Interaction::SquareWell(SquareWell::new(
                        req_f64(e, "Diameter")?,
                        req_f64(e, "Lambda")?,
                        req_f64(e, "WellDepth")?,
                    )?),
                });
            }
            "SquareBond" => {
                self.interactions.push(InteractionSpec {
                    species_a,
                    species_b,
                    interaction: Interaction::SquareBond(SquareBond::new(
                        req_f64(e, "Diameter")?,
                        req_f64(e, "Lambda")?,
                    )?),
                });
            }
            "Stepped" => {
                self.pending = Some(PendingInteraction {
                    species_a,
                    species_b,
                    potential: None,
                });
            }
            other => {
                return Err(Error::Config(format!(
                    "unknown interaction type \"{other}\""
                )))
            }
        }
        Ok(())
    }

    fn begin_potential(&mut self, e: &BytesStart) -> Result<()> {
        let Some(pending) = &mut self.pending else {
            return Err(Error::Config(
                "<Potential> outside a stepped <Interaction>".into(),
            ));
        };
        pending.potential = Some(match req_attr(e, "Type")?.as_str() {
            "Stepped" => PendingPotential::Stepped {
                core: attr(e, "Core")?
                    .map(|s| parse_f64(&s, "Core"))
                    .transpose()?,
                steps: Vec::new(),
            },
            "LennardJones" => {
                let u_mode = match req_attr(e, "UMode")?.as_str() {
                    "Midpoint" => UMode::Midpoint,
                    "Left" => UMode::Left,
                    "Right" => UMode::Right,
                    "Volume" => UMode::Volume,
                    "Virial" => UMode::Virial,
                    other => {
                        return Err(Error::Config(format!("unknown UMode \"{other}\"")))
                    }
                };
                let r_mode = match req_attr(e, "RMode")?.as_str() {
                    "DeltaR" => RMode::DeltaR,
                    "DeltaU" => RMode::DeltaU,
                    other => {
                        return Err(Error::Config(format!("unknown RMode \"{other}\"")))
                    }
                };
                let kt = if u_mode == UMode::Virial {
                    req_f64(e, "Temperature")?
                } else {
                    attr(e, "Temperature")?
                        .map(|s| parse_f64(&s, "Temperature"))
                        .transpose()?
                        .unwrap_or(1.0)
                };
                PendingPotential::LennardJones(LennardJones::new(
                    req_f64(e, "Sigma")?,
                    req_f64(e, "Epsilon")?,
                    req_f64(e, "CutOff")?,
                    req_f64(e, "AttractiveSteps")?,
                    u_mode,
                    r_mode,
                    kt,
                )?)
            }
            other => {
                return Err(Error::Config(format!("unknown potential type \"{other}\"")))
            }
        });
        Ok(())
    }

    fn finish_interaction(&mut self) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        let potential = match pending.potential {
            Some(PendingPotential::Stepped { core, steps }) => {
                Potential::Stepped(Stepped::new(steps, core)?)
            }
            Some(PendingPotential::LennardJones(lj)) => Potential::LennardJones(lj),
            None => {
                return Err(Error::Config(
                    "stepped interaction is missing its <Potential>".into(),
                ))
            }
        };
        self.interactions.push(InteractionSpec {
            species_a: pending.species_a,
            species_b: pending.species_b,
            interaction: Interaction::Stepped(SteppedInteraction::new(potential)),
        });
        Ok(())
    }

    fn finish(self) -> Result<SimConfig> {
        let config = SimConfig {
            ensemble: self.ensemble.unwrap_or(Ensemble::Nve),
            sorter: self.sorter.unwrap_or(SorterKind::Heap),
            boundary: self
                .boundary
                .ok_or_else(|| Error::Config("configuration is missing <BC>".into()))?,
            dynamics: self.dynamics.unwrap_or(Dynamics::Newtonian),
            interactions: self.interactions,
            systems: self.systems,
            particles: self.particles,
            overlap_squash: self.overlap_squash,
        };
        config.validate()?;
        Ok(config)
    }
}

fn attr(e: &BytesStart, name: &str) -> Result<Option<String>> {
    for a in e.attributes() {
        let a = a.map_err(|err| Error::Config(format!("malformed attribute: {err}")))?;
        if a.key.as_ref() == name.as_bytes() {
            let value = a
                .unescape_value()
                .map_err(Error::Xml)?
                .into_owned();
            return Ok(Some(value));
        }
    }
    Ok(None)
}

fn req_attr(e: &BytesStart, name: &str) -> Result<String> {
    attr(e, name)?.ok_or_else(|| {
        Error::Config(format!(
            "<{}> is missing the {name} attribute",
            String::from_utf8_lossy(e.name().as_ref())
        ))
    })
}

fn parse_f64(s: &str, name: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|_| Error::Config(format!("attribute {name}=\"{s}\" is not a number")))
}

fn parse_u32(s: &str, name: &str) -> Result<u32> {
    s.parse::<u32>()
        .map_err(|_| Error::Config(format!("attribute {name}=\"{s}\" is not an integer")))
}

fn req_f64(e: &BytesStart, name: &str) -> Result<f64> {
    parse_f64(&req_attr(e, name)?, name)
}

fn req_u32(e: &BytesStart, name: &str) -> Result<u32> {
    parse_u32(&req_attr(e, name)?, name)
}

fn read_box(e: &BytesStart) -> Result<Vec3> {
    Ok([req_f64(e, "LX")?, req_f64(e, "LY")?, req_f64(e, "LZ")?])
}
