use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use stepdyn::core::sim::StepOutcome;
use stepdyn::output::{EventCounter, KineticTemperature};
use stepdyn::system::SystemProcess;
use stepdyn::{Error, Result, SimConfig, Simulation};

/// Event-driven molecular dynamics runner for stepwise potentials.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input configuration file (XML)
    config_file: PathBuf,

    /// Output snapshot file (XML)
    #[arg(short, long, default_value = "config.out.xml")]
    output: PathBuf,

    /// Run for this many events
    #[arg(short = 'c', long, conflicts_with = "time")]
    events: Option<u64>,

    /// Run until this absolute simulation time
    #[arg(short, long)]
    time: Option<f64>,

    /// RNG seed
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Rewrite the snapshot every this many events
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Sample the kinetic temperature every this many events
    #[arg(long, default_value_t = 1000)]
    sample_interval: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut sim = match load(&args) {
        Ok(sim) => sim,
        Err(e) => {
            tracing::error!("bad input: {e}");
            return ExitCode::from(1);
        }
    };

    match drive(&mut sim, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("runtime invariant violation: {e}");
            ExitCode::from(2)
        }
    }
}

fn load(args: &Args) -> Result<Simulation> {
    let config = SimConfig::load(&args.config_file)?;
    let has_halt = config
        .systems
        .iter()
        .any(|s| matches!(s, SystemProcess::Halt { .. }));
    if args.events.is_none() && args.time.is_none() && !has_halt {
        return Err(Error::Config(
            "specify --events or --time, or configure a Halt system".into(),
        ));
    }
    config.build(args.seed)
}

fn drive(sim: &mut Simulation, args: &Args) -> Result<()> {
    sim.add_plugin(Box::new(EventCounter::new()));
    sim.add_plugin(Box::new(KineticTemperature::new(args.sample_interval)));

    let mut remaining = args.events.unwrap_or(u64::MAX);
    loop {
        let chunk = args.snapshot_interval.unwrap_or(u64::MAX).min(remaining);
        let (executed, outcome) = sim.run_events_until(chunk, args.time)?;
        remaining = remaining.saturating_sub(executed);
        if args.snapshot_interval.is_some() {
            SimConfig::snapshot(sim).save(&args.output)?;
        }
        let done = remaining == 0
            || matches!(
                outcome,
                StepOutcome::Halted | StepOutcome::LimitReached | StepOutcome::Idle
            );
        if done {
            break;
        }
    }

    let stats = sim.stats();
    tracing::info!(
        sim_time = sim.time(),
        executed = stats.executed,
        stale = stats.stale,
        "simulation complete"
    );
    for plugin in sim.plugins() {
        tracing::info!(plugin = plugin.name(), "{}", plugin.summary());
    }
    SimConfig::snapshot(sim).save(&args.output)?;
    Ok(())
}
