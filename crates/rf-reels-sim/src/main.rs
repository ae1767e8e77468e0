//! Headless reel machine driver
//!
//! Usage:
//!   rf-reels-sim                       - one spin, reference timing, simulated clock
//!   rf-reels-sim --spins 100 --seed 7  - reproducible batch
//!   rf-reels-sim --realtime            - wall clock, frames paced at --fps
//!   rf-reels-sim --config machine.yaml - load a machine configuration

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use rf_reels::{
    CatalogResources, Clock, Collaborators, FrameTicker, MachineConfig, MachineEvent, ManualClock,
    MonotonicClock, RandomSymbolSource, RecordingPresentation, SessionStats, SlotMachine,
    SpinOutcome, SpinTiming, TimingProfile,
};

/// Frames after which a spin is considered stuck
const MAX_FRAMES_PER_SPIN: u64 = 100_000;

#[derive(Parser)]
#[command(name = "rf-reels-sim", about = "Drive the reel engine without a renderer")]
struct Cli {
    /// Machine configuration (.json, .yaml, .yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of spins
    #[arg(short, long, default_value_t = 1)]
    spins: u32,

    /// RNG seed (entropy if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Frames per second
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Timing profile override
    #[arg(long, value_enum)]
    timing: Option<TimingArg>,

    /// Pace frames on the wall clock instead of simulating time
    #[arg(long)]
    realtime: bool,

    /// Print the JSON summary only
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum TimingArg {
    Normal,
    Turbo,
    Instant,
}

impl From<TimingArg> for TimingProfile {
    fn from(arg: TimingArg) -> Self {
        match arg {
            TimingArg::Normal => TimingProfile::Normal,
            TimingArg::Turbo => TimingProfile::Turbo,
            TimingArg::Instant => TimingProfile::Instant,
        }
    }
}

/// Frame pacing: simulated or wall clock
enum FrameClock {
    Simulated(Arc<ManualClock>),
    Realtime(Arc<MonotonicClock>),
}

impl FrameClock {
    fn clock(&self) -> Arc<dyn Clock> {
        match self {
            Self::Simulated(clock) => Arc::clone(clock) as Arc<dyn Clock>,
            Self::Realtime(clock) => Arc::clone(clock) as Arc<dyn Clock>,
        }
    }

    fn wait_frame(&self, frame: Duration) {
        match self {
            Self::Simulated(clock) => clock.advance(frame),
            Self::Realtime(_) => std::thread::sleep(frame),
        }
    }
}

#[derive(Serialize)]
struct Summary {
    spins: Vec<SpinOutcome>,
    stats: SessionStats,
    frames: u64,
    presentation_calls: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.fps == 0 {
        bail!("--fps must be at least 1");
    }

    let mut config = match &cli.config {
        Some(path) => MachineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MachineConfig::default(),
    };
    if let Some(timing) = cli.timing {
        config.timing = SpinTiming::from_profile(timing.into());
    }
    config.validate()?;

    let symbols = match cli.seed {
        Some(seed) => RandomSymbolSource::seeded(&config.catalog, seed),
        None => RandomSymbolSource::new(&config.catalog),
    };
    let presentation = Arc::new(RecordingPresentation::new());
    let deps = Collaborators::new(
        Arc::new(symbols),
        Arc::new(CatalogResources::new(config.catalog.clone())),
        presentation.clone(),
    );

    let frame_clock = if cli.realtime {
        FrameClock::Realtime(Arc::new(MonotonicClock::new()))
    } else {
        FrameClock::Simulated(Arc::new(ManualClock::new()))
    };
    let frame = Duration::from_secs_f64(1.0 / cli.fps as f64);

    let ticker = Arc::new(FrameTicker::new());
    let machine = SlotMachine::new(config, deps, frame_clock.clock())?.shared();
    SlotMachine::connect(&machine, ticker.clone()).context("Machine refused the frame ticker")?;

    log::info!("Running {} spin(s) at {} fps", cli.spins, cli.fps);

    let mut outcomes = Vec::with_capacity(cli.spins as usize);
    for _ in 0..cli.spins {
        if !machine.lock().start_spin() {
            bail!("machine refused to spin while idle");
        }

        let mut frames = 0u64;
        loop {
            frame_clock.wait_frame(frame);
            ticker.tick();
            frames += 1;

            let mut guard = machine.lock();
            for event in guard.drain_events() {
                report(&event, cli.json);
                if let MachineEvent::SpinCompleted { outcome, .. } = event {
                    outcomes.push(outcome);
                }
            }
            if !guard.is_spinning() {
                break;
            }
            if frames >= MAX_FRAMES_PER_SPIN {
                bail!("spin did not settle within {} frames", MAX_FRAMES_PER_SPIN);
            }
        }
    }

    let stats = {
        let mut guard = machine.lock();
        let stats = guard.stats().clone();
        guard.destroy();
        stats
    };

    let summary = Summary {
        spins: outcomes,
        stats,
        frames: ticker.frame_count(),
        presentation_calls: presentation.len(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} spins, {} winning ({:.1}%), {} win lines, longest run {}",
            summary.stats.completed_spins,
            summary.stats.winning_spins,
            summary.stats.hit_rate(),
            summary.stats.win_lines,
            summary.stats.longest_run
        );
    }
    Ok(())
}

fn report(event: &MachineEvent, quiet: bool) {
    if quiet {
        return;
    }
    match event {
        MachineEvent::SpinRequested { spin_id, at, .. } => {
            println!("[{:>8.3}s] spin {} requested", at.as_secs_f64(), spin_id);
        }
        MachineEvent::ReelsStarted { at, .. } => {
            println!("[{:>8.3}s] reels spinning", at.as_secs_f64());
        }
        MachineEvent::ReelStopped { reel, at, .. } => {
            println!("[{:>8.3}s] reel {} stopped", at.as_secs_f64(), reel);
        }
        MachineEvent::SpinCompleted { outcome, at } => {
            println!("[{:>8.3}s] spin {} settled", at.as_secs_f64(), outcome.spin_id);
            for row in outcome.grid.rows() {
                let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
                println!("             {}", cells.join(" "));
            }
            for win in &outcome.wins {
                println!(
                    "            WIN row {}: {} x {}",
                    win.row + 1,
                    win.run_length,
                    win.symbol_type
                );
            }
        }
        MachineEvent::SpinAbandoned { spin_id, at } => {
            println!("[{:>8.3}s] spin {} abandoned", at.as_secs_f64(), spin_id);
        }
    }
}
