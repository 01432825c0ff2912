//! Headless battle runner.
//!
//! Reads the bundled tables from disk and runs AI-vs-AI battles without a
//! presentation layer.
//!
//! # Usage
//!
//! ```bash
//! # One battle, message stream on stdout
//! cargo run -p medabattle-cli -- run --seed 42
//!
//! # Balance batch over 1000 seeds
//! cargo run -p medabattle-cli -- batch --count 1000
//!
//! # Rerun a seed and compare snapshots
//! cargo run -p medabattle-cli -- verify --seed 12345 --runs 5
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use medabattle_core::entity::TeamId;
use medabattle_core::simulation::BattleSnapshot;
use medabattle_core::{BattleConfig, GameData, GameEvent, MessageCatalog, Simulation};

#[derive(Parser)]
#[command(name = "medabattle")]
#[command(about = "Headless robot battle runner for balance batches and replay checks")]
#[command(version)]
struct Cli {
    /// Enable debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    data: DataArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Directory holding parts.csv, medals.csv, loadouts.csv and formulas.json
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Message table; falls back to <data-dir>/messages.json, then built-ins
    #[arg(long, global = true)]
    messages: Option<PathBuf>,

    /// Battle constants as JSON; missing keys keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tick limit per battle
    #[arg(long, global = true, default_value = "100000")]
    max_ticks: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one battle and print its message stream
    Run {
        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Print the final snapshot as JSON instead of messages
        #[arg(long)]
        json: bool,
    },

    /// Run many seeds in parallel and tally the winners
    Batch {
        /// Number of battles
        #[arg(short, long, default_value = "100")]
        count: u64,

        /// First seed; battle `i` uses `seed + i`
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Print the tally as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rerun one seed several times and check every run matches
    Verify {
        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

// =============================================================================
// Setup
// =============================================================================

/// Everything a battle needs, loaded once and shared between runs.
struct Battle {
    data: Arc<GameData>,
    catalog: Arc<MessageCatalog>,
    config: BattleConfig,
    max_ticks: u64,
}

impl Battle {
    fn load(args: &DataArgs) -> Result<Self> {
        let dir = &args.data_dir;
        let data = GameData::from_tables(
            &read(&dir.join("parts.csv"))?,
            &read(&dir.join("medals.csv"))?,
            &read(&dir.join("loadouts.csv"))?,
            &read(&dir.join("formulas.json"))?,
        )
        .with_context(|| format!("parsing tables in {}", dir.display()))?;

        let catalog = match &args.messages {
            Some(path) => load_messages(path)?,
            None => {
                let path = dir.join("messages.json");
                if path.exists() {
                    load_messages(&path)?
                } else {
                    warn!(path = %path.display(), "no message table, using built-in text");
                    MessageCatalog::default()
                }
            }
        };

        let mut config = match &args.config {
            Some(path) => BattleConfig::from_json(&read(path)?)
                .with_context(|| format!("parsing {}", path.display()))?,
            None => BattleConfig::default(),
        };
        // Nobody is at the keyboard.
        config.player_team = None;
        config.presentation = medabattle_core::config::Presentation::Headless;

        info!(
            parts = data.part_count(),
            robots = data.loadouts().len(),
            "data loaded"
        );
        Ok(Self {
            data: Arc::new(data),
            catalog: Arc::new(catalog),
            config,
            max_ticks: args.max_ticks,
        })
    }

    fn start(&self, seed: u64) -> Result<Simulation> {
        Simulation::setup(
            Arc::clone(&self.data),
            Arc::clone(&self.catalog),
            self.config.clone(),
            seed,
        )
        .with_context(|| format!("setting up battle with seed {seed}"))
    }

    /// Plays one battle to the end and returns its final snapshot and events.
    fn play(&self, seed: u64) -> Result<(BattleSnapshot, Vec<GameEvent>)> {
        let mut sim = self.start(seed)?;
        sim.run_to_end(self.max_ticks);
        if !sim.is_over() {
            warn!(seed, ticks = sim.tick(), "battle hit the tick limit");
        }
        Ok((sim.snapshot(), sim.take_events()))
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_messages(path: &Path) -> Result<MessageCatalog> {
    MessageCatalog::from_json(&read(path)?)
        .with_context(|| format!("parsing {}", path.display()))
}

// =============================================================================
// Commands
// =============================================================================

fn cmd_run(battle: &Battle, seed: u64, json: bool) -> Result<()> {
    let (snapshot, events) = battle.play(seed)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }
    for event in &events {
        if let GameEvent::MessageDisplayRequest { messages } = event {
            for line in messages {
                println!("{line}");
            }
        }
    }
    match snapshot.winner {
        Some(team) => println!("-- {team} wins after {} ticks", snapshot.tick),
        None => println!("-- no winner after {} ticks", snapshot.tick),
    }
    Ok(())
}

/// Win counts over a batch of seeds.
#[derive(Debug, Default, Serialize)]
struct Tally {
    battles: u64,
    team_one: u64,
    team_two: u64,
    unfinished: u64,
    mean_ticks: f64,
}

impl Tally {
    #[allow(clippy::cast_precision_loss)]
    fn from_results(results: &[BattleSnapshot]) -> Self {
        let mut tally = Self {
            battles: results.len() as u64,
            ..Self::default()
        };
        let mut total_ticks = 0u64;
        for snapshot in results {
            total_ticks += snapshot.tick;
            match snapshot.winner {
                Some(TeamId::One) => tally.team_one += 1,
                Some(TeamId::Two) => tally.team_two += 1,
                None => tally.unfinished += 1,
            }
        }
        if tally.battles > 0 {
            tally.mean_ticks = total_ticks as f64 / tally.battles as f64;
        }
        tally
    }
}

fn cmd_batch(battle: &Battle, count: u64, first_seed: u64, json: bool) -> Result<()> {
    let started = Instant::now();
    let results = (0..count)
        .into_par_iter()
        .map(|i| battle.play(first_seed.wrapping_add(i)).map(|(snapshot, _)| snapshot))
        .collect::<Result<Vec<_>>>()?;
    let tally = Tally::from_results(&results);
    info!(elapsed = ?started.elapsed(), battles = count, "batch finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&tally)?);
    } else {
        println!("battles:    {}", tally.battles);
        println!("team 1:     {}", tally.team_one);
        println!("team 2:     {}", tally.team_two);
        println!("unfinished: {}", tally.unfinished);
        println!("mean ticks: {:.1}", tally.mean_ticks);
    }
    Ok(())
}

fn cmd_verify(battle: &Battle, seed: u64, runs: u32) -> Result<()> {
    if runs < 2 {
        bail!("verify needs at least two runs, got {runs}");
    }
    let (reference, reference_events) = battle.play(seed)?;
    for run in 1..runs {
        let (snapshot, events) = battle.play(seed)?;
        if snapshot != reference || events != reference_events {
            bail!("seed {seed} diverged on run {run}");
        }
    }
    println!(
        "seed {seed}: {runs} identical runs, {} ticks, winner {}",
        reference.tick,
        reference
            .winner
            .map_or_else(|| "none".to_string(), |team| team.to_string())
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let battle = Battle::load(&cli.data)?;
    match cli.command {
        Commands::Run { seed, json } => cmd_run(&battle, seed, json),
        Commands::Batch { count, seed, json } => cmd_batch(&battle, count, seed, json),
        Commands::Verify { seed, runs } => cmd_verify(&battle, seed, runs),
    }
}
