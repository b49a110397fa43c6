//! Cluster-pay batch simulator
//!
//! Usage:
//!   rf-cluster-sim --rounds 1000000 --seed 7          - Simulate the standard 7×7 game
//!   rf-cluster-sim --config game.yaml -o report.json  - Simulate a game definition
//!   rf-cluster-sim --dump-preset game.yaml            - Write the standard game definition
//!   rf-cluster-sim --book --seed 3                    - Print one round's event book

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rf_cluster::{GameDefinition, RoundController};
use rf_cluster_sim::{SimConfig, SimReport, Simulator, load_definition};

#[derive(Parser)]
#[command(name = "rf-cluster-sim", about = "Cluster-pay tumble game simulator")]
struct Cli {
    /// Game definition (JSON or YAML); standard 7×7 when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rounds to play
    #[arg(short, long, default_value_t = 100_000)]
    rounds: u64,

    /// Master seed (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Worker threads (0 = one per core)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Rounds per work unit
    #[arg(long, default_value_t = 10_000)]
    chunk_size: u64,

    /// Reel failures tolerated before aborting
    #[arg(long, default_value_t = 0)]
    max_reel_failures: u64,

    /// Write the report here (.json, .txt or .md)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the standard 7×7 definition to this file and exit
    #[arg(long)]
    dump_preset: Option<PathBuf>,

    /// Play one round and print its event book as JSON
    #[arg(long)]
    book: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(path) = &cli.dump_preset {
        return write_preset(path);
    }

    let definition = definition(cli.config.as_deref())?;
    if cli.book {
        return print_book(&definition, cli.seed.unwrap_or_default());
    }

    let mut config = SimConfig::default()
        .with_rounds(cli.rounds)
        .with_threads(cli.threads)
        .with_chunk_size(cli.chunk_size)
        .with_max_reel_failures(cli.max_reel_failures);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let simulator = Simulator::new(definition, config).context("Invalid simulation setup")?;
    let report = simulator.run().context("Simulation failed")?;

    for line in report.to_text().lines() {
        log::info!("{line}");
    }

    if let Some(path) = &cli.output {
        report
            .save(path, SimReport::format_for(path))
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        log::info!("Report written to {}", path.display());
    }
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn definition(path: Option<&Path>) -> Result<GameDefinition> {
    match path {
        Some(path) => load_definition(path)
            .with_context(|| format!("Failed to load game from {}", path.display())),
        None => Ok(GameDefinition::standard_7x7()),
    }
}

fn write_preset(output: &Path) -> Result<()> {
    let definition = GameDefinition::standard_7x7();
    let yaml = matches!(
        output.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let text = if yaml {
        definition.to_yaml()?
    } else {
        definition.to_json()?
    };
    std::fs::write(output, text)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Standard game written to {}", output.display());
    Ok(())
}

fn print_book(definition: &GameDefinition, seed: u64) -> Result<()> {
    let source = definition.strip_source(seed);
    let mut controller = RoundController::from_definition(definition, source)?;
    let summary = controller.play_round()?;
    println!("{}", serde_json::to_string_pretty(&summary.book())?);
    Ok(())
}
