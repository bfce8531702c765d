//! Office Twin - Entry Point
//!
//! Loads the configuration, room model and telemetry dataset, applies any
//! startup overrides, then either runs a fixed number of ticks and prints the
//! resulting status, dashboard and validation report, or drives the engine on
//! the tokio scheduler until Ctrl-C.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use office_twin::core::error::Result;
use office_twin::model::loader::load_model_from_file;
use office_twin::telemetry::dataset::load_dataset_from_file;
use office_twin::{Scheduler, TickOutcome, TwinConfig, TwinEngine, TwinError};

/// Office Twin - smart office HVAC digital twin
#[derive(Parser, Debug)]
#[command(name = "office-twin")]
#[command(about = "Replay office telemetry through a simulated HVAC model")]
struct Args {
    /// Room model (JSON)
    #[arg(long)]
    model: PathBuf,

    /// Telemetry dataset (CSV with a header row)
    #[arg(long)]
    dataset: PathBuf,

    /// Engine configuration (TOML); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured tick period
    #[arg(long)]
    period_secs: Option<f64>,

    /// Run this many ticks synchronously, print the results and exit
    #[arg(long)]
    ticks: Option<u64>,

    /// Startup override, e.g. `R2=OFF` (repeatable)
    #[arg(long = "override", value_name = "ROOM=ACTION")]
    overrides: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("office_twin=info")),
        )
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("office-twin: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => TwinConfig::from_file(path)?,
        None => TwinConfig::default(),
    };
    if let Some(secs) = args.period_secs {
        if !(secs.is_finite() && secs > 0.0) {
            return Err(TwinError::InvalidConfig(format!(
                "--period-secs must be positive, got {}",
                secs
            )));
        }
        config.tick_period_ms = (secs * 1000.0).round().max(1.0) as u64;
    }

    tracing::info!("Office Twin starting...");

    let store = load_model_from_file(&args.model)?;
    let samples = load_dataset_from_file(&args.dataset)?;

    let engine = TwinEngine::new(config)?;
    engine.load(store, samples)?;

    for entry in &args.overrides {
        let Some((room, action)) = entry.split_once('=') else {
            return Err(TwinError::InvalidAction(entry.clone()));
        };
        let ack = engine.set_override(room.trim(), action.trim())?;
        tracing::info!("{}", ack);
    }

    match args.ticks {
        Some(n) => run_batch(&engine, n),
        None => run_scheduled(Arc::new(engine)),
    }
}

/// Run `n` ticks back to back and print every projection
fn run_batch(engine: &TwinEngine, n: u64) -> Result<()> {
    for _ in 0..n {
        if let TickOutcome::Failed(reason) = engine.tick() {
            tracing::warn!("Tick failed: {}", reason);
        }
    }

    println!("{}", engine.status());
    println!("{}", engine.dashboard());
    println!();
    print!("{}", engine.validation_report());
    Ok(())
}

fn run_scheduled(engine: Arc<TwinEngine>) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let handle = Scheduler::from_config(Arc::clone(&engine))
            .with_observer(|engine, outcome| {
                if outcome.is_completed() {
                    tracing::debug!("\n{}", engine.status());
                }
            })
            .spawn();

        tracing::info!("Running until Ctrl-C");
        tokio::signal::ctrl_c().await?;

        handle.abort();
        tracing::info!("Shutting down after {} ticks", engine.ticks());
        print!("{}", engine.validation_report());
        Ok::<(), TwinError>(())
    })
}
