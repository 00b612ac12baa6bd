//! Confluence CLI: drives the signal engine from files and streams.
//!
//! Commands:
//! - `status`: print the engine status snapshot for a config
//! - `evaluate`: warm one symbol from CSV history and print its verdict
//! - `stream`: warm every symbol, then evaluate JSON-line close events

mod config;
mod events;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use confluence_core::data::{load_warmup, CsvHistory, MarketDataSource};
use confluence_core::engine::{run_intake, SignalEngine};
use confluence_core::notify::{NotificationSink, WriterSink};

use config::{AppConfig, WARMUP_LIMIT};
use events::close_events;

#[derive(Parser)]
#[command(
    name = "confluence",
    about = "Confluence CLI: multi-timeframe long-only signal engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the status snapshot for a config.
    Status {
        /// Path to the app TOML config.
        #[arg(long)]
        config: PathBuf,
    },
    /// Warm one symbol from CSV history and print the verdict for its latest 5m bar.
    Evaluate {
        #[arg(long)]
        config: PathBuf,

        /// Directory holding `<SYMBOL>_<tf>.csv` files.
        #[arg(long, default_value = "history")]
        history_dir: PathBuf,

        #[arg(long)]
        symbol: String,

        /// Print the full evaluation as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Warm every configured symbol, then evaluate close events as they arrive.
    Stream {
        #[arg(long)]
        config: PathBuf,

        #[arg(long, default_value = "history")]
        history_dir: PathBuf,

        /// JSON-line close events. Defaults to stdin.
        #[arg(long)]
        events: Option<PathBuf>,
    },
}

impl Commands {
    fn config_path(&self) -> &Path {
        match self {
            Commands::Status { config }
            | Commands::Evaluate { config, .. }
            | Commands::Stream { config, .. } => config,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let app = AppConfig::from_file(cli.command.config_path())?;
    init_tracing(&app.log_level);

    match cli.command {
        Commands::Status { .. } => run_status(&app),
        Commands::Evaluate {
            history_dir,
            symbol,
            json,
            ..
        } => run_evaluate(&app, &history_dir, &symbol, json),
        Commands::Stream {
            history_dir,
            events,
            ..
        } => run_stream(&app, &history_dir, events.as_deref()),
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn build_engine(app: &AppConfig) -> Result<SignalEngine> {
    SignalEngine::with_system_clock(app.engine.clone(), app.tick_map())
        .context("invalid engine config")
}

fn warm(engine: &mut SignalEngine, source: &dyn MarketDataSource, symbols: &[String]) -> Result<()> {
    let batches = load_warmup(source, symbols, WARMUP_LIMIT)
        .with_context(|| format!("loading warmup history from {}", source.name()))?;
    engine.warmup_batch(batches);
    Ok(())
}

fn run_status(app: &AppConfig) -> Result<()> {
    let mut engine = build_engine(app)?;
    for symbol in app.normalized_symbols() {
        engine.warmup(&symbol, &[], &[], &[]);
    }
    println!("{}", engine.status_snapshot(&app.timezone_display()));
    Ok(())
}

fn run_evaluate(app: &AppConfig, history_dir: &Path, symbol: &str, json: bool) -> Result<()> {
    let mut engine = build_engine(app)?;
    let symbol = symbol.trim().to_ascii_uppercase();
    let source = CsvHistory::new(history_dir);
    warm(&mut engine, &source, std::slice::from_ref(&symbol))?;

    let evaluation = engine.evaluate_detailed(&symbol);
    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
        return Ok(());
    }
    match evaluation.verdict.signal() {
        Some(signal) => println!("{}", signal.message()),
        None => println!("{symbol}: no signal ({:?})", evaluation.verdict),
    }
    Ok(())
}

fn run_stream(app: &AppConfig, history_dir: &Path, events: Option<&Path>) -> Result<()> {
    let mut engine = build_engine(app)?;
    let symbols = app.normalized_symbols();
    let source = CsvHistory::new(history_dir);
    warm(&mut engine, &source, &symbols)?;
    let min = engine.config().confirmations_min_clamped();
    info!(
        symbols = %symbols.join(","),
        timezone = %app.timezone_display(),
        min,
        "stream started, LONG-only"
    );

    let reader: Box<dyn BufRead> = match events {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut sink = WriterSink::stdout();
    if app.send_startup_message {
        sink.deliver(&app.recipient, &app.startup_message(&symbols, min));
    }

    let mut read_error = None;
    let stats = run_intake(
        &mut engine,
        close_events(reader, &mut read_error),
        &mut sink,
        &app.recipient,
    );
    info!(
        events = stats.events,
        evaluations = stats.evaluations,
        signals = stats.signals,
        rejected = stats.rejected,
        "stream finished"
    );
    match read_error {
        Some(e) => Err(e).context("reading close events"),
        None => Ok(()),
    }
}
