//! Threes bridge runner (default binary).
//!
//! Connects to a live game instance, loads the search engine, and plays.
//!
//! # Configuration
//!
//! CLI arguments override environment variables, which override defaults.
//!
//! - `THREES_BRIDGE_HOST`, `THREES_BRIDGE_PORT`, `THREES_BRIDGE_TIMEOUT_MS`,
//!   `THREES_BRIDGE_RETRIES`, `THREES_BRIDGE_BACKOFF_MS`: live instance link
//! - `THREES_ORACLE_LIB`: engine library file, or directory holding
//!   `threes.{so,dll,dylib}` (default: `bin`)
//! - `THREES_SETTLE_MS`: pause before each snapshot (default: 100)

use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use threes_bridge::adapter::{TcpTransport, TransportConfig, WebGameDriver};
use threes_bridge::core::board_score;
use threes_bridge::engine::{
    run_batch, AutoPlayConfig, AutoPlayer, BatchConfig, NativeOracle, Orchestrator,
    OrchestratorConfig, Step, Strategy, DEFAULT_WORKERS,
};
use threes_bridge::types::SETTLE_MS;

const DEFAULT_ORACLE_DIR: &str = "bin";
const DEFAULT_BATCH_OUTPUT: &str = "results.csv";

/// Automated Threes player
#[derive(Parser, Debug)]
#[command(name = "threes-bridge")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine library file or directory (also: THREES_ORACLE_LIB)
    #[arg(long, global = true, value_name = "PATH")]
    oracle: Option<PathBuf>,

    /// Move selection: parallel, sequential, or delegate
    #[arg(long, global = true, default_value = "parallel")]
    strategy: String,

    /// Scoring workers for the parallel strategy
    #[arg(long, global = true, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Seven heuristic weights, comma separated
    #[arg(long, global = true, value_delimiter = ',', num_args = 1..)]
    weights: Option<Vec<f32>>,

    /// Pause before each snapshot in ms (also: THREES_SETTLE_MS)
    #[arg(long, global = true)]
    settle_ms: Option<u64>,

    /// Live instance host (also: THREES_BRIDGE_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Live instance port (also: THREES_BRIDGE_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Stop at the "you won" overlay instead of playing on
    #[arg(long, global = true)]
    no_keep_playing: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the current game until it ends (default)
    Play {
        /// Stop after this many moves
        #[arg(long)]
        max_moves: Option<u64>,
    },
    /// Play several games, restarting in between, and record each result
    Batch {
        /// Number of games
        #[arg(short = 'n', long, default_value_t = 1)]
        games: usize,

        /// CSV file to write
        #[arg(short, long, default_value = DEFAULT_BATCH_OUTPUT)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args);

    let orchestrator = build_orchestrator(&args)?;

    let mut transport_config = TransportConfig::from_env();
    if let Some(host) = &args.host {
        transport_config.host.clone_from(host);
    }
    if let Some(port) = args.port {
        transport_config.port = port;
    }
    let transport = TcpTransport::connect(transport_config.clone()).with_context(|| {
        format!(
            "connecting to live instance at {}:{}",
            transport_config.host, transport_config.port
        )
    })?;
    let mut driver = WebGameDriver::new(transport);

    let settle_ms = args
        .settle_ms
        .or_else(|| env::var("THREES_SETTLE_MS").ok().and_then(|s| s.parse().ok()))
        .unwrap_or(SETTLE_MS);
    let autoplay = AutoPlayConfig {
        settle: Duration::from_millis(settle_ms),
        keep_playing: !args.no_keep_playing,
        max_moves: None,
    };

    match args.command.unwrap_or(Command::Play { max_moves: None }) {
        Command::Play { max_moves } => {
            let config = AutoPlayConfig {
                max_moves,
                ..autoplay
            };
            let mut player = AutoPlayer::new(&mut driver, &orchestrator, config);
            loop {
                match player.step()? {
                    Step::Continue(record) => info!(
                        move_no = record.move_no,
                        mv = record.mv.as_str(),
                        board = format_args!("{:016x}", record.state.board),
                        "played"
                    ),
                    Step::GameOver(over) => {
                        let score = over.last_grid.as_ref().map_or(0, board_score);
                        println!(
                            "game over ({}) after {} moves, score {}",
                            over.reason.as_str(),
                            over.moves,
                            score
                        );
                        break;
                    }
                }
            }
        }
        Command::Batch { games, output } => {
            let file = File::create(&output)
                .with_context(|| format!("creating {}", output.display()))?;
            let mut out = BufWriter::new(file);
            let config = BatchConfig { games, autoplay };
            let records = run_batch(&mut driver, &orchestrator, &config, &mut out)?;
            println!("{} games written to {}", records.len(), output.display());
        }
    }

    Ok(())
}

/// Terminal filter: --debug > --verbose > RUST_LOG env > default "warn"
fn init_tracing(args: &Args) {
    let filter = if args.debug {
        EnvFilter::new("debug,tokio=warn")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();
}

fn build_orchestrator(args: &Args) -> Result<Orchestrator> {
    let strategy = Strategy::from_str(&args.strategy)
        .ok_or_else(|| anyhow!("unknown strategy '{}'", args.strategy))?;

    let location = args
        .oracle
        .clone()
        .or_else(|| env::var_os("THREES_ORACLE_LIB").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ORACLE_DIR));
    let mut oracle = NativeOracle::discover(&location)?;
    if let Some(weights) = &args.weights {
        oracle.set_heuristic_weights(weights)?;
    }
    if strategy == Strategy::Delegate && !oracle.has_best_move_entry() {
        info!("engine has no best-move entry point; delegate falls back to in-order scoring");
    }
    info!(path = %oracle.path().display(), strategy = strategy.as_str(), "oracle loaded");

    let config = OrchestratorConfig {
        strategy,
        workers: args.workers,
    };
    Ok(Orchestrator::new(Arc::new(oracle), config)?)
}
