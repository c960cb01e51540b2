//! Line-oriented front end to the UCI bridge.
//!
//! Reads commands from stdin: plain UCI lines are queued as-is, `best [ms]`
//! asks for a best move, `sync` waits for the queue to drain and reports
//! errors, `quit` exits. Logs go to stderr, or to `--log-file`.

mod repl;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bridge::{Bridge, BridgeConfig, EnginePath};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "uci-bridge", about = "Drive a chess engine through a synchronous command queue")]
struct Cli {
    /// External UCI engine binary, or `auto` to look for Fairy-Stockfish or
    /// Stockfish on PATH. Defaults to the built-in engine.
    #[arg(long, value_name = "PATH")]
    engine: Option<String>,

    /// Variant selected at startup
    #[arg(long)]
    variant: Option<String>,

    /// Budget for `best` and `go` without a time
    #[arg(long, value_name = "MS")]
    movetime: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Environment configuration with command-line overrides
    fn config(&self) -> BridgeConfig {
        let mut config = BridgeConfig::from_env();
        if let Some(engine) = self.engine.as_deref() {
            config.engine_path = EnginePath::parse(engine);
        }
        if let Some(variant) = &self.variant {
            config.variant = variant.clone();
        }
        if let Some(movetime) = self.movetime {
            config.default_movetime_ms = movetime;
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;

    let config = cli.config();
    tracing::info!(?config, "Starting UCI bridge");

    let bridge = Bridge::from_config(config);
    bridge
        .initialize(None)
        .context("Failed to initialize engine")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    repl::run(&bridge, stdin.lock(), stdout.lock())?;

    bridge.shutdown();
    tracing::info!("UCI bridge exiting");
    Ok(())
}

/// Install the global subscriber. The returned guard flushes the log file
/// when dropped.
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

fn file_appender(path: &Path) -> anyhow::Result<RollingFileAppender> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log path has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    Ok(rolling::never(dir, file_name))
}
