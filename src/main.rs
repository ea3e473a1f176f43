//! lamco-head-pointer - Head-pointer dwell interaction engine
//!
//! Entry point for the engine binary. Reads a JSONL stream of engine inputs
//! (samples, target registrations, resets) and either replays it
//! deterministically, printing a JSON report, or drives the live runtime and
//! prints each confirmation as it happens.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

use lamco_head_pointer::config::{Config, ConfirmMode};
use lamco_head_pointer::engine::PointerEngine;
use lamco_head_pointer::runtime::{parse_trace_line, LiveRuntime, MonotonicClock, ReplayDriver};

/// Command-line arguments for lamco-head-pointer
#[derive(Parser, Debug)]
#[command(name = "lamco-head-pointer")]
#[command(version, about = "Head-pointer dwell interaction engine", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/lamco-head-pointer/engine.toml")]
    pub config: String,

    /// Input trace (JSONL file, or - for stdin)
    #[arg(short, long, default_value = "-")]
    pub trace: String,

    /// Run the live runtime instead of a deterministic replay
    #[arg(long)]
    pub live: bool,

    /// Pointer sensitivity override
    #[arg(short, long, env = "LAMCO_SENSITIVITY")]
    pub sensitivity: Option<f64>,

    /// Confirm mode override (dwell|dwell_gesture)
    #[arg(long, env = "LAMCO_CONFIRM_MODE")]
    pub confirm_mode: Option<ConfirmMode>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "compact")]
    pub log_format: String,

    /// Write logs to file (in addition to stderr)
    #[arg(long)]
    pub log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: it decides the log directory
    let loaded = Config::load(&args.config);
    let base = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default_config()?,
    };

    let _log_guard = init_logging(&args, &base)?;

    info!("════════════════════════════════════════════════════════");
    info!("  lamco-head-pointer v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");

    if let Err(e) = &loaded {
        warn!("Failed to load config: {:#}, using defaults", e);
    }

    let config = base.with_overrides(args.sensitivity, args.confirm_mode);
    if let Err(e) = config.validate() {
        eprintln!("{}", lamco_head_pointer::utils::format_user_error(&e));
        return Err(e);
    }
    info!("Configuration loaded successfully");
    tracing::debug!("Config: {:?}", config);

    if let Err(e) = run(&args, config).await {
        eprintln!("{}", lamco_head_pointer::utils::format_user_error(&e));
        return Err(e);
    }

    Ok(())
}

async fn run(args: &Args, config: Config) -> Result<()> {
    let engine = PointerEngine::new(config)?;
    let reader = open_trace(&args.trace).await?;

    if args.live {
        run_live(engine, reader).await
    } else {
        run_replay(engine, reader).await
    }
}

async fn open_trace(path: &str) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    if path == "-" {
        info!("Reading inputs from stdin");
        return Ok(Box::new(tokio::io::stdin()));
    }
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open trace file: {}", path))?;
    info!("Reading inputs from {}", path);
    Ok(Box::new(file))
}

async fn run_replay(engine: PointerEngine, reader: Box<dyn AsyncRead + Unpin + Send>) -> Result<()> {
    let mut driver = ReplayDriver::new(engine);
    driver.replay_reader(reader).await?;
    let report = driver.finish();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_live(engine: PointerEngine, reader: Box<dyn AsyncRead + Unpin + Send>) -> Result<()> {
    let (confirm_tx, mut confirm_rx) = mpsc::unbounded_channel();
    let runtime = LiveRuntime::new(engine, Arc::new(MonotonicClock::new()), Box::new(confirm_tx));
    let cancel = runtime.cancellation_token();

    let (input_tx, input_rx) = mpsc::channel(64);
    let runtime_task = tokio::spawn(runtime.run(input_rx));

    let printer = tokio::spawn(async move {
        while let Some(confirmation) = confirm_rx.recv().await {
            match serde_json::to_string(&confirmation) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to encode confirmation: {}", e),
            }
        }
    });

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down");
            ctrl_c.cancel();
        }
    });

    let mut lines = FramedRead::new(reader, LinesCodec::new());
    let mut line = 0;
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = lines.next() => next,
        };
        let Some(text) = next else { break };
        line += 1;

        let text = text.context("Failed to read trace line")?;
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        match parse_trace_line(text, line) {
            Ok(input) => {
                if input_tx.send(input).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("Skipping input: {}", e),
        }
    }

    drop(input_tx);
    runtime_task.await??;
    printer.await?;
    info!("Live runtime shut down");
    Ok(())
}

fn init_logging(args: &Args, config: &Config) -> Result<Option<WorkerGuard>> {
    use std::fs::File;

    let log_level = match args.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "lamco_head_pointer={level},warn",
            level = log_level
        ))
    });

    // stdout carries the report, so console logs go to stderr
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(match args.log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .boxed(),
    });

    if let Some(log_file_path) = &args.log_file {
        let file = File::create(log_file_path)
            .with_context(|| format!("Failed to create log file: {}", log_file_path))?;
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .boxed(),
        );
    }

    let guard = match &config.logging.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "lamco-head-pointer.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    if let Some(log_file_path) = &args.log_file {
        info!("Logging to file: {}", log_file_path);
    }
    if let Some(dir) = &config.logging.log_dir {
        info!("Rolling logs in: {}", dir.display());
    }

    Ok(guard)
}
