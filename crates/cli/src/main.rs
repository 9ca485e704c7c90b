//! Finishline CLI - project completion date forecasting.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use finishline_core::{ForecastId, ForecastRequest, ForecastResult, Outcome, StatusClass, Time};
use finishline_progress::{CompletionEstimator, ForecastConfig};
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, info_span, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "finishline")]
#[command(about = "Predict when a project reaches 100% completion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast a completion date from a progress history document
    Forecast {
        /// Request file, `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
        /// Reference instant (RFC 3339) instead of the system clock
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,
        /// Skip the trend model and extrapolate linearly
        #[arg(long)]
        linear_only: bool,
        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },
    /// Print service info and the effective configuration
    Info,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    // stdout carries the result document
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_ref()).await?;

    match cli.command {
        Commands::Forecast {
            input,
            now,
            linear_only,
            pretty,
        } => {
            let config = if linear_only { config.linear_only() } else { config };
            let body = read_input(&input).await?;

            let id = ForecastId::new();
            let result = info_span!("forecast", %id).in_scope(|| run_forecast(&body, config, now));

            let rendered = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{rendered}");
            Ok(exit_code(result.status_class()))
        }
        Commands::Info => {
            println!("finishline v{}", env!("CARGO_PKG_VERSION"));
            println!("Service: project-prediction");
            println!("Models: logistic trend (primary), linear extrapolation (fallback)");
            println!("Config:");
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn load_config(path: Option<&PathBuf>) -> Result<ForecastConfig> {
    let Some(path) = path else {
        return Ok(ForecastConfig::default());
    };
    let body = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config {}", path.display()))?;
    ForecastConfig::from_json(&body).with_context(|| format!("loading config {}", path.display()))
}

async fn read_input(input: &PathBuf) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut body = String::new();
        tokio::io::stdin()
            .read_to_string(&mut body)
            .await
            .context("reading request from stdin")?;
        Ok(body)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("reading request {}", input.display()))
    }
}

/// Forecast a request body. Invalid JSON is a client error.
fn run_forecast(body: &str, config: ForecastConfig, now: Option<Time>) -> ForecastResult {
    let estimator = CompletionEstimator::new(config);
    let result = match parse_request(body) {
        Ok(request) => match now {
            Some(now) => estimator.forecast(request.as_ref(), now),
            None => estimator.forecast_now(request.as_ref()),
        },
        Err(e) => {
            debug!(error = %e, "Request body is not valid JSON");
            ForecastResult::without_date(Outcome::InvalidFormat)
        }
    };
    info!(status = result.status_class().as_str(), "Forecast finished");
    result
}

/// Empty or non-object bodies carry no history.
fn parse_request(body: &str) -> serde_json::Result<Option<ForecastRequest>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(body)? {
        value @ Value::Object(_) => serde_json::from_value(value).map(Some),
        _ => Ok(None),
    }
}

fn parse_now(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 instant: {e}"))
}

fn exit_code(status: StatusClass) -> ExitCode {
    match status {
        StatusClass::Success => ExitCode::SUCCESS,
        StatusClass::ServerError => ExitCode::from(1),
        StatusClass::ClientError => ExitCode::from(2),
    }
}
