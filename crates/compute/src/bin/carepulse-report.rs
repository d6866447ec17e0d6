//! carepulse-report: run one insight operation over a JSON request file.
//!
//! Reads the request (the same body the HTTP API accepts) from a file or
//! stdin and prints the report JSON to stdout.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use carepulse_compute::request::{
    AdherenceRequest, AppointmentRequest, DailyRequest, PatternRequest, WeeklyRequest,
};
use carepulse_compute::InsightEngine;
use carepulse_rules::loader::load_or_default;

// ── CLI ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Operation {
    Daily,
    Weekly,
    Patterns,
    Appointments,
    Adherence,
}

/// Patient insight reports from the command line.
#[derive(Parser, Debug)]
#[command(name = "carepulse-report", version, about)]
struct Cli {
    /// Operation to run.
    #[arg(long, value_enum)]
    operation: Operation,

    /// Request JSON file, or `-` for stdin.
    #[arg(long, default_value = "-")]
    input: String,

    /// InsightConfig YAML document (built-in defaults when unset).
    #[arg(long, env = "INSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read request from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input))
    }
}

fn render<T: Serialize>(report: &T, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    })
}

fn run(engine: &InsightEngine, op: Operation, body: &str, pretty: bool) -> anyhow::Result<String> {
    let now = Utc::now();
    match op {
        Operation::Daily => {
            let req: DailyRequest = serde_json::from_str(body).context("invalid daily request")?;
            render(&req.run(engine, now)?, pretty)
        }
        Operation::Weekly => {
            let req: WeeklyRequest = serde_json::from_str(body).context("invalid weekly request")?;
            render(&req.run(engine, now)?, pretty)
        }
        Operation::Patterns => {
            let req: PatternRequest =
                serde_json::from_str(body).context("invalid pattern request")?;
            render(&req.run(engine, now)?, pretty)
        }
        Operation::Appointments => {
            let req: AppointmentRequest =
                serde_json::from_str(body).context("invalid appointment request")?;
            render(&req.run(engine, now)?, pretty)
        }
        Operation::Adherence => {
            let req: AdherenceRequest =
                serde_json::from_str(body).context("invalid adherence request")?;
            render(&req.run(engine, now)?, pretty)
        }
    }
}

// ── Main ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    carepulse_core::config::load_dotenv();

    // Logs go to stderr so stdout stays pure JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = load_or_default(cli.config.as_deref()).context("failed to load insight config")?;
    let engine = InsightEngine::new(config)?;

    let body = read_input(&cli.input)?;
    info!(operation = ?cli.operation, bytes = body.len(), "running report");

    let output = run(&engine, cli.operation, &body, cli.pretty)?;
    println!("{}", output);
    Ok(())
}
