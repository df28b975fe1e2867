//! pxgate CLI
//!
//! Command-line client for a running pxgate server.
//!
//! # Usage
//!
//! ```bash
//! pxgate --help
//! pxgate health
//! pxgate run scripts/conn_status.pxl
//! pxgate run scripts/conn_status.pxl --json
//! ```

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use shared::results::AccumulatedResult;
use std::path::PathBuf;

/// pxgate CLI - run PxL scripts through a pxgate server
#[derive(Parser)]
#[command(name = "pxgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// API server URL
    #[arg(
        short,
        long,
        env = "PXGATE_API_URL",
        default_value = "http://localhost:8080"
    )]
    api_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API server health
    Health,

    /// Execute a PxL script and print its results
    Run {
        /// Path to the script
        file: PathBuf,

        /// Print the raw JSON response instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Body of a successful `/pixie` response.
#[derive(Debug, Deserialize)]
struct ScriptOutput {
    #[serde(flatten)]
    result: AccumulatedResult,
    #[serde(default)]
    stats: serde_json::Value,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base = cli.api_url.trim_end_matches('/');
    let client = reqwest::Client::new();

    match cli.command {
        Some(Commands::Health) => {
            let url = format!("{base}/health");
            tracing::debug!(%url, "Checking health");
            let response = client
                .get(&url)
                .send()
                .await
                .with_context(|| format!("Failed to reach {url}"))?;
            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                anyhow::bail!("{status}: {body}");
            }
            println!("{body}");
        }
        Some(Commands::Run { file, json }) => {
            let script = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read script {}", file.display()))?;
            let url = format!("{base}/pixie");
            tracing::debug!(%url, script_len = script.len(), "Submitting script");

            let response = client
                .post(&url)
                .json(&serde_json::json!({ "script": script }))
                .send()
                .await
                .with_context(|| format!("Failed to reach {url}"))?;
            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                anyhow::bail!("{status}: {body}");
            }

            if json {
                println!("{body}");
            } else {
                let output: ScriptOutput =
                    serde_json::from_str(&body).context("Unexpected response from server")?;
                tracing::debug!(stats = %output.stats, "Script finished");
                print!("{}", render_tsv(&output.result));
            }
        }
        None => {
            println!("pxgate CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

/// Renders a result as tab-separated lines, header first.
fn render_tsv(result: &AccumulatedResult) -> String {
    let mut out = String::new();
    if !result.columns.is_empty() {
        out.push_str(&result.columns.join("\t"));
        out.push('\n');
    }
    for row in &result.rows {
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}
