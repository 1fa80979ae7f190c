//! Command-line interface for stock-report

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use report_core::{ProgressEvent, ReportKind};
use report_utils::{LogFormat, init_tracing};
use std::net::SocketAddr;
use stock_report::{ReportConfig, ReportService, server};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stock-report")]
#[command(about = "Multi-factor scored stock reports", long_about = None)]
struct Args {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP/SSE API
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
    /// Produce a report, printing progress then the report JSON
    Generate {
        ticker: String,
        /// Report kind (fundamental or growth)
        #[arg(long, default_value_t = ReportKind::Fundamental)]
        kind: ReportKind,
        /// Ignore any stored report
        #[arg(long)]
        recreate: bool,
    },
    /// Delete stored datasets and reports for a ticker
    Purge { ticker: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_tracing(format, "info");

    let config = ReportConfig::from_env().context("invalid configuration")?;
    let service = ReportService::from_config(config).context("failed to start report service")?;

    match args.command {
        Command::Serve { addr } => {
            info!("Starting stock-report server");
            server::serve(service, addr).await?;
        }
        Command::Generate {
            ticker,
            kind,
            recreate,
        } => {
            let mut progress = service.get_or_generate(&ticker, kind, recreate)?;
            while let Some(event) = progress.next().await {
                match event {
                    ProgressEvent::Message(text) => eprintln!("- {text}"),
                    ProgressEvent::Completed(report) => {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    }
                    ProgressEvent::Error(text) => bail!("report failed: {text}"),
                }
            }
        }
        Command::Purge { ticker } => {
            let summary = service.purge(&ticker).await?;
            println!(
                "Removed {} datasets and {} reports for {}",
                summary.datasets,
                summary.reports,
                ticker.trim().to_uppercase()
            );
        }
    }

    Ok(())
}
