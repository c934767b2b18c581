//! Airfacts Ingest - OpenFlights graph loader

use airfacts_common::logging::{init_logging, LogConfig, LogLevel};
use airfacts_ingest::config::IngestConfig;
use airfacts_ingest::graph::Neo4jStore;
use airfacts_ingest::pipeline::{check_store, IngestPipeline};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "airfacts-ingest")]
#[command(author, version, about = "Load OpenFlights airports, airlines and routes into the graph store")]
struct Cli {
    /// Runs the full ingestion when omitted
    #[command(subcommand)]
    command: Option<Command>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify graph connectivity and print node and relationship counts
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match setup_logging(cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        },
    };

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        },
    }
}

fn setup_logging(verbose: bool) -> Result<airfacts_common::logging::LoggingGuard> {
    let level = if verbose { LogLevel::Debug } else { LogLevel::Info };

    // Environment variables take precedence over the flag
    let log_config = LogConfig::builder()
        .level(level)
        .log_file_prefix("airfacts-ingest")
        .build()
        .apply_env()?;

    Ok(init_logging(&log_config)?)
}

async fn run(command: Option<Command>) -> Result<ExitCode> {
    let config = IngestConfig::load().context("Invalid configuration")?;
    info!(graph = ?config.graph, batch = ?config.batch, "Loaded configuration");

    let store = Neo4jStore::connect(&config.graph)
        .await
        .context("Failed to create graph store client")?;

    match command {
        Some(Command::Check) => {
            let counts = check_store(&store).await?;
            println!("Graph store reachable at {}", config.graph.uri);
            println!("{}", counts);
            Ok(ExitCode::SUCCESS)
        },
        None => ingest(config, store).await,
    }
}

async fn ingest(config: IngestConfig, store: Neo4jStore) -> Result<ExitCode> {
    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let pipeline = IngestPipeline::new(config, store, cancel)?;
    let outcome = pipeline.run().await;

    println!("{}", outcome.summary);

    match outcome.error {
        None => Ok(ExitCode::SUCCESS),
        Some(e) => {
            error!(error = %e, "Ingestion failed");
            println!("Ingestion failed: {}", e);
            Ok(ExitCode::FAILURE)
        },
    }
}

/// Cancel the run on Ctrl+C or SIGTERM
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, finishing the current batch before stopping");
        },
        _ = terminate => {
            info!("Received SIGTERM, finishing the current batch before stopping");
        },
    }

    cancel.cancel();
}
