//! Command-line interface for kafka-workload-generator
//!
//! # Usage Examples
//!
//! ```bash
//! # 10,000 records to Kafka from 4 producers, 500 records/sec each
//! kafka-workload-generator \
//!   --topic orders \
//!   --payload-template order.hbs \
//!   --num-records 10000 \
//!   --num-producers 4 \
//!   --throughput 500
//!
//! # Same template, 2,000 records/sec for the whole pool, custom client settings
//! kafka-workload-generator -t orders -f order.hbs -r 10000 -n 4 \
//!   --throughput 2000 --throughput-scope global \
//!   --producer-config producer.properties
//!
//! # Batch mode: write payloads to a file instead of Kafka
//! kafka-workload-generator --mode batch -f order.hbs -r 1000 -o orders.jsonl
//! ```
//!
//! Every option can also be set through its environment variable
//! (`TOPIC`, `NUM_RECORDS`, `NUM_THREADS`, `THROUGHPUT`, ...); command-line
//! values take precedence.

use anyhow::Context;
use clap::Parser;
use kafka_workload_generator::{run_workload, WorkloadArgs, WorkloadConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "kafka-workload-generator")]
#[command(about = "Generate synthetic Kafka workloads from payload templates")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    args: WorkloadArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing on stderr; batch mode may own stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = WorkloadConfig::from_args(cli.args).context("Invalid configuration")?;

    let shutdown = setup_shutdown_handler().context("Failed to install signal handlers")?;
    let report = run_workload(config, shutdown).await?;

    if report.dispatch.interrupted {
        warn!(
            "Run interrupted after sending {} of {} records",
            report.dispatch.total_sent, report.target_records
        );
    } else {
        info!(
            "Run complete: {} sent, {} failed, {} skipped in {} ms ({:.2} records/sec)",
            report.dispatch.total_sent,
            report.dispatch.total_failed,
            report.generation.failed,
            report.dispatch.duration_ms,
            report.dispatch.records_per_second
        );
    }
    Ok(())
}

/// Cancel the returned token on Ctrl+C or, on Unix, SIGTERM. The SIGTERM
/// handler is installed before this returns.
fn setup_shutdown_handler() -> std::io::Result<CancellationToken> {
    let token = CancellationToken::new();
    let trigger = token.clone();

    #[cfg(unix)]
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::spawn(async move {
        #[cfg(unix)]
        let received = tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| "interrupt signal (Ctrl+C)"),
            _ = terminate.recv() => Ok("termination signal (SIGTERM)"),
        };
        #[cfg(not(unix))]
        let received = tokio::signal::ctrl_c()
            .await
            .map(|()| "interrupt signal (Ctrl+C)");

        match received {
            Ok(signal) => {
                info!("Received {}, draining producers", signal);
                trigger.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    Ok(token)
}
