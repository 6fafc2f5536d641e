//! Command-line interface for address-feed
//!
//! # Usage Examples
//!
//! ```bash
//! # Publish records matching "kafka" as plain JSON
//! address-feed produce
//!
//! # Publish Avro records through a schema registry
//! SCHEMA_REGISTRY_URL=http://localhost:8081 \
//!   address-feed produce --type avro --topic addresses-avro "rue de rivoli"
//!
//! # Publish records consumers cannot decode
//! address-feed produce --type malformed --topic broken
//!
//! # Read a topic back
//! address-feed consume --topic addresses-avro --brokers localhost:9092
//! ```
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`); consumed
//! records go to stdout.

use address_feed::consume::{run_consume, ConsumeArgs};
use address_feed::produce::{run_produce, ProduceArgs};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "address-feed")]
#[command(about = "Publish French address records to Kafka in various formats")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch addresses and produce them to a topic
    Produce {
        #[command(flatten)]
        args: ProduceArgs,
    },

    /// Print the records of a topic
    Consume {
        #[command(flatten)]
        args: ConsumeArgs,
    },
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
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Produce { args } => {
            let report = run_produce(args).await?;
            tracing::info!(
                "Done: {} delivered, {} skipped, {} failed",
                report.delivered.len(),
                report.skipped.len(),
                report.failed.len()
            );
        }
        Commands::Consume { args } => run_consume(args).await?,
    }

    Ok(())
}
