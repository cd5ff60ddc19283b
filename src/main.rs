//! Command-line interface for station-stream
//!
//! # Usage Examples
//!
//! ```bash
//! # Run the transform agent against a local broker
//! station-stream agent --brokers localhost:9092
//!
//! # Seed sample input first (separate binary in the publisher crate)
//! cargo run -p station-stream-publisher --bin station-seed
//! ```
//!
//! The agent runs until interrupted; ctrl-c triggers a cooperative
//! shutdown that lets the in-flight record finish before flushing the
//! output publisher.

use clap::{Parser, Subcommand};
use station_stream::agent;
use station_stream_publisher::BrokerOpts;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(name = "station-stream")]
#[command(about = "Derive line-labelled station records from transit change-data-capture events")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the station transform agent
    Agent {
        /// Broker and schema registry endpoints
        #[command(flatten)]
        broker: BrokerOpts,

        /// Agent topic and consumer configuration
        #[command(flatten)]
        config: agent::Config,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run_main().await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {e:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Agent { broker, config } => {
            let shutdown = CancellationToken::new();

            tokio::spawn({
                let shutdown = shutdown.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("received ctrl-c, shutting down");
                        shutdown.cancel();
                    }
                }
            });

            agent::run_agent(broker, config, shutdown).await?;
        }
    }

    Ok(())
}
