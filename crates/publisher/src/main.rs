//! Seed producer publishing sample station records.
//!
//! Ensures the target topic exists (via the publisher's provisioning path)
//! and publishes the sample CTA stations keyed by `station_id`, so the
//! transform agent has input to chew on.
//!
//! To run against a local broker:
//! 1. Start Kafka:
//!    docker run -d --name kafka -p 9092:9092 apache/kafka:latest
//! 2. Seed the stations topic:
//!    cargo run -p station-stream-publisher --bin station-seed
//! 3. Run the agent in another terminal:
//!    cargo run -p station-stream -- agent

use std::time::Duration;

use clap::Parser;
use station_stream_provision::{ProvisionedTopics, TopicSpec};
use station_stream_publisher::{testdata, BrokerOpts, Publisher};
use tracing::info;

#[derive(Parser)]
#[command(name = "station-seed")]
#[command(about = "Publish sample station records to the stations topic")]
struct Cli {
    #[command(flatten)]
    broker: BrokerOpts,

    /// Topic to seed with raw station records
    #[clap(long, default_value = "stations")]
    topic: String,

    /// Partition count used if the topic has to be created
    #[clap(long, default_value_t = 1)]
    partitions: i32,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run_main().await {
        Ok(count) => println!("Seeded {count} station records"),
        Err(e) => {
            eprintln!("Error: {e:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<usize> {
    let cli = Cli::parse();

    let provisioned = ProvisionedTopics::new();
    let publisher = Publisher::new(
        &cli.broker,
        TopicSpec::new(&cli.topic, cli.partitions, 1),
        "station.raw.key.v1",
        Some("station.raw.value.v1".to_string()),
        &provisioned,
    )
    .await?;

    let stations = testdata::sample_stations();
    let mut count = 0;
    for station in &stations {
        publisher.send(&station.station_id, station).await?;
        count += 1;
        info!(
            "published station {} ({}) to {}",
            station.station_id, station.station_name, cli.topic
        );

        // Small delay between records so consumers can be watched live
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    publisher.close()?;

    Ok(count)
}
