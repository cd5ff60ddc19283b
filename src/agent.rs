//! Station transform agent.
//!
//! Consumes raw station change records from the input topic, derives the
//! simplified line-labelled record, forwards it to the processed-stations
//! topic and upserts the changelog-backed station table. Records are
//! processed one at a time to completion, preserving per-key update order
//! within the partition.
//!
//! The forward and the changelog append are two separate broker calls with
//! no transaction spanning them: a crash between the two can leave the
//! output topic one record ahead of or behind the table. Accepted
//! limitation; the surrounding orchestration owns any reconciliation.

use anyhow::{Context, Result};
use clap::Parser;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::ClientConfig;
use station_stream_provision::{ProvisionedTopics, TopicProvisioner, TopicSpec};
use station_stream_publisher::{BrokerOpts, Publisher};
use station_types::StationRaw;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::changelog::{ChangelogStore, KafkaChangelog};
use crate::table::StationTable;

/// Configuration for the station transform agent.
#[derive(Debug, Clone, Parser)]
pub struct Config {
    /// Topic carrying raw station records from the upstream connector
    #[clap(long, default_value = "stations")]
    pub input_topic: String,

    /// Topic receiving derived station records
    #[clap(long, default_value = "chicago.transport.stations.processed")]
    pub output_topic: String,

    /// Single-partition changelog topic backing the station table
    #[clap(long, default_value = "chicago.transport.stations.table.changelog")]
    pub changelog_topic: String,

    /// Consumer group ID
    #[clap(long, default_value = "stations-stream")]
    pub group_id: String,

    /// Session timeout in milliseconds
    #[clap(long, default_value = "6000")]
    pub session_timeout_ms: String,

    /// Auto offset reset strategy ("earliest" or "latest"). Earliest avoids
    /// missed updates when the group has no committed offsets yet.
    #[clap(long, default_value = "earliest")]
    pub auto_offset_reset: String,
}

/// Run the agent until `shutdown` is cancelled or the consumer fails.
///
/// Startup replays the changelog topic from the earliest offset and rebuilds
/// the table before any record is consumed. Shutdown is cooperative: the
/// token is only observed between records, so an in-flight record's
/// forward+upsert completes before resources are released.
pub async fn run_agent(
    broker: BrokerOpts,
    config: Config,
    shutdown: CancellationToken,
) -> Result<()> {
    info!(
        "starting station transform agent: {} -> {} (changelog {})",
        config.input_topic, config.output_topic, config.changelog_topic
    );

    // The agent owns the table, so it also owns the existence of the
    // table's changelog topic.
    let provisioned = ProvisionedTopics::new();
    let provisioner = TopicProvisioner::connect(&broker.bootstrap_servers())?;
    provisioner
        .ensure_topic(&TopicSpec::single_partition(&config.changelog_topic))
        .await?;
    provisioned.mark(config.changelog_topic.clone());

    // Rebuild the table from its changelog before serving anything.
    let changelog = KafkaChangelog::connect(&broker.bootstrap_servers(), &config.changelog_topic)?;
    let entries = changelog.replay().await?;
    let mut table = StationTable::rebuild(entries);
    info!("rebuilt station table with {} entries", table.len());

    // Output publisher; ensures the single-partition output topic exists
    // before the first record is forwarded.
    let publisher = Publisher::new(
        &broker,
        TopicSpec::single_partition(&config.output_topic),
        "station.derived.key.v1",
        Some("station.derived.value.v1".to_string()),
        &provisioned,
    )
    .await
    .context("failed to construct output publisher")?;

    let consumer = input_consumer(&broker, &config)?;

    let mut processed: u64 = 0;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown requested, stopping consumption");
                break;
            }
            msg = consumer.recv() => {
                let msg = msg.context("consumer error on input topic")?;
                if process_record(&msg, &publisher, &changelog, &mut table).await? {
                    processed += 1;
                    if processed % 100 == 0 {
                        info!("processed {processed} station records");
                    }
                }
                consumer
                    .commit_message(&msg, CommitMode::Async)
                    .context("failed to commit input offset")?;
            }
        }
    }

    publisher
        .close()
        .context("failed to flush output publisher")?;
    info!("station transform agent stopped after {processed} records");

    Ok(())
}

fn input_consumer(broker: &BrokerOpts, config: &Config) -> Result<StreamConsumer> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", broker.bootstrap_servers())
        .set("group.id", &config.group_id)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", &config.auto_offset_reset)
        .set("session.timeout.ms", &config.session_timeout_ms)
        .set("enable.partition.eof", "false")
        .create()
        .context("failed to create input consumer")?;

    consumer
        .subscribe(&[&config.input_topic])
        .with_context(|| format!("failed to subscribe to {}", config.input_topic))?;

    Ok(consumer)
}

/// Process one input record to completion: derive, forward, append to the
/// changelog, upsert the table.
///
/// Returns `Ok(true)` if the record produced effects, `Ok(false)` if it was
/// skipped as a data-quality error. Send and changelog failures propagate
/// and stop the agent; per-record data errors do not.
async fn process_record(
    msg: &BorrowedMessage<'_>,
    publisher: &Publisher,
    changelog: &dyn ChangelogStore,
    table: &mut StationTable,
) -> Result<bool> {
    let Some(payload) = msg.payload() else {
        error!("skipping station record with no payload at offset {}", msg.offset());
        return Ok(false);
    };

    let raw: StationRaw = match serde_json::from_slice(payload) {
        Ok(raw) => raw,
        Err(e) => {
            error!(
                "skipping undecodable station record at offset {}: {e}",
                msg.offset()
            );
            return Ok(false);
        }
    };

    let derived = match raw.derive() {
        Ok(derived) => derived,
        Err(e) => {
            // Data-quality error upstream; skip rather than invent a line.
            error!("skipping station record: {e}");
            return Ok(false);
        }
    };

    debug!(
        "station {} ({}) derived line {}",
        derived.station_id, derived.station_name, derived.line
    );

    publisher
        .send(&derived.station_id, &derived)
        .await
        .with_context(|| format!("failed to forward station {}", derived.station_id))?;

    changelog.append(derived.station_id, &derived).await?;
    table.upsert(derived);

    Ok(true)
}
