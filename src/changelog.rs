//! Durable append-only changelog backing the station table.
//!
//! [`ChangelogStore`] separates durability from lookup: the store owns the
//! append-only log and its replay-from-start operation, while
//! [`crate::table::StationTable`] is rebuilt by folding the replayed
//! entries. [`KafkaChangelog`] is the production store backed by a
//! single-partition topic; [`MemoryChangelog`] backs tests and local runs.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::{ClientConfig, Offset, TopicPartitionList};
use station_types::StationDerived;
use tracing::{debug, error, info};

/// Append-only log of table upserts with a replay-from-start operation.
#[async_trait]
pub trait ChangelogStore: Send + Sync {
    /// Append an upsert for `station_id` to the log.
    async fn append(&self, station_id: i64, station: &StationDerived) -> Result<()>;

    /// Replay every entry from the start of the log, oldest first.
    async fn replay(&self) -> Result<Vec<(i64, StationDerived)>>;
}

/// Changelog backed by a single-partition Kafka topic.
///
/// Entries are JSON records keyed by `station_id`. Replay reads partition 0
/// from the beginning up to the high watermark observed before consuming,
/// so a rebuild sees exactly the upserts that were durable at startup.
pub struct KafkaChangelog {
    brokers: String,
    topic: String,
    producer: FutureProducer,
}

impl KafkaChangelog {
    pub fn connect(brokers: &str, topic: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .context("failed to create changelog producer")?;

        Ok(Self {
            brokers: brokers.to_string(),
            topic: topic.to_string(),
            producer,
        })
    }

    fn replay_consumer(&self) -> Result<StreamConsumer> {
        // Fresh group per rebuild so replay always starts from the
        // beginning regardless of previously committed offsets.
        let group_id = format!("station-table-rebuild-{}", uuid::Uuid::new_v4());

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", &group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("enable.partition.eof", "false")
            .create()
            .context("failed to create changelog replay consumer")?;

        Ok(consumer)
    }
}

#[async_trait]
impl ChangelogStore for KafkaChangelog {
    async fn append(&self, station_id: i64, station: &StationDerived) -> Result<()> {
        let key = serde_json::to_vec(&station_id)?;
        let payload = serde_json::to_vec(station)?;

        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);

        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(err, _)| err)
            .with_context(|| format!("failed to append to changelog topic {}", self.topic))?;

        debug!("appended changelog entry for station {station_id}");
        Ok(())
    }

    async fn replay(&self) -> Result<Vec<(i64, StationDerived)>> {
        let consumer = self.replay_consumer()?;

        let (low, high) = consumer
            .fetch_watermarks(&self.topic, 0, Duration::from_secs(5))
            .with_context(|| format!("failed to fetch watermarks for {}", self.topic))?;

        if high <= low {
            info!("changelog topic {} is empty, nothing to replay", self.topic);
            return Ok(Vec::new());
        }

        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(&self.topic, 0, Offset::Beginning)?;
        consumer.assign(&tpl)?;

        let mut entries = Vec::new();
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(10), consumer.recv())
                .await
                .context("timed out replaying changelog")?
                .context("changelog replay consumer error")?;

            match decode_entry(msg.key(), msg.payload()) {
                Ok(entry) => entries.push(entry),
                // A corrupt entry is skipped; the matching table state is
                // simply the last good upsert for that key.
                Err(e) => error!(
                    "skipping undecodable changelog entry at offset {}: {e}",
                    msg.offset()
                ),
            }

            if msg.offset() >= high - 1 {
                break;
            }
        }

        info!(
            "replayed {} changelog entries from {}",
            entries.len(),
            self.topic
        );
        Ok(entries)
    }
}

fn decode_entry(key: Option<&[u8]>, payload: Option<&[u8]>) -> Result<(i64, StationDerived)> {
    let key = key.context("changelog entry has no key")?;
    let payload = payload.context("changelog entry has no payload")?;

    let station_id: i64 = serde_json::from_slice(key)?;
    let station: StationDerived = serde_json::from_slice(payload)?;
    Ok((station_id, station))
}

/// In-process changelog used by tests and memory-store local runs.
#[derive(Debug, Default)]
pub struct MemoryChangelog {
    entries: Mutex<Vec<(i64, StationDerived)>>,
}

impl MemoryChangelog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChangelogStore for MemoryChangelog {
    async fn append(&self, station_id: i64, station: &StationDerived) -> Result<()> {
        self.entries
            .lock()
            .expect("changelog lock")
            .push((station_id, station.clone()));
        Ok(())
    }

    async fn replay(&self) -> Result<Vec<(i64, StationDerived)>> {
        Ok(self.entries.lock().expect("changelog lock").clone())
    }
}
