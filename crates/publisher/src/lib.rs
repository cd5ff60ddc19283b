//! Topic-ensuring Kafka publisher.
//!
//! [`Publisher`] guarantees its target topic exists (creating it with the
//! desired partition/replication layout if absent) before accepting any
//! send, serializes keyed records as JSON, and drains outstanding sends on
//! [`Publisher::close`]. Closing is also wired into `Drop`, so the flush
//! runs on every exit path even when the caller errors out early.
//!
//! The `station-seed` binary in this crate publishes sample station records
//! through a `Publisher`, exercising provisioning end to end against a live
//! broker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use serde::Serialize;
use station_stream_provision::{ProvisionedTopics, TopicProvisioner, TopicSpec};
use tracing::{debug, warn};

pub mod error;
pub mod testdata;

pub use error::{PublisherError, SendError};

/// Broker and schema-registry endpoints shared by every component that
/// talks to the cluster.
#[derive(Debug, Clone, Parser)]
pub struct BrokerOpts {
    /// Kafka bootstrap servers (comma-separated)
    #[clap(
        long,
        env = "KAFKA_BROKERS",
        value_delimiter = ',',
        default_value = "localhost:9092"
    )]
    pub brokers: Vec<String>,

    /// Schema registry endpoint resolving the key/value schema subjects
    #[clap(
        long,
        env = "SCHEMA_REGISTRY_URL",
        default_value = "http://localhost:8081"
    )]
    pub schema_registry_url: String,
}

impl BrokerOpts {
    /// The comma-joined bootstrap server list rdkafka expects.
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }
}

/// Kafka publisher that provisions its target topic before the first send.
///
/// Owns its producer connection for its lifetime. Records are keyed and
/// JSON-serialized; the key/value schema subjects the records are
/// registered under travel with the publisher so downstream consumers can
/// resolve them against the registry.
pub struct Publisher {
    topic: String,
    key_schema: String,
    value_schema: Option<String>,
    producer: FutureProducer,
    closed: AtomicBool,
    send_timeout: Duration,
}

impl Publisher {
    /// Create a publisher for `spec.name`, provisioning the topic first if
    /// this process has not done so already.
    ///
    /// Construction fails if provisioning fails; a publisher never comes up
    /// pointing at a topic that may not exist.
    pub async fn new(
        opts: &BrokerOpts,
        spec: TopicSpec,
        key_schema: impl Into<String>,
        value_schema: Option<String>,
        provisioned: &ProvisionedTopics,
    ) -> Result<Self, PublisherError> {
        if !provisioned.contains(&spec.name) {
            let provisioner = TopicProvisioner::connect(&opts.bootstrap_servers())?;
            provisioner.ensure_topic(&spec).await?;
            provisioned.mark(spec.name.clone());
        }

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", opts.bootstrap_servers())
            .set("message.timeout.ms", "5000")
            .create()?;

        let key_schema = key_schema.into();
        debug!(
            "publisher ready for topic {} (key schema {}, value schema {:?}, registry {})",
            spec.name, key_schema, value_schema, opts.schema_registry_url
        );

        Ok(Self {
            topic: spec.name,
            key_schema,
            value_schema,
            producer,
            closed: AtomicBool::new(false),
            send_timeout: Duration::from_secs(5),
        })
    }

    /// The topic this publisher sends to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The schema subject the record keys are registered under.
    pub fn key_schema(&self) -> &str {
        &self.key_schema
    }

    /// The schema subject the record values are registered under, if any.
    pub fn value_schema(&self) -> Option<&str> {
        self.value_schema.as_deref()
    }

    /// Serialize and send a keyed record, awaiting broker acknowledgement.
    pub async fn send<K, V>(&self, key: &K, value: &V) -> Result<(), SendError>
    where
        K: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SendError::Closed);
        }

        let key_bytes =
            serde_json::to_vec(key).map_err(|e| SendError::DeliveryFailed(e.to_string()))?;
        let payload =
            serde_json::to_vec(value).map_err(|e| SendError::DeliveryFailed(e.to_string()))?;

        let record = FutureRecord::to(&self.topic).key(&key_bytes).payload(&payload);

        self.producer
            .send(record, self.send_timeout)
            .await
            .map_err(|(err, _)| SendError::DeliveryFailed(err.to_string()))?;

        Ok(())
    }

    /// Current wall-clock time in milliseconds, for callers needing a
    /// default record key when no natural key exists.
    pub fn time_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Flush all outstanding sends and stop accepting new ones.
    ///
    /// Idempotent; a second call is a no-op. Sends attempted afterwards
    /// fail with [`SendError::Closed`].
    pub fn close(&self) -> Result<(), SendError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        debug!("flushing publisher for topic {}", self.topic);
        self.producer
            .flush(Duration::from_secs(10))
            .map_err(|e| SendError::DeliveryFailed(e.to_string()))
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            if let Err(e) = self.close() {
                warn!("failed to flush publisher for topic {}: {e}", self.topic);
            }
        }
    }
}
