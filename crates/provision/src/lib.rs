//! Idempotent Kafka topic provisioning.
//!
//! [`TopicProvisioner::ensure_topic`] checks live cluster metadata and
//! creates a topic only if it is absent, so any number of publisher
//! instances can call it for their target topics before sending. The
//! existence check against the broker is authoritative; the
//! [`ProvisionedTopics`] cache merely skips redundant round trips for
//! topics already provisioned in the current process.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::ClientConfig;
use tracing::{debug, error, info};

pub mod error;

pub use error::{ProvisionError, Result};

/// Desired layout for a topic: name, partition count and replication factor.
///
/// Not persisted anywhere; the broker's own metadata is the source of truth
/// once the topic exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
}

impl TopicSpec {
    pub fn new(name: impl Into<String>, partitions: i32, replication_factor: i32) -> Self {
        Self {
            name: name.into(),
            partitions,
            replication_factor,
        }
    }

    /// The common single-partition, single-replica layout used by the
    /// processed-stations and changelog topics.
    pub fn single_partition(name: impl Into<String>) -> Self {
        Self::new(name, 1, 1)
    }
}

/// Process-wide set of topic names already provisioned in this run.
///
/// Shared across publisher instances by cloning; an explicit injected value
/// rather than hidden global state so construction stays testable. Purely an
/// optimization: the metadata check in [`TopicProvisioner::ensure_topic`]
/// remains authoritative.
#[derive(Debug, Clone, Default)]
pub struct ProvisionedTopics {
    names: Arc<Mutex<HashSet<String>>>,
}

impl ProvisionedTopics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the topic has already been provisioned in this process.
    pub fn contains(&self, name: &str) -> bool {
        self.names.lock().expect("provisioned topics lock").contains(name)
    }

    /// Record a topic as provisioned in this process.
    pub fn mark(&self, name: impl Into<String>) {
        self.names
            .lock()
            .expect("provisioned topics lock")
            .insert(name.into());
    }
}

/// Admin-client wrapper that creates topics on demand.
pub struct TopicProvisioner {
    admin: AdminClient<DefaultClientContext>,
    metadata_timeout: Duration,
}

impl TopicProvisioner {
    /// Connect an admin client to the given bootstrap servers.
    pub fn connect(bootstrap_servers: &str) -> Result<Self> {
        let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .create()
            .map_err(|e| ProvisionError::Unreachable(e.to_string()))?;

        Ok(Self {
            admin,
            metadata_timeout: Duration::from_secs(5),
        })
    }

    /// Ensure `spec.name` exists with the desired layout, creating it if
    /// absent.
    ///
    /// Idempotent: an already-existing topic is a debug-logged no-op, never
    /// an error. A rejected creation is logged and surfaced to the caller;
    /// it is the caller's process that decides whether that is fatal.
    pub async fn ensure_topic(&self, spec: &TopicSpec) -> Result<()> {
        debug!("checking topic {}", spec.name);

        let metadata = self
            .admin
            .inner()
            .fetch_metadata(None, self.metadata_timeout)
            .map_err(|e| ProvisionError::Unreachable(e.to_string()))?;

        if metadata.topics().iter().any(|t| t.name() == spec.name) {
            info!("topic {} already exists", spec.name);
            return Ok(());
        }

        info!(
            "creating topic {} with {} partitions and {} replicas",
            spec.name, spec.partitions, spec.replication_factor
        );

        let new_topic = NewTopic::new(
            &spec.name,
            spec.partitions,
            TopicReplication::Fixed(spec.replication_factor),
        );
        let opts = AdminOptions::new().operation_timeout(Some(Duration::from_secs(5)));

        let results = self
            .admin
            .create_topics(&[new_topic], &opts)
            .await
            .map_err(|e| ProvisionError::Unreachable(e.to_string()))?;

        for result in results {
            match result {
                Ok(name) => info!("topic {name} creation complete"),
                Err((name, code)) => {
                    error!("unable to create topic {name}: {code}");
                    return Err(ProvisionError::CreateFailed {
                        topic: name,
                        reason: code.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
