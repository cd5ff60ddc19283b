//! station-stream
//!
//! A small real-time pipeline over Kafka for transit station data:
//!
//! - Upstream change-data-capture publishes raw station records to the
//!   `stations` topic.
//! - The transform agent ([`agent`]) consumes them, collapses the per-line
//!   boolean flags into a single `line` label and republishes the derived
//!   records to the processed-stations topic.
//! - The agent also maintains a keyed materialized view of stations
//!   ([`table`]) backed by a changelog topic ([`changelog`]) so the view is
//!   reconstructible by replay after a restart.
//!
//! Topic provisioning and publishing live in the
//! `station-stream-provision` and `station-stream-publisher` crates; the
//! shared record types in `station-types`.
//!
//! # CLI Usage
//!
//! ```bash
//! # Run the transform agent against a local broker
//! station-stream agent --brokers localhost:9092
//!
//! # Override the topic layout
//! station-stream agent \
//!   --input-topic stations \
//!   --output-topic chicago.transport.stations.processed \
//!   --changelog-topic chicago.transport.stations.table.changelog
//! ```

pub mod agent;
pub mod changelog;
pub mod table;
pub mod weather;

// Re-export the shared pipeline types for convenience
pub use station_stream_provision::{ProvisionError, ProvisionedTopics, TopicProvisioner, TopicSpec};
pub use station_stream_publisher::{BrokerOpts, Publisher, PublisherError, SendError};
pub use station_types::{DerivationError, Line, StationDerived, StationRaw};
