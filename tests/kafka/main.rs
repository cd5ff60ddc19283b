//! Kafka E2E tests
//!
//! Tests for topic provisioning, the topic-ensuring publisher and the
//! station transform agent against a live broker. The broker address comes
//! from `KAFKA_BROKERS` (default `localhost:9092`); the tests are ignored
//! by default so the unit suite runs without any services.

mod pipeline;
