//! Station pipeline E2E tests
//!
//! Test flow:
//! 1. Provision per-test-run topics (random suffixes avoid conflicts)
//! 2. Seed raw station records through the topic-ensuring publisher
//! 3. Run the transform agent until the input is drained
//! 4. Verify the output topic and the changelog-rebuilt table

use std::time::Duration;

use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::ClientConfig;
use station_stream::agent;
use station_stream::changelog::{ChangelogStore, KafkaChangelog};
use station_stream::table::StationTable;
use station_stream::{
    BrokerOpts, Line, ProvisionedTopics, Publisher, StationDerived, TopicProvisioner, TopicSpec,
};
use station_stream_publisher::testdata;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

fn broker_opts() -> BrokerOpts {
    let brokers = std::env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());
    BrokerOpts {
        brokers: brokers.split(',').map(str::to_string).collect(),
        schema_registry_url: "http://localhost:8081".to_string(),
    }
}

fn test_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[tokio::test]
#[ignore = "requires a Kafka broker (set KAFKA_BROKERS, default localhost:9092)"]
async fn test_ensure_topic_is_idempotent() -> anyhow::Result<()> {
    let opts = broker_opts();
    let topic = format!("test-provision-{}", test_id());
    let spec = TopicSpec::new(&topic, 2, 1);

    let provisioner = TopicProvisioner::connect(&opts.bootstrap_servers())?;
    provisioner.ensure_topic(&spec).await?;

    // Second call must see the topic in metadata and succeed without a
    // creation attempt.
    provisioner.ensure_topic(&spec).await?;

    Ok(())
}

#[tokio::test]
#[ignore = "requires a Kafka broker (set KAFKA_BROKERS, default localhost:9092)"]
async fn test_publisher_creates_topic_before_first_send() -> anyhow::Result<()> {
    let opts = broker_opts();
    let topic = format!("test-processed-{}", test_id());

    let provisioned = ProvisionedTopics::new();
    let publisher = Publisher::new(
        &opts,
        TopicSpec::single_partition(&topic),
        "station.derived.key.v1",
        Some("station.derived.value.v1".to_string()),
        &provisioned,
    )
    .await?;

    assert!(provisioned.contains(&topic));

    // The topic exists with the configured layout before the first send.
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", opts.bootstrap_servers())
        .set("group.id", format!("test-metadata-{}", test_id()))
        .create()?;
    let metadata = consumer.fetch_metadata(Some(&topic), Duration::from_secs(5))?;
    let topic_metadata = metadata
        .topics()
        .iter()
        .find(|t| t.name() == topic)
        .expect("topic should exist after publisher construction");
    assert_eq!(topic_metadata.partitions().len(), 1);

    publisher.send(&1i64, &serde_json::json!({"probe": true})).await?;
    publisher.close()?;

    Ok(())
}

#[tokio::test]
#[ignore = "requires a Kafka broker (set KAFKA_BROKERS, default localhost:9092)"]
async fn test_send_after_close_fails() -> anyhow::Result<()> {
    let opts = broker_opts();
    let topic = format!("test-closed-{}", test_id());

    let publisher = Publisher::new(
        &opts,
        TopicSpec::single_partition(&topic),
        "station.derived.key.v1",
        None,
        &ProvisionedTopics::new(),
    )
    .await?;

    publisher.close()?;
    let err = publisher.send(&1i64, &serde_json::json!({})).await.unwrap_err();
    assert!(matches!(err, station_stream::SendError::Closed));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a Kafka broker (set KAFKA_BROKERS, default localhost:9092)"]
async fn test_station_pipeline_end_to_end() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("station_stream=debug")
        .try_init()
        .ok();

    let opts = broker_opts();
    let id = test_id();
    let config = agent::Config {
        input_topic: format!("test-stations-{id}"),
        output_topic: format!("test-stations-processed-{id}"),
        changelog_topic: format!("test-stations-changelog-{id}"),
        group_id: format!("test-stations-stream-{id}"),
        session_timeout_ms: "6000".to_string(),
        auto_offset_reset: "earliest".to_string(),
    };

    // Seed raw stations (plus one flagless record the agent must skip)
    // through the topic-ensuring publisher.
    let seed = Publisher::new(
        &opts,
        TopicSpec::single_partition(&config.input_topic),
        "station.raw.key.v1",
        Some("station.raw.value.v1".to_string()),
        &ProvisionedTopics::new(),
    )
    .await?;

    let stations = testdata::sample_stations();
    for station in &stations {
        seed.send(&station.station_id, station).await?;
    }
    let flagless = testdata::flagless_station();
    seed.send(&flagless.station_id, &flagless).await?;
    seed.close()?;

    // Run the agent long enough to drain the input, then cancel.
    let shutdown = CancellationToken::new();
    let agent_handle = tokio::spawn({
        let broker = opts.clone();
        let config = config.clone();
        let shutdown = shutdown.clone();
        async move { agent::run_agent(broker, config, shutdown).await }
    });

    sleep(Duration::from_secs(10)).await;
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(10), agent_handle).await???;

    // The rebuilt table reflects every derivable station, and not the
    // flagless one.
    let changelog = KafkaChangelog::connect(&opts.bootstrap_servers(), &config.changelog_topic)?;
    let table = StationTable::rebuild(changelog.replay().await?);
    assert_eq!(table.len(), stations.len());
    assert_eq!(table.get(40900).unwrap().line, Line::Red);
    assert_eq!(table.get(40380).unwrap().line, Line::Green);
    assert!(table.get(flagless.station_id).is_none());

    // The output topic carries the derived records in input order.
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", opts.bootstrap_servers())
        .set("group.id", format!("test-output-{id}"))
        .set("auto.offset.reset", "earliest")
        .create()?;
    consumer.subscribe(&[&config.output_topic])?;

    let mut forwarded = Vec::new();
    while forwarded.len() < stations.len() {
        let msg = tokio::time::timeout(Duration::from_secs(10), consumer.recv()).await??;
        let derived: StationDerived =
            serde_json::from_slice(msg.payload().expect("derived record payload"))?;
        forwarded.push(derived);
    }

    let expected: Vec<StationDerived> =
        stations.iter().map(|s| s.derive().unwrap()).collect();
    assert_eq!(forwarded, expected);

    Ok(())
}
