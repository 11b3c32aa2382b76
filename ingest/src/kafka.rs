// Kafka fix-event publisher
use std::time::Duration;

use async_trait::async_trait;
use fleetlink_common::{FixEvent, FleetlinkError, Result};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use tracing::info;

use crate::sink::FixPublisher;

pub struct KafkaFixPublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaFixPublisher {
    /// Build the producer. The broker connection is established lazily;
    /// an unreachable broker surfaces as per-publish errors and does not
    /// stop the service from starting.
    pub fn new(brokers: &str, topic: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("client.id", "fleetlink-ingest")
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| FleetlinkError::PublishError(format!("Producer creation failed: {}", e)))?;
        info!("✅ Kafka producer configured for topic {}", topic);
        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl FixPublisher for KafkaFixPublisher {
    async fn publish(&self, event: &FixEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        let key = event.camera_id.to_string();

        self.producer
            .send(
                FutureRecord::to(&self.topic).key(&key).payload(&payload),
                Timeout::After(Duration::from_secs(5)),
            )
            .await
            .map_err(|(e, _)| FleetlinkError::PublishError(e.to_string()))?;
        Ok(())
    }
}
