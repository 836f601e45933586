use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use roam_core::notification::{NotificationQueue, QueueError};
use roam_shared::PaymentNotification;
use tracing::{error, info};

/// Kafka producer for payment notifications.
///
/// `enqueue` only hands the record to librdkafka's buffer; delivery is
/// awaited on a detached task so request handlers never wait on the broker.
#[derive(Clone)]
pub struct NotificationProducer {
    producer: FutureProducer,
    topic: String,
}

impl NotificationProducer {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl NotificationQueue for NotificationProducer {
    async fn enqueue(&self, notification: PaymentNotification) -> Result<(), QueueError> {
        let payload = serde_json::to_string(&notification).map_err(|e| QueueError::Encode(e.to_string()))?;
        let key = notification.booking_id.to_string();

        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);
        let delivery = self
            .producer
            .send_result(record)
            .map_err(|(e, _record)| QueueError::Unavailable(e.to_string()))?;

        let topic = self.topic.clone();
        tokio::spawn(async move {
            match delivery.await {
                Ok(Ok(delivery)) => {
                    info!(
                        "Sent message to {}/{}: partition {} offset {}",
                        topic, key, delivery.partition, delivery.offset
                    );
                }
                Ok(Err((e, _msg))) => error!("Failed to send message to {}: {}", topic, e),
                Err(_) => error!("Delivery to {} was cancelled for key {}", topic, key),
            }
        });

        Ok(())
    }
}
