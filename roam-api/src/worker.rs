use std::sync::Arc;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use roam_booking::{BookingCoordinator, NotificationWorker};
use roam_shared::PaymentNotification;
use tracing::{error, info, warn};

/// Consume payment notifications and send the matching emails.
///
/// Runs until the process exits; only consumer setup can fail.
pub async fn start_notification_worker(
    brokers: String,
    group_id: String,
    topic: String,
    worker: Arc<NotificationWorker>,
) -> Result<(), KafkaError> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &brokers)
        .set("group.id", &group_id)
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", "earliest")
        .create()?;

    consumer.subscribe(&[topic.as_str()])?;

    info!("Notification worker started, listening to {}...", topic);

    loop {
        match consumer.recv().await {
            Err(e) => error!("Kafka error: {}", e),
            Ok(m) => match m.payload_view::<str>() {
                Some(Ok(payload)) => process_payload(&worker, payload).await,
                Some(Err(e)) => error!("Error reading payload: {}", e),
                None => warn!("Skipping empty message at offset {}", m.offset()),
            },
        }
    }
}

async fn process_payload(worker: &NotificationWorker, payload: &str) {
    match serde_json::from_str::<PaymentNotification>(payload) {
        Ok(notification) => {
            let result = worker.handle(&notification).await;
            info!("Notification for booking {}: {}", notification.booking_id, result);
        }
        Err(e) => error!("Discarding malformed notification {:?}: {}", payload, e),
    }
}

/// Reconcile period; zero is raised to one second since `interval` panics on it.
pub fn reconcile_period(interval_seconds: u64) -> Duration {
    Duration::from_secs(interval_seconds.max(1))
}

/// Periodically repair pending bookings left behind a completed payment.
pub async fn start_reconcile_loop(coordinator: BookingCoordinator, interval_seconds: u64) {
    let mut ticker = tokio::time::interval(reconcile_period(interval_seconds));
    // The first tick fires immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match coordinator.reconcile().await {
            Ok(0) => {}
            Ok(repaired) => info!("Reconciliation confirmed {} bookings", repaired),
            Err(e) => error!("Reconciliation failed: {}", e),
        }
    }
}
