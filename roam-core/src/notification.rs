use async_trait::async_trait;
use roam_shared::PaymentNotification;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Failed to encode notification: {0}")]
    Encode(String),
    #[error("Notification queue unavailable: {0}")]
    Unavailable(String),
}

/// Producer side of the notification queue.
///
/// Implementations hand the message to their transport and return; they never
/// wait for the consumer, which may live in another process.
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    async fn enqueue(&self, notification: PaymentNotification) -> Result<(), QueueError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}
