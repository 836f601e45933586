use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Confirmation,
    Failure,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Confirmation => write!(f, "confirmation"),
            NotificationKind::Failure => write!(f, "failure"),
        }
    }
}

/// Message handed to the notification queue after a payment settles.
/// Carries only the booking id; the consumer looks everything else up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentNotification {
    pub kind: NotificationKind,
    pub booking_id: Uuid,
    pub timestamp: i64,
}

impl PaymentNotification {
    pub fn new(kind: NotificationKind, booking_id: Uuid) -> Self {
        Self {
            kind,
            booking_id,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
