use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A property offered for booking by its host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub host_id: Uuid,
    pub title: String,
    pub price_per_night: Decimal,
    pub description: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}
