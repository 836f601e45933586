use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pii::Masked;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Masked<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
}

impl User {
    /// First name as sent to the payment provider; blank names become "Guest".
    pub fn payer_first_name(&self) -> &str {
        if self.first_name.trim().is_empty() {
            "Guest"
        } else {
            &self.first_name
        }
    }

    pub fn payer_last_name(&self) -> &str {
        self.last_name.trim()
    }
}
