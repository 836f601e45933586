use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

const TX_REF_PREFIX: &str = "tx-";
const TX_REF_RANDOM_LEN: usize = 32;

/// Status reported by the provider for a paid transaction.
pub const REMOTE_SUCCESS: &str = "success";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "COMPLETED" => Ok(PaymentStatus::Completed),
            "FAILED" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status {}", other)),
        }
    }
}

/// Result of checking a transaction with the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Completed { external_id: Option<String> },
    Failed,
}

impl PaymentOutcome {
    pub fn target_status(&self) -> PaymentStatus {
        match self {
            PaymentOutcome::Completed { .. } => PaymentStatus::Completed,
            PaymentOutcome::Failed => PaymentStatus::Failed,
        }
    }
}

impl From<VerifiedTransaction> for PaymentOutcome {
    fn from(verified: VerifiedTransaction) -> Self {
        if verified.is_success() {
            PaymentOutcome::Completed { external_id: verified.transaction_id }
        } else {
            PaymentOutcome::Failed
        }
    }
}

/// A payment for exactly one booking. Created PENDING by initiation and
/// settled once by verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub transaction_reference: String,
    pub external_transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn pending(booking_id: Uuid, amount: Decimal, currency: &str, transaction_reference: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            amount,
            currency: currency.to_string(),
            transaction_reference,
            external_transaction_id: None,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition: Pending → Completed | Failed
    pub fn settle(&mut self, outcome: &PaymentOutcome) -> Result<(), CoreError> {
        let to = outcome.target_status();
        if self.status.is_terminal() {
            return Err(CoreError::InvalidTransition { from: self.status, to });
        }

        if let PaymentOutcome::Completed { external_id } = outcome {
            self.external_transaction_id = external_id.clone();
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Fresh correlation reference for a new transaction, drawn from the OS RNG.
pub fn generate_transaction_reference() -> String {
    let random: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(TX_REF_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{}{}", TX_REF_PREFIX, random)
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransaction {
    pub amount: Decimal,
    pub currency: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tx_ref: String,
    pub callback_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializedTransaction {
    pub checkout_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedTransaction {
    pub status: String,
    pub transaction_id: Option<String>,
}

impl VerifiedTransaction {
    pub fn is_success(&self) -> bool {
        self.status == REMOTE_SUCCESS
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The provider answered with a non-success status. `payload` is its raw body.
    #[error("Payment gateway rejected the request (status {status}): {payload}")]
    Rejected { status: u16, payload: serde_json::Value },

    #[error("Payment gateway unreachable: {0}")]
    Transport(String),

    #[error("Unexpected payment gateway response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted checkout for the transaction
    async fn initialize(
        &self,
        request: &InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayError>;

    /// Ask the provider how the transaction ended
    async fn verify(&self, tx_ref: &str) -> Result<VerifiedTransaction, GatewayError>;
}
