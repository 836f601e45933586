pub mod payment;
pub mod repository;
pub mod notification;

use uuid::Uuid;

pub use payment::{GatewayError, Payment, PaymentGateway, PaymentOutcome, PaymentStatus};
pub use repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Payment already initiated for booking {0}")]
    DuplicatePayment(Uuid),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Invalid payment transition from {from} to {to}")]
    InvalidTransition { from: PaymentStatus, to: PaymentStatus },
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<RepositoryError> for CoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => CoreError::NotFound(what),
            RepositoryError::Duplicate(what) => CoreError::StorageError(format!("duplicate {}", what)),
            RepositoryError::Backend(msg) => CoreError::StorageError(msg),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
