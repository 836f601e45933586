use async_trait::async_trait;
use roam_shared::{Booking, BookingStatus, Listing, Review, User};
use uuid::Uuid;

use crate::payment::{Payment, PaymentOutcome};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository trait for user lookups
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, id: Uuid) -> RepositoryResult<Option<User>>;
}

/// Repository trait for listing lookups
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn get_listing(&self, id: Uuid) -> RepositoryResult<Option<Listing>>;
}

/// Repository trait for booking data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, booking: &Booking) -> RepositoryResult<()>;

    async fn get_booking(&self, id: Uuid) -> RepositoryResult<Option<Booking>>;

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> RepositoryResult<()>;

    /// Removes the booking together with its payment and reviews.
    /// Returns false when no such booking existed.
    async fn delete_booking(&self, id: Uuid) -> RepositoryResult<bool>;
}

/// Repository trait for payment data access
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Fails with `Duplicate` when the booking already has a payment or the
    /// transaction reference is taken.
    async fn create_payment(&self, payment: &Payment) -> RepositoryResult<()>;

    async fn find_by_booking(&self, booking_id: Uuid) -> RepositoryResult<Option<Payment>>;

    async fn find_by_reference(&self, tx_ref: &str) -> RepositoryResult<Option<Payment>>;

    /// Moves a PENDING payment to the outcome's terminal status and, in the
    /// same transaction, sets the booking to `booking_status` when given.
    ///
    /// Returns `None` without touching anything if the payment is no longer
    /// PENDING, so exactly one concurrent caller observes `Some`.
    async fn settle_payment(
        &self,
        tx_ref: &str,
        outcome: &PaymentOutcome,
        booking_status: Option<BookingStatus>,
    ) -> RepositoryResult<Option<Payment>>;

    /// COMPLETED payments whose booking is still `pending`.
    /// Cancelled bookings are left alone.
    async fn list_completed_pending(&self) -> RepositoryResult<Vec<Payment>>;
}

/// Repository trait for review data access
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create_review(&self, review: &Review) -> RepositoryResult<()>;

    async fn find_review(&self, user_id: Uuid, listing_id: Uuid) -> RepositoryResult<Option<Review>>;

    async fn list_reviews_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Review>>;
}
