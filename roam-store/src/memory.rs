use async_trait::async_trait;
use roam_core::notification::{NotificationQueue, QueueError};
use roam_core::payment::{Payment, PaymentOutcome, PaymentStatus};
use roam_core::repository::{
    BookingRepository, ListingRepository, PaymentRepository, RepositoryError, RepositoryResult,
    ReviewRepository, UserRepository,
};
use roam_shared::{Booking, BookingStatus, Listing, PaymentNotification, Review, User};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    listings: HashMap<Uuid, Listing>,
    bookings: HashMap<Uuid, Booking>,
    /// Keyed by transaction reference
    payments: HashMap<String, Payment>,
    reviews: HashMap<Uuid, Review>,
}

/// A thread-safe in-memory implementation of every repository.
///
/// All tables sit behind one `RwLock`, so multi-table writes such as payment
/// settlement are atomic. Used by tests and local development.
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id, user);
    }

    pub async fn insert_listing(&self, listing: Listing) {
        self.tables.write().await.listings.insert(listing.id, listing);
    }

    pub async fn payment_count(&self) -> usize {
        self.tables.read().await.payments.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_user(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl ListingRepository for MemoryStore {
    async fn get_listing(&self, id: Uuid) -> RepositoryResult<Option<Listing>> {
        Ok(self.tables.read().await.listings.get(&id).cloned())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_booking(&self, booking: &Booking) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        if tables.bookings.contains_key(&booking.id) {
            return Err(RepositoryError::Duplicate(format!("booking {}", booking.id)));
        }
        tables.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> RepositoryResult<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        let booking = tables
            .bookings
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("booking {}", id)))?;
        booking.status = status;
        Ok(())
    }

    async fn delete_booking(&self, id: Uuid) -> RepositoryResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.bookings.remove(&id).is_none() {
            return Ok(false);
        }
        tables.payments.retain(|_, p| p.booking_id != id);
        tables.reviews.retain(|_, r| r.booking_id != id);
        Ok(true)
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn create_payment(&self, payment: &Payment) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        let booking_taken = tables.payments.values().any(|p| p.booking_id == payment.booking_id);
        if booking_taken || tables.payments.contains_key(&payment.transaction_reference) {
            return Err(RepositoryError::Duplicate("payment".to_string()));
        }
        tables
            .payments
            .insert(payment.transaction_reference.clone(), payment.clone());
        Ok(())
    }

    async fn find_by_booking(&self, booking_id: Uuid) -> RepositoryResult<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables.payments.values().find(|p| p.booking_id == booking_id).cloned())
    }

    async fn find_by_reference(&self, tx_ref: &str) -> RepositoryResult<Option<Payment>> {
        Ok(self.tables.read().await.payments.get(tx_ref).cloned())
    }

    async fn settle_payment(
        &self,
        tx_ref: &str,
        outcome: &PaymentOutcome,
        booking_status: Option<BookingStatus>,
    ) -> RepositoryResult<Option<Payment>> {
        let mut tables = self.tables.write().await;
        let tables = &mut *tables;

        let payment = tables
            .payments
            .get_mut(tx_ref)
            .ok_or_else(|| RepositoryError::NotFound(format!("payment {}", tx_ref)))?;
        if payment.status.is_terminal() {
            return Ok(None);
        }

        if booking_status.is_some() && !tables.bookings.contains_key(&payment.booking_id) {
            return Err(RepositoryError::NotFound(format!("booking {}", payment.booking_id)));
        }

        payment
            .settle(outcome)
            .map_err(|e| RepositoryError::Backend(e.to_string()))?;

        if let Some(status) = booking_status {
            if let Some(booking) = tables.bookings.get_mut(&payment.booking_id) {
                booking.status = status;
            }
        }

        Ok(Some(payment.clone()))
    }

    async fn list_completed_pending(&self) -> RepositoryResult<Vec<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .filter(|p| p.status == PaymentStatus::Completed)
            .filter(|p| {
                tables
                    .bookings
                    .get(&p.booking_id)
                    .is_some_and(|b| b.status == BookingStatus::Pending)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn create_review(&self, review: &Review) -> RepositoryResult<()> {
        let mut tables = self.tables.write().await;
        let exists = tables
            .reviews
            .values()
            .any(|r| r.user_id == review.user_id && r.listing_id == review.listing_id);
        if exists {
            return Err(RepositoryError::Duplicate("review".to_string()));
        }
        tables.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn find_review(&self, user_id: Uuid, listing_id: Uuid) -> RepositoryResult<Option<Review>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .find(|r| r.user_id == user_id && r.listing_id == listing_id)
            .cloned())
    }

    async fn list_reviews_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Review>> {
        let tables = self.tables.read().await;
        let mut reviews: Vec<Review> = tables
            .reviews
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }
}

/// In-process notification queue over an unbounded tokio channel.
#[derive(Clone)]
pub struct ChannelQueue {
    tx: mpsc::UnboundedSender<PaymentNotification>,
}

impl ChannelQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PaymentNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl NotificationQueue for ChannelQueue {
    async fn enqueue(&self, notification: PaymentNotification) -> Result<(), QueueError> {
        self.tx
            .send(notification)
            .map_err(|_| QueueError::Unavailable("notification receiver dropped".to_string()))
    }
}
