pub mod orchestrator;
pub mod coordinator;
pub mod notifier;
pub mod reviews;

use std::sync::Arc;

use roam_core::repository::{
    BookingRepository, ListingRepository, PaymentRepository, ReviewRepository, UserRepository,
};

pub use orchestrator::{CheckoutSettings, InitiatedPayment, PaymentOrchestrator};
pub use coordinator::BookingCoordinator;
pub use notifier::NotificationWorker;
pub use reviews::{NewReview, ReviewService};

/// Data access handles shared by the services
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub listings: Arc<dyn ListingRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
}

impl Stores {
    /// All handles backed by one store implementing every repository
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: UserRepository
            + ListingRepository
            + BookingRepository
            + PaymentRepository
            + ReviewRepository
            + 'static,
    {
        Self {
            users: backend.clone(),
            listings: backend.clone(),
            bookings: backend.clone(),
            payments: backend.clone(),
            reviews: backend,
        }
    }
}
