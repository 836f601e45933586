pub mod models;
pub mod pii;

pub use models::{Booking, BookingError, BookingStatus, Listing, Review, User};
pub use models::events::{NotificationKind, PaymentNotification};
