pub mod user;
pub mod listing;
pub mod booking;
pub mod review;
pub mod events;

pub use user::User;
pub use listing::Listing;
pub use booking::{Booking, BookingError, BookingStatus};
pub use review::Review;
