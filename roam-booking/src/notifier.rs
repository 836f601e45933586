use std::sync::Arc;

use roam_core::notification::{Mailer, OutboundEmail};
use roam_shared::{Booking, Listing, NotificationKind, PaymentNotification, User};
use tracing::{error, info};

use crate::Stores;

const SIGN_OFF: &str = "Best regards,\nRoam Travel Team";

/// Consumer side of the notification queue: formats and sends payment emails.
///
/// `handle` never fails. Every outcome, including lookups that come back empty
/// and SMTP errors, is reported as a human readable result string.
pub struct NotificationWorker {
    stores: Stores,
    mailer: Arc<dyn Mailer>,
}

impl NotificationWorker {
    pub fn new(stores: Stores, mailer: Arc<dyn Mailer>) -> Self {
        Self { stores, mailer }
    }

    pub async fn handle(&self, notification: &PaymentNotification) -> String {
        let booking_id = notification.booking_id;

        let booking = match self.stores.bookings.get_booking(booking_id).await {
            Ok(Some(booking)) => booking,
            Ok(None) => return format!("Booking with ID {} does not exist.", booking_id),
            Err(e) => return format!("Failed to load booking {}: {}", booking_id, e),
        };

        let user = match self.stores.users.get_user(booking.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return format!("User for booking {} does not exist.", booking_id),
            Err(e) => return format!("Failed to load user for booking {}: {}", booking_id, e),
        };

        let listing = match self.stores.listings.get_listing(booking.listing_id).await {
            Ok(Some(listing)) => listing,
            Ok(None) => return format!("Listing for booking {} does not exist.", booking_id),
            Err(e) => return format!("Failed to load listing for booking {}: {}", booking_id, e),
        };

        let email = compose(notification.kind, &booking, &user, &listing);
        let label = label(notification.kind);

        match self.mailer.send(&email).await {
            Ok(()) => {
                info!("Sent {} email for booking {}", notification.kind, booking_id);
                format!("Payment {} email sent to {}", label, email.to)
            }
            Err(e) => {
                error!("Failed to send {} email for booking {}: {}", notification.kind, booking_id, e);
                format!("Failed to send payment {} email to {}: {}", label, email.to, e)
            }
        }
    }
}

fn label(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Confirmation => "confirmation",
        NotificationKind::Failure => "failure",
    }
}

fn compose(kind: NotificationKind, booking: &Booking, user: &User, listing: &Listing) -> OutboundEmail {
    let (subject, body) = match kind {
        NotificationKind::Confirmation => (
            "Booking Payment Confirmation",
            format!(
                "Hello {},\n\nYour payment for booking {} at {} has been confirmed.\n\n\
                 Thank you for booking with us!\n\n{}",
                user.username, booking.id, listing.title, SIGN_OFF
            ),
        ),
        NotificationKind::Failure => (
            "Booking Payment Failed",
            format!(
                "Hello {},\n\nUnfortunately, your payment for booking {} at {} has failed or was cancelled.\n\n\
                 Please try again or contact support.\n\n{}",
                user.username, booking.id, listing.title, SIGN_OFF
            ),
        ),
    };

    OutboundEmail {
        to: user.email.expose().clone(),
        subject: subject.to_string(),
        body,
    }
}
