use std::sync::Arc;

use roam_core::notification::NotificationQueue;
use roam_core::payment::{Payment, PaymentOutcome};
use roam_core::{CoreError, CoreResult};
use roam_shared::{BookingStatus, NotificationKind, PaymentNotification};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::Stores;

/// Turns settled payments into booking status changes and notifications.
#[derive(Clone)]
pub struct BookingCoordinator {
    stores: Stores,
    queue: Arc<dyn NotificationQueue>,
}

impl BookingCoordinator {
    pub fn new(stores: Stores, queue: Arc<dyn NotificationQueue>) -> Self {
        Self { stores, queue }
    }

    /// Persist the outcome of a pending payment.
    ///
    /// Completed payments confirm their booking in the same store transaction;
    /// failed ones leave the booking alone. Only the caller that actually moves
    /// the payment out of PENDING enqueues a notification.
    pub async fn apply(&self, payment: &Payment, outcome: PaymentOutcome) -> CoreResult<Payment> {
        let tx_ref = payment.transaction_reference.as_str();
        let (booking_status, kind) = match outcome {
            PaymentOutcome::Completed { .. } => (Some(BookingStatus::Confirmed), NotificationKind::Confirmation),
            PaymentOutcome::Failed => (None, NotificationKind::Failure),
        };

        let settled = self
            .stores
            .payments
            .settle_payment(tx_ref, &outcome, booking_status)
            .await?;

        match settled {
            Some(settled) => {
                info!(
                    "Payment {} settled as {} for booking {}",
                    tx_ref, settled.status, settled.booking_id
                );
                self.dispatch(kind, settled.booking_id).await;
                Ok(settled)
            }
            None => {
                warn!("Payment {} was settled by a concurrent request, skipping notification", tx_ref);
                self.stores
                    .payments
                    .find_by_reference(tx_ref)
                    .await?
                    .ok_or_else(|| CoreError::NotFound(format!("Payment {}", tx_ref)))
            }
        }
    }

    /// Confirm pending bookings whose payment completed but whose status
    /// never followed. Returns how many bookings were repaired.
    pub async fn reconcile(&self) -> CoreResult<usize> {
        let mismatched = self.stores.payments.list_completed_pending().await?;
        let mut repaired = 0;

        for payment in mismatched {
            match self
                .stores
                .bookings
                .update_booking_status(payment.booking_id, BookingStatus::Confirmed)
                .await
            {
                Ok(()) => {
                    info!(
                        "Reconciled booking {} with completed payment {}",
                        payment.booking_id, payment.transaction_reference
                    );
                    self.dispatch(NotificationKind::Confirmation, payment.booking_id).await;
                    repaired += 1;
                }
                Err(e) => error!("Failed to reconcile booking {}: {}", payment.booking_id, e),
            }
        }

        Ok(repaired)
    }

    async fn dispatch(&self, kind: NotificationKind, booking_id: Uuid) {
        if let Err(e) = self.queue.enqueue(PaymentNotification::new(kind, booking_id)).await {
            error!("Failed to enqueue {} notification for booking {}: {}", kind, booking_id, e);
        }
    }
}
