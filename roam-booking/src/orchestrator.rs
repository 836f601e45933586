use std::sync::Arc;

use roam_core::payment::{
    generate_transaction_reference, InitializeTransaction, Payment, PaymentGateway, PaymentOutcome,
};
use roam_core::repository::RepositoryError;
use roam_core::{CoreError, CoreResult};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::coordinator::BookingCoordinator;
use crate::Stores;

/// Checkout parameters sent with every initialization
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSettings {
    pub currency: String,
    pub callback_url: String,
}

#[derive(Debug, Clone)]
pub struct InitiatedPayment {
    pub payment: Payment,
    pub checkout_url: String,
}

/// Drives a booking's payment from initiation to settlement.
pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    stores: Stores,
    coordinator: BookingCoordinator,
    settings: CheckoutSettings,
}

impl PaymentOrchestrator {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        stores: Stores,
        coordinator: BookingCoordinator,
        settings: CheckoutSettings,
    ) -> Self {
        Self { gateway, stores, coordinator, settings }
    }

    pub fn coordinator(&self) -> &BookingCoordinator {
        &self.coordinator
    }

    /// Open a checkout for the requester's booking and record a PENDING payment.
    ///
    /// Nothing is persisted unless the provider accepted the transaction.
    pub async fn initiate(&self, booking_id: Uuid, requester: Uuid) -> CoreResult<InitiatedPayment> {
        let booking = self
            .stores
            .bookings
            .get_booking(booking_id)
            .await?
            .filter(|b| b.is_owned_by(requester))
            .ok_or_else(|| CoreError::NotFound("Booking not found.".to_string()))?;

        if self.stores.payments.find_by_booking(booking.id).await?.is_some() {
            return Err(CoreError::DuplicatePayment(booking.id));
        }

        let listing = self
            .stores
            .listings
            .get_listing(booking.listing_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Listing not found.".to_string()))?;

        let user = self
            .stores
            .users
            .get_user(requester)
            .await?
            .ok_or_else(|| CoreError::NotFound("User not found.".to_string()))?;

        let amount = booking.total_price(listing.price_per_night);
        if amount <= Decimal::ZERO {
            return Err(CoreError::ValidationError(format!(
                "Booking {} has no payable amount",
                booking.id
            )));
        }

        let tx_ref = generate_transaction_reference();
        let request = InitializeTransaction {
            amount,
            currency: self.settings.currency.clone(),
            email: user.email.expose().clone(),
            first_name: user.payer_first_name().to_string(),
            last_name: user.payer_last_name().to_string(),
            tx_ref: tx_ref.clone(),
            callback_url: self.settings.callback_url.clone(),
        };

        let initialized = self.gateway.initialize(&request).await.map_err(|e| {
            warn!("Gateway initialization failed for booking {}: {}", booking.id, e);
            e
        })?;

        let payment = Payment::pending(booking.id, amount, &self.settings.currency, tx_ref);
        match self.stores.payments.create_payment(&payment).await {
            Err(RepositoryError::Duplicate(_)) => return Err(CoreError::DuplicatePayment(booking.id)),
            other => other?,
        }

        info!(
            "Payment {} initiated for booking {} ({} {})",
            payment.transaction_reference, booking.id, payment.amount, payment.currency
        );

        Ok(InitiatedPayment {
            payment,
            checkout_url: initialized.checkout_url,
        })
    }

    /// Settle the requester's payment from the provider's verdict.
    ///
    /// A payment that already left PENDING is returned as-is without asking
    /// the provider again.
    pub async fn verify(&self, tx_ref: &str, requester: Uuid) -> CoreResult<Payment> {
        let tx_ref = tx_ref.trim();
        if tx_ref.is_empty() {
            return Err(CoreError::ValidationError("tx_ref is required".to_string()));
        }

        let payment = self
            .stores
            .payments
            .find_by_reference(tx_ref)
            .await?
            .ok_or_else(|| CoreError::NotFound("Payment not found.".to_string()))?;

        let owned = self
            .stores
            .bookings
            .get_booking(payment.booking_id)
            .await?
            .is_some_and(|b| b.is_owned_by(requester));
        if !owned {
            return Err(CoreError::NotFound("Payment not found.".to_string()));
        }

        if payment.status.is_terminal() {
            debug!("Payment {} already {}, skipping gateway", tx_ref, payment.status);
            return Ok(payment);
        }

        let verified = self.gateway.verify(tx_ref).await.map_err(|e| {
            warn!("Gateway verification failed for {}: {}", tx_ref, e);
            e
        })?;

        self.coordinator.apply(&payment, PaymentOutcome::from(verified)).await
    }
}
