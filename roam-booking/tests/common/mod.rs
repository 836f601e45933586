#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use roam_booking::{BookingCoordinator, CheckoutSettings, PaymentOrchestrator, Stores};
use roam_core::notification::{MailError, Mailer, OutboundEmail};
use roam_core::payment::{
    GatewayError, InitializeTransaction, InitializedTransaction, PaymentGateway, VerifiedTransaction,
};
use roam_core::repository::BookingRepository;
use roam_shared::pii::Masked;
use roam_shared::{Booking, Listing, PaymentNotification, User};
use roam_store::{ChannelQueue, MemoryStore};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

/// Payment provider double with a configurable verdict
pub struct ScriptedGateway {
    verify_status: Mutex<String>,
    reject_initialize: AtomicBool,
    verify_delay: Mutex<Option<Duration>>,
    pub initialize_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
    pub last_request: Mutex<Option<InitializeTransaction>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            verify_status: Mutex::new("success".to_string()),
            reject_initialize: AtomicBool::new(false),
            verify_delay: Mutex::new(None),
            initialize_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn set_verify_status(&self, status: &str) {
        *self.verify_status.lock().unwrap() = status.to_string();
    }

    pub fn reject_initialize(&self) {
        self.reject_initialize.store(true, Ordering::SeqCst);
    }

    pub fn delay_verify(&self, delay: Duration) {
        *self.verify_delay.lock().unwrap() = Some(delay);
    }

    pub fn initialize_count(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    pub fn verify_count(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn initialize(
        &self,
        request: &InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayError> {
        self.initialize_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if self.reject_initialize.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                status: 400,
                payload: json!({ "message": "Invalid currency", "status": "failed" }),
            });
        }

        Ok(InitializedTransaction {
            checkout_url: format!("https://checkout.chapa.test/{}", request.tx_ref),
        })
    }

    async fn verify(&self, tx_ref: &str) -> Result<VerifiedTransaction, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.verify_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let status = self.verify_status.lock().unwrap().clone();
        Ok(VerifiedTransaction {
            transaction_id: (status == "success").then(|| format!("chapa-{}", tx_ref)),
            status,
        })
    }
}

/// Mailer double that keeps every message it was asked to send
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Delivery("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub stores: Stores,
    pub gateway: Arc<ScriptedGateway>,
    pub orchestrator: PaymentOrchestrator,
    pub notifications: UnboundedReceiver<PaymentNotification>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let stores = Stores::from_backend(store.clone());
        let gateway = Arc::new(ScriptedGateway::new());
        let (queue, notifications) = ChannelQueue::new();
        let coordinator = BookingCoordinator::new(stores.clone(), Arc::new(queue));
        let orchestrator = PaymentOrchestrator::new(
            gateway.clone(),
            stores.clone(),
            coordinator,
            CheckoutSettings {
                currency: "ETB".to_string(),
                callback_url: "https://roam.test/payments/callback".to_string(),
            },
        );

        Self { store, stores, gateway, orchestrator, notifications }
    }

    /// Everything enqueued so far
    pub fn drain_notifications(&mut self) -> Vec<PaymentNotification> {
        let mut drained = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            drained.push(notification);
        }
        drained
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn user(username: &str, first_name: &str) -> User {
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: Masked(format!("{}@example.com", username)),
        first_name: first_name.to_string(),
        last_name: String::new(),
        phone_number: None,
    }
}

pub fn listing(title: &str, price_per_night: Decimal) -> Listing {
    Listing {
        id: Uuid::new_v4(),
        host_id: Uuid::new_v4(),
        title: title.to_string(),
        price_per_night,
        description: String::new(),
        location: "Addis Ababa".to_string(),
        created_at: Utc::now(),
    }
}

/// A guest with a pending booking of `nights` nights at `price_per_night`
pub async fn seed_booking(
    store: &MemoryStore,
    price_per_night: Decimal,
    nights: u32,
) -> (User, Listing, Booking) {
    let guest = user("selam", "Selam");
    let listing = listing("Entoto Retreat", price_per_night);
    store.insert_user(guest.clone()).await;
    store.insert_listing(listing.clone()).await;

    let booking = Booking::new(listing.id, guest.id, date(2025, 3, 1), date(2025, 3, 1 + nights)).unwrap();
    store.create_booking(&booking).await.unwrap();

    (guest, listing, booking)
}
