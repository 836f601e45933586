mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{seed_booking, Harness, RecordingMailer};
use roam_booking::NotificationWorker;
use roam_shared::{NotificationKind, PaymentNotification};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn test_confirmation_email_reaches_guest() {
    let mut harness = Harness::new();
    let (guest, listing, booking) = seed_booking(&harness.store, dec!(250), 2).await;
    let initiated = harness.orchestrator.initiate(booking.id, guest.id).await.unwrap();
    harness.orchestrator.verify(&initiated.payment.transaction_reference, guest.id).await.unwrap();

    let mailer = Arc::new(RecordingMailer::default());
    let worker = NotificationWorker::new(harness.stores.clone(), mailer.clone());

    let notification = harness.drain_notifications().pop().unwrap();
    let result = worker.handle(&notification).await;

    assert_eq!(result, "Payment confirmation email sent to selam@example.com");
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "selam@example.com");
    assert_eq!(sent[0].subject, "Booking Payment Confirmation");
    assert!(sent[0].body.contains(&listing.title));
    assert!(sent[0].body.ends_with("Best regards,\nRoam Travel Team"));
}

#[tokio::test]
async fn test_failure_email_uses_failure_template() {
    let harness = Harness::new();
    let (_, _, booking) = seed_booking(&harness.store, dec!(250), 2).await;
    let mailer = Arc::new(RecordingMailer::default());
    let worker = NotificationWorker::new(harness.stores.clone(), mailer.clone());

    let result = worker
        .handle(&PaymentNotification::new(NotificationKind::Failure, booking.id))
        .await;

    assert_eq!(result, "Payment failure email sent to selam@example.com");
    assert_eq!(mailer.sent()[0].subject, "Booking Payment Failed");
}

#[tokio::test]
async fn test_missing_booking_is_reported_not_raised() {
    let harness = Harness::new();
    let mailer = Arc::new(RecordingMailer::default());
    let worker = NotificationWorker::new(harness.stores.clone(), mailer.clone());
    let missing = Uuid::new_v4();

    let result = worker
        .handle(&PaymentNotification::new(NotificationKind::Confirmation, missing))
        .await;

    assert_eq!(result, format!("Booking with ID {} does not exist.", missing));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_smtp_failure_is_reported_in_result() {
    let harness = Harness::new();
    let (_, _, booking) = seed_booking(&harness.store, dec!(250), 2).await;
    let mailer = Arc::new(RecordingMailer::default());
    mailer.fail.store(true, Ordering::SeqCst);
    let worker = NotificationWorker::new(harness.stores.clone(), mailer);

    let result = worker
        .handle(&PaymentNotification::new(NotificationKind::Confirmation, booking.id))
        .await;

    assert!(result.starts_with("Failed to send payment confirmation email to selam@example.com"));
    assert!(result.contains("connection refused"));
}
