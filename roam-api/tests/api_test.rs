use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use roam_api::{
    app,
    metrics::Metrics,
    middleware::CustomerClaims,
    state::{AppState, AuthConfig},
};
use roam_booking::{BookingCoordinator, CheckoutSettings, PaymentOrchestrator, ReviewService, Stores};
use roam_core::payment::{
    GatewayError, InitializeTransaction, InitializedTransaction, PaymentGateway, VerifiedTransaction,
};
use roam_core::repository::BookingRepository;
use roam_shared::pii::Masked;
use roam_shared::{Booking, BookingStatus, Listing, PaymentNotification, User};
use roam_store::{ChannelQueue, MemoryStore};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

/// Gateway double; `None` for the init verdict means accept
#[derive(Default)]
struct FakeChapa {
    reject_with: Mutex<Option<Value>>,
    verify_status: Mutex<Option<String>>,
}

#[async_trait]
impl PaymentGateway for FakeChapa {
    async fn initialize(
        &self,
        request: &InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayError> {
        if let Some(payload) = self.reject_with.lock().unwrap().clone() {
            return Err(GatewayError::Rejected { status: 400, payload });
        }
        Ok(InitializedTransaction {
            checkout_url: format!("https://checkout.chapa.test/{}", request.tx_ref),
        })
    }

    async fn verify(&self, _tx_ref: &str) -> Result<VerifiedTransaction, GatewayError> {
        let status = self
            .verify_status
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "success".to_string());
        Ok(VerifiedTransaction { status, transaction_id: Some("chapa-1".to_string()) })
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    gateway: Arc<FakeChapa>,
    notifications: UnboundedReceiver<PaymentNotification>,
    guest: User,
    listing: Listing,
    booking: Booking,
}

impl TestApp {
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let stores = Stores::from_backend(store.clone());
        let gateway = Arc::new(FakeChapa::default());
        let (queue, notifications) = ChannelQueue::new();

        let coordinator = BookingCoordinator::new(stores.clone(), Arc::new(queue));
        let orchestrator = PaymentOrchestrator::new(
            gateway.clone(),
            stores.clone(),
            coordinator,
            CheckoutSettings {
                currency: "ETB".to_string(),
                callback_url: "https://roam.test/callback".to_string(),
            },
        );

        let state = AppState {
            orchestrator: Arc::new(orchestrator),
            reviews: Arc::new(ReviewService::new(stores)),
            rate_limit: None,
            auth: AuthConfig { secret: SECRET.to_string() },
            metrics: Arc::new(Metrics::new().unwrap()),
        };
        let router = app(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));

        let guest = User {
            id: Uuid::new_v4(),
            username: "abebe".to_string(),
            email: Masked("abebe@example.com".to_string()),
            first_name: "Abebe".to_string(),
            last_name: "Kebede".to_string(),
            phone_number: None,
        };
        let listing = Listing {
            id: Uuid::new_v4(),
            host_id: Uuid::new_v4(),
            title: "Bahir Dar Villa".to_string(),
            price_per_night: dec!(250),
            description: String::new(),
            location: "Bahir Dar".to_string(),
            created_at: Utc::now(),
        };
        let booking = Booking::new(
            listing.id,
            guest.id,
            NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 12).unwrap(),
        )
        .unwrap();

        store.insert_user(guest.clone()).await;
        store.insert_listing(listing.clone()).await;
        store.create_booking(&booking).await.unwrap();

        Self { router, store, gateway, notifications, guest, listing, booking }
    }

    fn token_for(&self, user_id: Uuid) -> String {
        let claims = CustomerClaims {
            sub: user_id.to_string(),
            exp: (Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn initiate(&self, user_id: Uuid) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/payments/initiate")
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token_for(user_id)))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "booking_id": self.booking.id }).to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn verify(&self, tx_ref: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(format!("/v1/payments/verify?tx_ref={}", tx_ref))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token_for(self.guest.id)))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_payments_require_a_token() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/payments/initiate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "booking_id": app.booking.id }).to_string()))
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.payment_count().await, 0);
}

#[tokio::test]
async fn test_token_subject_must_be_a_user_id() {
    let app = TestApp::new().await;
    let claims = CustomerClaims {
        sub: "guest-abebe".to_string(),
        exp: (Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();

    let request = Request::builder()
        .uri("/v1/reviews/mine")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_initiate_then_verify_confirms_booking() {
    let mut app = TestApp::new().await;

    let (status, body) = app.initiate(app.guest.id).await;
    assert_eq!(status, StatusCode::CREATED);
    let tx_ref = body["tx_ref"].as_str().unwrap().to_string();
    assert_eq!(body["checkout_url"], format!("https://checkout.chapa.test/{}", tx_ref));
    assert!(body["payment_id"].is_string());

    let (status, body) = app.verify(&tx_ref).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Payment successful");
    assert_eq!(body["status"], "COMPLETED");

    let booking = app.store.get_booking(app.booking.id).await.unwrap().unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert!(app.notifications.try_recv().is_ok());
    assert!(app.notifications.try_recv().is_err());
}

#[tokio::test]
async fn test_failed_payment_is_a_bad_request() {
    let app = TestApp::new().await;
    *app.gateway.verify_status.lock().unwrap() = Some("failed".to_string());

    let (_, body) = app.initiate(app.guest.id).await;
    let (status, body) = app.verify(body["tx_ref"].as_str().unwrap()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Payment failed");
    assert_eq!(body["status"], "FAILED");
}

#[tokio::test]
async fn test_second_initiation_is_rejected() {
    let app = TestApp::new().await;
    app.initiate(app.guest.id).await;

    let (status, body) = app.initiate(app.guest.id).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Payment already initiated for this booking.");
}

#[tokio::test]
async fn test_foreign_booking_is_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app.initiate(Uuid::new_v4()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_verify_unknown_reference_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app.verify("tx-unknown").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Payment not found.");
}

#[tokio::test]
async fn test_gateway_rejection_payload_is_passed_through() {
    let app = TestApp::new().await;
    *app.gateway.reject_with.lock().unwrap() =
        Some(json!({ "message": "Invalid API Key or User doesn't exist", "status": "failed" }));

    let (status, body) = app.initiate(app.guest.id).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid API Key or User doesn't exist");
    assert_eq!(app.store.payment_count().await, 0);
}

#[tokio::test]
async fn test_review_roundtrip() {
    let app = TestApp::new().await;
    let token = app.token_for(app.guest.id);

    let create = Request::builder()
        .method("POST")
        .uri("/v1/reviews")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "booking_id": app.booking.id,
                "listing_id": app.listing.id,
                "rating": 4,
                "comment": "Lovely view of the lake"
            })
            .to_string(),
        ))
        .unwrap();
    let (status, body) = app.send(create).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rating"], 4);

    let mine = Request::builder()
        .uri("/v1/reviews/mine")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(mine).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_metrics_count_initiations() {
    let app = TestApp::new().await;
    app.initiate(app.guest.id).await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains("roam_payment_initiations_total{outcome=\"created\"} 1"));
}
