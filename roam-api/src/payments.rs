use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use roam_core::PaymentStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, middleware::AuthUser, state::AppState};

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub booking_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InitiatePaymentResponse {
    pub payment_id: Uuid,
    pub tx_ref: String,
    pub checkout_url: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(default)]
    pub tx_ref: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub detail: String,
    pub status: PaymentStatus,
    pub tx_ref: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payments/initiate", post(initiate_payment))
        .route("/v1/payments/verify", get(verify_payment))
}

/// POST /v1/payments/initiate
async fn initiate_payment(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<(StatusCode, Json<InitiatePaymentResponse>), AppError> {
    let initiated = match state.orchestrator.initiate(req.booking_id, user_id).await {
        Ok(initiated) => initiated,
        Err(e) => {
            state.metrics.record_initiation("rejected");
            return Err(e.into());
        }
    };
    state.metrics.record_initiation("created");

    Ok((
        StatusCode::CREATED,
        Json(InitiatePaymentResponse {
            payment_id: initiated.payment.id,
            tx_ref: initiated.payment.transaction_reference,
            checkout_url: initiated.checkout_url,
        }),
    ))
}

/// GET /v1/payments/verify?tx_ref=...
///
/// A failed payment is reported as 400 so the checkout page can branch on status alone.
async fn verify_payment(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(params): Query<VerifyParams>,
) -> Result<(StatusCode, Json<VerifyPaymentResponse>), AppError> {
    let payment = match state.orchestrator.verify(&params.tx_ref, user_id).await {
        Ok(payment) => payment,
        Err(e) => {
            state.metrics.record_verification("error");
            return Err(e.into());
        }
    };
    state.metrics.record_verification(payment.status.as_str());

    let (code, detail) = match payment.status {
        PaymentStatus::Completed => (StatusCode::OK, "Payment successful"),
        PaymentStatus::Failed => (StatusCode::BAD_REQUEST, "Payment failed"),
        PaymentStatus::Pending => (StatusCode::ACCEPTED, "Payment pending"),
    };

    Ok((
        code,
        Json(VerifyPaymentResponse {
            detail: detail.to_string(),
            status: payment.status,
            tx_ref: payment.transaction_reference,
        }),
    ))
}
