use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roam_core::{CoreError, GatewayError};
use serde_json::{json, Value};

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    /// The payment provider refused the request; its payload is passed through
    GatewayRejected(Value),
    BadGateway(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, Value::String(msg)),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, Value::String(msg)),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, Value::String(msg)),
            AppError::GatewayRejected(payload) => (StatusCode::BAD_REQUEST, payload),
            AppError::BadGateway(msg) => {
                tracing::warn!("Payment provider unavailable: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    Value::String("Payment provider unavailable".to_string()),
                )
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Value::String("Internal Server Error".to_string()),
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Value::String("Internal Server Error".to_string()),
                )
            }
        };

        (status, Json(json!({ "error": error }))).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => AppError::ValidationError(msg),
            CoreError::DuplicatePayment(_) => {
                AppError::ValidationError("Payment already initiated for this booking.".to_string())
            }
            CoreError::NotFound(msg) => AppError::NotFoundError(msg),
            CoreError::Gateway(GatewayError::Rejected { payload, .. }) => AppError::GatewayRejected(payload),
            CoreError::Gateway(e) => AppError::BadGateway(e.to_string()),
            e @ CoreError::InvalidTransition { .. } => AppError::ConflictError(e.to_string()),
            CoreError::StorageError(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
