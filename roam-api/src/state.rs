use std::sync::Arc;

use roam_booking::{PaymentOrchestrator, ReviewService};
use roam_store::RedisClient;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

/// Per-client request budget backed by Redis
#[derive(Clone)]
pub struct RateLimit {
    pub redis: Arc<RedisClient>,
    pub requests_per_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PaymentOrchestrator>,
    pub reviews: Arc<ReviewService>,
    /// `None` disables rate limiting
    pub rate_limit: Option<RateLimit>,
    pub auth: AuthConfig,
    pub metrics: Arc<Metrics>,
}
