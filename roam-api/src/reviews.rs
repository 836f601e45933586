use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use roam_booking::NewReview;
use roam_shared::Review;

use crate::{error::AppError, middleware::AuthUser, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reviews", post(create_review))
        .route("/v1/reviews/mine", get(my_reviews))
}

async fn create_review(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = state.reviews.create_review(user_id, req).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn my_reviews(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(state.reviews.reviews_by_user(user_id).await?))
}
