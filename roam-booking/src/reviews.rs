use chrono::Utc;
use roam_core::repository::RepositoryError;
use roam_core::{CoreError, CoreResult};
use roam_shared::models::review::{is_valid_rating, MAX_RATING, MIN_RATING};
use roam_shared::Review;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::Stores;

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub booking_id: Uuid,
    pub listing_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

/// Review creation with the one-review-per-listing rule
pub struct ReviewService {
    stores: Stores,
}

impl ReviewService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn create_review(&self, requester: Uuid, review: NewReview) -> CoreResult<Review> {
        if !is_valid_rating(review.rating) {
            return Err(CoreError::ValidationError(format!(
                "Rating must be between {} and {}.",
                MIN_RATING, MAX_RATING
            )));
        }

        let listing = self
            .stores
            .listings
            .get_listing(review.listing_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Listing not found.".to_string()))?;

        let booking = self
            .stores
            .bookings
            .get_booking(review.booking_id)
            .await?
            .filter(|b| b.is_owned_by(requester) && b.listing_id == listing.id)
            .ok_or_else(|| CoreError::NotFound("Booking not found.".to_string()))?;

        if self.stores.reviews.find_review(requester, listing.id).await?.is_some() {
            return Err(already_reviewed());
        }

        let review = Review {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            listing_id: listing.id,
            user_id: requester,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };

        match self.stores.reviews.create_review(&review).await {
            Err(RepositoryError::Duplicate(_)) => return Err(already_reviewed()),
            other => other?,
        }

        info!("Review {} created for listing {}", review.id, listing.id);
        Ok(review)
    }

    pub async fn reviews_by_user(&self, requester: Uuid) -> CoreResult<Vec<Review>> {
        Ok(self.stores.reviews.list_reviews_by_user(requester).await?)
    }
}

fn already_reviewed() -> CoreError {
    CoreError::ValidationError("You have already reviewed this listing.".to_string())
}
