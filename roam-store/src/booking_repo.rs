use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use roam_core::repository::{
    BookingRepository, ListingRepository, RepositoryError, RepositoryResult, ReviewRepository,
    UserRepository,
};
use roam_shared::pii::Masked;
use roam_shared::{Booking, BookingStatus, Listing, Review, User};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::map_sqlx_error;

/// Postgres access to users, listings, bookings and reviews
#[derive(Clone)]
pub struct StoreBookingRepository {
    pool: PgPool,
}

impl StoreBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    phone_number: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: Masked(row.email),
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number: row.phone_number,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    host_id: Uuid,
    title: String,
    price_per_night: Decimal,
    description: String,
    location: String,
    created_at: DateTime<Utc>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Listing {
            id: row.id,
            host_id: row.host_id,
            title: row.title,
            price_per_night: row.price_per_night,
            description: row.description,
            location: row.location,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    listing_id: Uuid,
    user_id: Uuid,
    status: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<BookingStatus>()
            .map_err(|e| RepositoryError::Backend(e.to_string()))?;

        Ok(Booking {
            id: row.id,
            listing_id: row.listing_id,
            user_id: row.user_id,
            status,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    booking_id: Uuid,
    listing_id: Uuid,
    user_id: Uuid,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            booking_id: row.booking_id,
            listing_id: row.listing_id,
            user_id: row.user_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UserRepository for StoreBookingRepository {
    async fn get_user(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, first_name, last_name, phone_number FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user", e))?;

        Ok(row.map(User::from))
    }
}

#[async_trait]
impl ListingRepository for StoreBookingRepository {
    async fn get_listing(&self, id: Uuid) -> RepositoryResult<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(
            "SELECT id, host_id, title, price_per_night, description, location, created_at FROM listings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("listing", e))?;

        Ok(row.map(Listing::from))
    }
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn create_booking(&self, booking: &Booking) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, listing_id, user_id, status, start_date, end_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(booking.id)
        .bind(booking.listing_id)
        .bind(booking.user_id)
        .bind(booking.status.as_str())
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("booking", e))?;

        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> RepositoryResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(
            "SELECT id, listing_id, user_id, status, start_date, end_date, created_at FROM bookings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("booking", e))?;

        row.map(Booking::try_from).transpose()
    }

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("booking", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("booking {}", id)));
        }
        Ok(())
    }

    async fn delete_booking(&self, id: Uuid) -> RepositoryResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("booking", e))?;

        // Children first: reviews and the payment reference the booking
        sqlx::query("DELETE FROM reviews WHERE booking_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("review", e))?;

        sqlx::query("DELETE FROM payments WHERE booking_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("payment", e))?;

        let deleted = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("booking", e))?
            .rows_affected();

        tx.commit().await.map_err(|e| map_sqlx_error("booking", e))?;

        Ok(deleted > 0)
    }
}

#[async_trait]
impl ReviewRepository for StoreBookingRepository {
    async fn create_review(&self, review: &Review) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, booking_id, listing_id, user_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(review.id)
        .bind(review.booking_id)
        .bind(review.listing_id)
        .bind(review.user_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("review", e))?;

        Ok(())
    }

    async fn find_review(&self, user_id: Uuid, listing_id: Uuid) -> RepositoryResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, booking_id, listing_id, user_id, rating, comment, created_at FROM reviews WHERE user_id = $1 AND listing_id = $2",
        )
        .bind(user_id)
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("review", e))?;

        Ok(row.map(Review::from))
    }

    async fn list_reviews_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, booking_id, listing_id, user_id, rating, comment, created_at FROM reviews WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("review", e))?;

        Ok(rows.into_iter().map(Review::from).collect())
    }
}
