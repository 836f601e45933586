use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub listing_id: Uuid,
    /// The guest who made the booking and is the only one allowed to pay for it.
    pub user_id: Uuid,
    pub status: BookingStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(BookingError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("End date {end} must be after start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Unknown booking status: {0}")]
    UnknownStatus(String),
}

impl Booking {
    pub fn new(
        listing_id: Uuid,
        user_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, BookingError> {
        if end_date <= start_date {
            return Err(BookingError::InvalidDateRange { start: start_date, end: end_date });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            listing_id,
            user_id,
            status: BookingStatus::Pending,
            start_date,
            end_date,
            created_at: Utc::now(),
        })
    }

    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Total price of the stay at the given nightly rate
    pub fn total_price(&self, price_per_night: Decimal) -> Decimal {
        price_per_night * Decimal::from(self.nights())
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_booking_requires_end_after_start() {
        let err = Booking::new(Uuid::new_v4(), Uuid::new_v4(), date(2025, 3, 10), date(2025, 3, 10))
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidDateRange { .. }));

        let err = Booking::new(Uuid::new_v4(), Uuid::new_v4(), date(2025, 3, 10), date(2025, 3, 9))
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_total_price_counts_nights() {
        let booking = Booking::new(Uuid::new_v4(), Uuid::new_v4(), date(2025, 3, 10), date(2025, 3, 14))
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.nights(), 4);
        assert_eq!(booking.total_price(dec!(125.50)), dec!(502.00));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [BookingStatus::Pending, BookingStatus::Confirmed, BookingStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("archived".parse::<BookingStatus>().is_err());
    }
}
