use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roam_core::payment::{Payment, PaymentOutcome, PaymentStatus};
use roam_core::repository::{PaymentRepository, RepositoryError, RepositoryResult};
use roam_shared::BookingStatus;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::database::map_sqlx_error;

const PAYMENT_COLUMNS: &str = "id, booking_id, amount, currency, transaction_reference, \
     external_transaction_id, status, created_at, updated_at";

/// Postgres payment store.
///
/// Settlement is a conditional `UPDATE ... WHERE status = 'PENDING'`: when two
/// requests race, the second blocks on the row lock and then matches nothing.
#[derive(Clone)]
pub struct StorePaymentRepository {
    pool: PgPool,
}

impl StorePaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    amount: Decimal,
    currency: String,
    transaction_reference: String,
    external_transaction_id: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<PaymentStatus>().map_err(RepositoryError::Backend)?;

        Ok(Payment {
            id: row.id,
            booking_id: row.booking_id,
            amount: row.amount,
            currency: row.currency,
            transaction_reference: row.transaction_reference,
            external_transaction_id: row.external_transaction_id,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl PaymentRepository for StorePaymentRepository {
    async fn create_payment(&self, payment: &Payment) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, booking_id, amount, currency, transaction_reference, external_transaction_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(&payment.transaction_reference)
        .bind(&payment.external_transaction_id)
        .bind(payment.status.as_str())
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("payment", e))?;

        Ok(())
    }

    async fn find_by_booking(&self, booking_id: Uuid) -> RepositoryResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE booking_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("payment", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_reference(&self, tx_ref: &str) -> RepositoryResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE transaction_reference = $1",
            PAYMENT_COLUMNS
        ))
        .bind(tx_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("payment", e))?;

        row.map(Payment::try_from).transpose()
    }

    async fn settle_payment(
        &self,
        tx_ref: &str,
        outcome: &PaymentOutcome,
        booking_status: Option<BookingStatus>,
    ) -> RepositoryResult<Option<Payment>> {
        let external_id = match outcome {
            PaymentOutcome::Completed { external_id } => external_id.clone(),
            PaymentOutcome::Failed => None,
        };

        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("payment", e))?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            UPDATE payments
            SET status = $1, external_transaction_id = COALESCE($2, external_transaction_id), updated_at = NOW()
            WHERE transaction_reference = $3 AND status = 'PENDING'
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(outcome.target_status().as_str())
        .bind(external_id)
        .bind(tx_ref)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("payment", e))?;

        let Some(row) = row else {
            debug!("Payment {} is not pending, nothing to settle", tx_ref);
            tx.rollback().await.map_err(|e| map_sqlx_error("payment", e))?;
            return Ok(None);
        };
        let payment = Payment::try_from(row)?;

        if let Some(status) = booking_status {
            let updated = sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2")
                .bind(status.as_str())
                .bind(payment.booking_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("booking", e))?
                .rows_affected();

            if updated == 0 {
                // Dropping the transaction rolls the payment update back
                return Err(RepositoryError::NotFound(format!("booking {}", payment.booking_id)));
            }
        }

        tx.commit().await.map_err(|e| map_sqlx_error("payment", e))?;

        Ok(Some(payment))
    }

    async fn list_completed_pending(&self) -> RepositoryResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT p.id, p.booking_id, p.amount, p.currency, p.transaction_reference,
                   p.external_transaction_id, p.status, p.created_at, p.updated_at
            FROM payments p
            JOIN bookings b ON b.id = p.booking_id
            WHERE p.status = 'COMPLETED' AND b.status = 'pending'
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("payment", e))?;

        rows.into_iter().map(Payment::try_from).collect()
    }
}
