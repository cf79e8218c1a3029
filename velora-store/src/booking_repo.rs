use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;
use velora_booking::{Booking, BookingRepository, PaymentRecord, RepositoryError};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    resource_id: Uuid,
    resource_kind: String,
    requester_id: String,
    quantity: i32,
    booking_window: Value,
    status: String,
    reference: String,
    base_price: Decimal,
    service_fee: Decimal,
    additional_fees: Decimal,
    currency: String,
    add_ons: Value,
    guests: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    version: i64,
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    provider_reference: String,
    amount: Decimal,
    currency: String,
    status: String,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            resource_id: row.resource_id,
            resource_kind: enum_from_string(&row.resource_kind)?,
            requester_id: row.requester_id,
            quantity: row.quantity.max(0) as u32,
            window: from_json(row.booking_window)?,
            status: enum_from_string(&row.status)?,
            reference: row.reference,
            base_price: row.base_price,
            service_fee: row.service_fee,
            additional_fees: row.additional_fees,
            currency: row.currency,
            add_ons: from_json(row.add_ons)?,
            guests: from_json(row.guests)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            cancelled_at: row.cancelled_at,
            cancellation_reason: row.cancellation_reason,
            version: row.version,
        })
    }
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(PaymentRecord {
            id: row.id,
            booking_id: row.booking_id,
            provider_reference: row.provider_reference,
            amount: row.amount,
            currency: row.currency,
            status: enum_from_string(&row.status)?,
            recorded_at: row.recorded_at,
        })
    }
}

const SELECT_BOOKING: &str = r#"
    SELECT id, resource_id, resource_kind, requester_id, quantity, booking_window,
           status, reference, base_price, service_fee, additional_fees, currency,
           add_ons, guests, created_at, updated_at, cancelled_at,
           cancellation_reason, version
    FROM bookings
"#;

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, resource_id, resource_kind, requester_id, quantity,
                booking_window, status, reference, base_price, service_fee,
                additional_fees, currency, add_ons, guests, created_at,
                updated_at, cancelled_at, cancellation_reason, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(booking.id)
        .bind(booking.resource_id)
        .bind(enum_to_string(&booking.resource_kind)?)
        .bind(&booking.requester_id)
        .bind(booking.quantity as i32)
        .bind(to_json(&booking.window)?)
        .bind(booking.status.as_str())
        .bind(&booking.reference)
        .bind(booking.base_price)
        .bind(booking.service_fee)
        .bind(booking.additional_fees)
        .bind(&booking.currency)
        .bind(to_json(&booking.add_ons)?)
        .bind(to_json(&booking.guests)?)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .bind(booking.cancelled_at)
        .bind(&booking.cancellation_reason)
        .bind(booking.version)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn update(&self, booking: &Booking) -> Result<Booking, RepositoryError> {
        let updated = sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings
            SET status = $2, updated_at = $3, cancelled_at = $4,
                cancellation_reason = $5, version = version + 1
            WHERE id = $1 AND version = $6
            RETURNING id, resource_id, resource_kind, requester_id, quantity,
                      booking_window, status, reference, base_price, service_fee,
                      additional_fees, currency, add_ons, guests, created_at,
                      updated_at, cancelled_at, cancellation_reason, version
            "#,
        )
        .bind(booking.id)
        .bind(booking.status.as_str())
        .bind(booking.updated_at)
        .bind(booking.cancelled_at)
        .bind(&booking.cancellation_reason)
        .bind(booking.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        match updated {
            Some(row) => row.try_into(),
            None => {
                // Either another writer bumped the version or the record is gone
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bookings WHERE id = $1)")
                        .bind(booking.id)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(storage)?;
                if exists {
                    Err(RepositoryError::VersionConflict(booking.id))
                } else {
                    Err(RepositoryError::NotFound(booking.id.to_string()))
                }
            }
        }
    }

    async fn remove(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, RepositoryError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("{SELECT_BOOKING} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.map(Booking::try_from).transpose()
    }

    async fn list_for_resource(&self, resource_id: Uuid) -> Result<Vec<Booking>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "{SELECT_BOOKING} WHERE resource_id = $1 ORDER BY created_at"
        ))
        .bind(resource_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn list_active(&self) -> Result<Vec<Booking>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "{SELECT_BOOKING} WHERE status IN ('PENDING', 'CONFIRMED')"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn reference_exists(&self, reference: &str) -> Result<bool, RepositoryError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bookings WHERE reference = $1)")
            .bind(reference)
            .fetch_one(&self.pool)
            .await
            .map_err(storage)
    }

    async fn add_payment(&self, record: &PaymentRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO booking_payments (
                id, booking_id, provider_reference, amount, currency, status, recorded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(record.booking_id)
        .bind(&record.provider_reference)
        .bind(record.amount)
        .bind(&record.currency)
        .bind(enum_to_string(&record.status)?)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn list_payments(&self, booking_id: Uuid) -> Result<Vec<PaymentRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, booking_id, provider_reference, amount, currency, status, recorded_at
            FROM booking_payments
            WHERE booking_id = $1
            ORDER BY recorded_at
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.into_iter().map(PaymentRecord::try_from).collect()
    }
}

pub(crate) fn storage(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(err.to_string())
}

/// Enums persist as their serde string form (e.g. `HOTEL_ROOM`).
pub(crate) fn enum_to_string<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => Ok(s),
        Ok(other) => Err(RepositoryError::Storage(format!(
            "expected string-serializable enum, got {other}"
        ))),
        Err(e) => Err(RepositoryError::Storage(e.to_string())),
    }
}

pub(crate) fn enum_from_string<T: DeserializeOwned>(s: &str) -> Result<T, RepositoryError> {
    serde_json::from_value(Value::String(s.to_string()))
        .map_err(|e| RepositoryError::Storage(format!("malformed stored value {s}: {e}")))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, RepositoryError> {
    serde_json::to_value(value).map_err(|e| RepositoryError::Storage(e.to_string()))
}

pub(crate) fn from_json<T: DeserializeOwned>(value: Value) -> Result<T, RepositoryError> {
    serde_json::from_value(value).map_err(|e| RepositoryError::Storage(e.to_string()))
}
