use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use velora_core::payment::{PaymentOutcome, PaymentStatus};
use velora_shared::events::PaymentRecordedEvent;

use crate::error::ApiError;
use crate::log_telemetry;
use crate::state::AppState;

/// Gateway-signed notification; signature verification happens upstream.
#[derive(Debug, Deserialize)]
pub struct PaymentWebhookRequest {
    pub booking_id: Uuid,
    pub provider_reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
}

/// POST /v1/payments/webhook
/// Record the payment collaborator's reported outcome against a booking.
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(req): Json<PaymentWebhookRequest>,
) -> Result<StatusCode, ApiError> {
    let outcome = PaymentOutcome {
        booking_id: req.booking_id,
        provider_reference: req.provider_reference,
        amount: req.amount,
        currency: req.currency,
        status: req.status,
        reported_at: Utc::now(),
    };

    let record = state
        .engine
        .record_payment_outcome(outcome)
        .await
        .map_err(ApiError::Domain)?;

    log_telemetry(
        "payment.recorded",
        &PaymentRecordedEvent {
            booking_id: record.booking_id,
            provider_reference: record.provider_reference.clone(),
            succeeded: record.status == PaymentStatus::Succeeded,
            timestamp: Utc::now().timestamp(),
        },
    );

    Ok(StatusCode::NO_CONTENT)
}
