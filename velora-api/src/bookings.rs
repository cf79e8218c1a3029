use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use velora_booking::{Booking, BookingRequest, PaymentRecord};
use velora_catalog::{AddOn, StayWindow};
use velora_shared::events::{BookingCancelledEvent, BookingCreatedEvent, BookingStatusChangedEvent};

use crate::error::ApiError;
use crate::identity::actor_from_headers;
use crate::log_telemetry;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub resource_id: Uuid,
    pub quantity: u32,
    pub window: WindowDto,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
    #[serde(default)]
    pub guests: Vec<velora_booking::GuestDetail>,
}

/// Flights send `departure`; the range kinds send `start`/`end`.
#[derive(Debug, Deserialize)]
pub struct WindowDto {
    pub departure: Option<DateTime<Utc>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl WindowDto {
    fn into_window(self) -> Result<StayWindow, ApiError> {
        match (self.departure, self.start, self.end) {
            (Some(at), None, None) => Ok(StayWindow::Instant { at }),
            (None, Some(start), Some(end)) => Ok(StayWindow::Range { start, end }),
            _ => Err(ApiError::BadRequest(
                "window requires either departure or start and end".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub reference: String,
    pub resource_id: Uuid,
    pub resource_kind: String,
    pub requester_id: String,
    pub quantity: u32,
    pub window: StayWindow,
    pub status: String,
    pub base_price: Decimal,
    pub service_fee: Decimal,
    pub additional_fees: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub add_ons: Vec<AddOn>,
    pub guests: Vec<velora_booking::GuestDetail>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            reference: booking.reference.clone(),
            resource_id: booking.resource_id,
            resource_kind: booking.resource_kind.to_string(),
            requester_id: booking.requester_id.clone(),
            quantity: booking.quantity,
            window: booking.window,
            status: booking.status.to_string(),
            base_price: booking.base_price,
            service_fee: booking.service_fee,
            additional_fees: booking.additional_fees,
            total: booking.total(),
            currency: booking.currency.clone(),
            add_ons: booking.add_ons,
            guests: booking.guests,
            created_at: booking.created_at,
            cancelled_at: booking.cancelled_at,
            cancellation_reason: booking.cancellation_reason,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentRecordResponse {
    pub id: Uuid,
    pub provider_reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: velora_core::payment::PaymentStatus,
    pub recorded_at: DateTime<Utc>,
}

impl From<PaymentRecord> for PaymentRecordResponse {
    fn from(record: PaymentRecord) -> Self {
        Self {
            id: record.id,
            provider_reference: record.provider_reference,
            amount: record.amount,
            currency: record.currency,
            status: record.status,
            recorded_at: record.recorded_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let actor = actor_from_headers(&headers)?;
    let window = req.window.into_window()?;

    let request = BookingRequest {
        resource_id: req.resource_id,
        requester_id: actor.user_id,
        quantity: req.quantity,
        window,
        add_ons: req.add_ons,
        guests: req.guests,
    };

    let booking = state
        .engine
        .create_booking(request, Utc::now())
        .await
        .map_err(ApiError::Domain)?;

    log_telemetry(
        "booking.created",
        &BookingCreatedEvent {
            booking_id: booking.id,
            resource_id: booking.resource_id,
            reference: booking.reference.clone(),
            requester_id: booking.requester_id.clone(),
            total: booking.total(),
            currency: booking.currency.clone(),
            timestamp: Utc::now().timestamp(),
        },
    );

    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// GET /v1/bookings/:id
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state
        .engine
        .get_booking(booking_id)
        .await
        .map_err(ApiError::Domain)?;
    Ok(Json(booking.into()))
}

/// POST /v1/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<CancelBookingRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let actor = actor_from_headers(&headers)?;

    let booking = state
        .engine
        .cancel_booking(booking_id, &actor, req.reason, Utc::now())
        .await
        .map_err(ApiError::Domain)?;

    log_telemetry(
        "booking.cancelled",
        &BookingCancelledEvent {
            booking_id: booking.id,
            resource_id: booking.resource_id,
            reason: booking.cancellation_reason.clone(),
            timestamp: Utc::now().timestamp(),
        },
    );

    Ok(Json(booking.into()))
}

/// POST /v1/bookings/:id/confirm
/// Operator acknowledgement of a pending booking
pub async fn confirm_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<BookingResponse>, ApiError> {
    let actor = actor_from_headers(&headers)?;

    let booking = state
        .engine
        .confirm_booking(booking_id, &actor, Utc::now())
        .await
        .map_err(ApiError::Domain)?;

    log_telemetry(
        "booking.status_changed",
        &BookingStatusChangedEvent {
            booking_id: booking.id,
            from_status: "PENDING".to_string(),
            to_status: booking.status.to_string(),
            actor_id: actor.user_id,
            timestamp: Utc::now().timestamp(),
        },
    );

    Ok(Json(booking.into()))
}

/// POST /v1/bookings/:id/complete
/// Terminal bookkeeping once the travel date has passed
pub async fn complete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<BookingResponse>, ApiError> {
    let actor = actor_from_headers(&headers)?;

    let booking = state
        .engine
        .complete_booking(booking_id, &actor, Utc::now())
        .await
        .map_err(ApiError::Domain)?;

    log_telemetry(
        "booking.status_changed",
        &BookingStatusChangedEvent {
            booking_id: booking.id,
            from_status: "CONFIRMED".to_string(),
            to_status: booking.status.to_string(),
            actor_id: actor.user_id,
            timestamp: Utc::now().timestamp(),
        },
    );

    Ok(Json(booking.into()))
}

/// GET /v1/bookings/:id/payments
pub async fn list_payments(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentRecordResponse>>, ApiError> {
    let records = state
        .engine
        .payments_for_booking(booking_id)
        .await
        .map_err(ApiError::Domain)?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// GET /v1/resources/:id/bookings
pub async fn list_for_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<Uuid>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = state
        .engine
        .list_bookings_for_resource(resource_id)
        .await
        .map_err(ApiError::Domain)?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}
