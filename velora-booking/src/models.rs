use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use velora_catalog::{AddOn, BookableResource, Quote, ResourceKind, StayWindow};
use velora_core::payment::{PaymentOutcome, PaymentStatus};

/// Booking status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Terminal statuses admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "COMPLETED" => Ok(BookingStatus::Completed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// A traveller or guest attached to a booking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuestDetail {
    pub first_name: String,
    pub last_name: String,
    pub guest_type: String, // ADULT, CHILD
}

/// The reservation record. Mutated only through the state machine; never
/// physically deleted once it leaves `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub resource_kind: ResourceKind,
    pub requester_id: String,
    pub quantity: u32,
    pub window: StayWindow,
    pub status: BookingStatus,
    /// Externally visible identifier shown to users instead of `id`.
    /// Immutable once assigned.
    pub reference: String,
    pub base_price: Decimal,
    pub service_fee: Decimal,
    pub additional_fees: Decimal,
    pub currency: String,
    pub add_ons: Vec<AddOn>,
    pub guests: Vec<GuestDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    /// Optimistic-concurrency guard, bumped by the repository on update.
    pub version: i64,
}

impl Booking {
    pub fn create(
        resource: &BookableResource,
        request: &BookingRequest,
        quote: &Quote,
        reference: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource_id: resource.id,
            resource_kind: resource.kind,
            requester_id: request.requester_id.clone(),
            quantity: request.quantity,
            window: request.window,
            status: BookingStatus::Pending,
            reference,
            base_price: quote.base,
            service_fee: quote.service_fee,
            additional_fees: quote.additional_fees,
            currency: quote.currency.clone(),
            add_ons: request.add_ons.clone(),
            guests: request.guests.clone(),
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            cancellation_reason: None,
            version: 0,
        }
    }

    /// The amount due, always recomputed from its components.
    pub fn total(&self) -> Decimal {
        self.base_price + self.service_fee + self.additional_fees
    }
}

/// Input to `ReservationEngine::create_booking`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub resource_id: Uuid,
    pub requester_id: String,
    pub quantity: u32,
    pub window: StayWindow,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
    #[serde(default)]
    pub guests: Vec<GuestDetail>,
}

/// A payment outcome reported by the gateway, recorded against a booking.
/// The booking references these records; it does not own the payment flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider_reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub recorded_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn from_outcome(outcome: PaymentOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id: outcome.booking_id,
            provider_reference: outcome.provider_reference,
            amount: outcome.amount,
            currency: outcome.currency,
            status: outcome.status,
            recorded_at: outcome.reported_at,
        }
    }
}
