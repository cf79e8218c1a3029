use crate::error::BookingError;
use crate::models::{Booking, BookingRequest, BookingStatus, PaymentRecord};
use crate::reference;
use crate::repository::{BookingRepository, RepositoryError, ResourceRepository};
use crate::state;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;
use velora_catalog::{AvailabilityIndex, FeeCalculator, ResourceKind};
use velora_core::identity::Actor;
use velora_core::payment::PaymentOutcome;

/// Bounded-retry knobs for the two transparently retried failure kinds.
#[derive(Debug, Clone)]
pub struct EngineLimits {
    pub max_reference_attempts: u32,
    pub max_update_attempts: u32,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self { max_reference_attempts: 5, max_update_attempts: 3 }
    }
}

/// Coordinates availability, pricing, reference generation, and
/// persistence into the booking operations exposed to collaborators.
///
/// One engine serves all four resource kinds; per-kind behavior lives in
/// the policy table, the pricing units, and the capacity model.
pub struct ReservationEngine {
    bookings: Arc<dyn BookingRepository>,
    resources: Arc<dyn ResourceRepository>,
    availability: Arc<AvailabilityIndex>,
    fees: FeeCalculator,
    limits: EngineLimits,
}

impl ReservationEngine {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        resources: Arc<dyn ResourceRepository>,
        availability: Arc<AvailabilityIndex>,
        fees: FeeCalculator,
        limits: EngineLimits,
    ) -> Self {
        Self { bookings, resources, availability, fees, limits }
    }

    /// Create a booking in `Pending`.
    ///
    /// Capacity is held before anything is written; every later failure
    /// unwinds the hold (or the freshly persisted record), so a denied or
    /// crashed request leaves no trace.
    pub async fn create_booking(
        &self,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        if request.quantity == 0 {
            return Err(BookingError::Validation("quantity must be at least 1".to_string()));
        }
        if request.requester_id.trim().is_empty() {
            return Err(BookingError::Validation("requester id is required".to_string()));
        }

        let resource = self
            .bookable_resource(request.resource_id)
            .await?;
        request
            .window
            .validate_for(resource.kind)
            .map_err(|e| BookingError::Validation(e.to_string()))?;

        // The index may not know this resource yet (fresh process); seeding
        // is idempotent and keeps any live ledger untouched.
        self.availability.register(&resource);
        let hold = self
            .availability
            .try_reserve(resource.id, request.window, request.quantity, now)?;

        let quote = match self.fees.quote(&resource, request.quantity, &request.window, &request.add_ons)
        {
            Ok(quote) => quote,
            Err(e) => {
                self.availability.release(hold.id);
                return Err(BookingError::Validation(e.to_string()));
            }
        };

        let code = match self.unique_reference(resource.kind).await {
            Ok(code) => code,
            Err(e) => {
                self.availability.release(hold.id);
                return Err(e);
            }
        };

        let booking = Booking::create(&resource, &request, &quote, code, now);

        if let Err(e) = self.bookings.insert(&booking).await {
            self.availability.release(hold.id);
            return Err(map_repo(e));
        }

        if let Err(e) = self.availability.commit(hold.id, booking.id, now) {
            // Unwind the insert so no booking exists without its capacity
            if let Err(remove_err) = self.bookings.remove(booking.id).await {
                tracing::error!(
                    booking_id = %booking.id,
                    error = %remove_err,
                    "failed to unwind booking after capacity commit failure"
                );
            }
            return Err(BookingError::from(e));
        }

        tracing::info!(
            booking_id = %booking.id,
            reference = %booking.reference,
            resource_id = %booking.resource_id,
            "booking created"
        );
        Ok(booking)
    }

    /// Operator acknowledgement: Pending -> Confirmed.
    pub async fn confirm_booking(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        self.apply_transition(booking_id, BookingStatus::Confirmed, actor, None, now)
            .await
    }

    /// Terminal bookkeeping after travel: Confirmed -> Completed.
    /// Capacity was consumed, so there is nothing to release.
    pub async fn complete_booking(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        self.apply_transition(booking_id, BookingStatus::Completed, actor, None, now)
            .await
    }

    /// Cancel a booking and return its capacity to the pool.
    ///
    /// The release happens after the status write: a second cancellation
    /// attempt fails the transition check before it could release again.
    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        actor: &Actor,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .apply_transition(booking_id, BookingStatus::Cancelled, actor, reason, now)
            .await?;

        match self.availability.release_allocation(booking.resource_id, booking.id) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(booking_id = %booking.id, "no capacity allocation to release")
            }
            Err(e) => {
                tracing::warn!(booking_id = %booking.id, error = %e, "capacity release failed")
            }
        }

        tracing::info!(booking_id = %booking.id, "booking cancelled");
        Ok(booking)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.bookings
            .get(booking_id)
            .await
            .map_err(map_repo)?
            .ok_or(BookingError::BookingNotFound(booking_id))
    }

    pub async fn list_bookings_for_resource(
        &self,
        resource_id: Uuid,
    ) -> Result<Vec<Booking>, BookingError> {
        self.bookings
            .list_for_resource(resource_id)
            .await
            .map_err(map_repo)
    }

    /// Record a payment outcome reported by the gateway. The engine never
    /// initiates or retries payments.
    pub async fn record_payment_outcome(
        &self,
        outcome: PaymentOutcome,
    ) -> Result<PaymentRecord, BookingError> {
        // Reject outcomes for bookings we do not know
        self.get_booking(outcome.booking_id).await?;

        let record = PaymentRecord::from_outcome(outcome);
        self.bookings.add_payment(&record).await.map_err(map_repo)?;
        tracing::info!(
            booking_id = %record.booking_id,
            provider_reference = %record.provider_reference,
            status = ?record.status,
            "payment outcome recorded"
        );
        Ok(record)
    }

    pub async fn payments_for_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<PaymentRecord>, BookingError> {
        self.bookings.list_payments(booking_id).await.map_err(map_repo)
    }

    /// Rebuild the availability ledgers from persisted state, e.g. at
    /// process start. Returns how many allocations were restored.
    pub async fn restore_availability(&self) -> Result<usize, BookingError> {
        let mut restored = 0;
        for booking in self.bookings.list_active().await.map_err(map_repo)? {
            let resource = match self.resources.get(booking.resource_id).await.map_err(map_repo)? {
                Some(resource) => resource,
                None => {
                    tracing::warn!(
                        booking_id = %booking.id,
                        resource_id = %booking.resource_id,
                        "active booking references a missing resource"
                    );
                    continue;
                }
            };
            self.availability.register(&resource);
            self.availability
                .restore_allocation(resource.id, booking.id, booking.quantity, booking.window)?;
            restored += 1;
        }
        Ok(restored)
    }

    async fn bookable_resource(
        &self,
        resource_id: Uuid,
    ) -> Result<velora_catalog::BookableResource, BookingError> {
        let resource = self
            .resources
            .get(resource_id)
            .await
            .map_err(map_repo)?
            .ok_or(BookingError::ResourceNotFound(resource_id))?;
        if !resource.is_active {
            return Err(BookingError::ResourceUnavailable(resource_id));
        }
        Ok(resource)
    }

    /// Generate a reference and verify it against existing bookings,
    /// regenerating on collision. Collisions never surface to callers.
    async fn unique_reference(&self, kind: ResourceKind) -> Result<String, BookingError> {
        for attempt in 0..self.limits.max_reference_attempts {
            let code = reference::generate(kind);
            match self.bookings.reference_exists(&code).await {
                Ok(false) => return Ok(code),
                Ok(true) => {
                    tracing::debug!(attempt, "booking reference collision, regenerating");
                }
                Err(e) => return Err(map_repo(e)),
            }
        }
        Err(BookingError::Internal(
            "could not allocate a unique booking reference".to_string(),
        ))
    }

    /// Load-transition-store with bounded optimistic-concurrency retries.
    /// Business-rule rejections are returned verbatim, never retried.
    async fn apply_transition(
        &self,
        booking_id: Uuid,
        target: BookingStatus,
        actor: &Actor,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let mut attempts = 0;
        loop {
            let booking = self.get_booking(booking_id).await?;
            let updated = state::transition(&booking, target, actor, now, reason.clone())?;

            match self.bookings.update(&updated).await {
                Ok(stored) => return Ok(stored),
                Err(RepositoryError::VersionConflict(_)) => {
                    attempts += 1;
                    if attempts >= self.limits.max_update_attempts {
                        return Err(BookingError::PersistenceConflict(booking_id));
                    }
                    tracing::debug!(
                        %booking_id,
                        attempts,
                        "version conflict applying transition, reloading"
                    );
                }
                Err(e) => return Err(map_repo(e)),
            }
        }
    }
}

fn map_repo(err: RepositoryError) -> BookingError {
    match err {
        RepositoryError::VersionConflict(id) => BookingError::PersistenceConflict(id),
        other => BookingError::Repository(other.to_string()),
    }
}
