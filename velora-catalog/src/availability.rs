use crate::resource::{BookableResource, CapacityModel, StayWindow};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// A provisional capacity reservation, promoted to an allocation when the
/// booking persists or released when the attempt fails. Holds not committed
/// before `expires_at` are reaped.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Hold {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub quantity: u32,
    pub window: StayWindow,
    pub expires_at: DateTime<Utc>,
}

/// Capacity committed to a persisted booking.
#[derive(Debug, Clone)]
struct Allocation {
    quantity: u32,
    window: StayWindow,
}

/// Per-resource capacity ledger. All reads and writes happen under the
/// resource's own mutex.
struct ResourceLedger {
    capacity: CapacityModel,
    is_active: bool,
    holds: HashMap<Uuid, Hold>,
    allocations: HashMap<Uuid, Allocation>,
}

impl ResourceLedger {
    fn new(resource: &BookableResource) -> Self {
        Self {
            capacity: resource.capacity.clone(),
            is_active: resource.is_active,
            holds: HashMap::new(),
            allocations: HashMap::new(),
        }
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> Vec<Uuid> {
        let expired: Vec<Uuid> = self
            .holds
            .values()
            .filter(|h| h.expires_at <= now)
            .map(|h| h.id)
            .collect();
        for id in &expired {
            self.holds.remove(id);
        }
        expired
    }

    fn seats_in_use(&self) -> u32 {
        let held: u32 = self.holds.values().map(|h| h.quantity).sum();
        let allocated: u32 = self.allocations.values().map(|a| a.quantity).sum();
        held + allocated
    }

    fn window_conflict(&self, window: &StayWindow) -> Option<StayWindow> {
        self.holds
            .values()
            .map(|h| h.window)
            .chain(self.allocations.values().map(|a| a.window))
            .find(|taken| taken.overlaps(window))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(Uuid),

    #[error("Resource is not open for booking: {0}")]
    ResourceUnavailable(Uuid),

    #[error("Insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity { requested: u32, available: u32 },

    #[error("Window already taken: [{start}, {end})")]
    WindowConflict {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Hold not found: {0}")]
    HoldNotFound(Uuid),

    #[error("Hold expired: {0}")]
    HoldExpired(Uuid),
}

/// The sole owner of resource capacity state.
///
/// `try_reserve` is the only entry point that debits capacity, and the
/// check-and-debit runs under a per-resource mutex, so two concurrent
/// callers can never jointly reserve more than exists. Contention is scoped
/// to a single resource; other resources proceed unimpeded.
pub struct AvailabilityIndex {
    resources: Mutex<HashMap<Uuid, Arc<Mutex<ResourceLedger>>>>,
    hold_index: Mutex<HashMap<Uuid, Uuid>>,
    hold_ttl: Duration,
}

impl AvailabilityIndex {
    pub fn new(hold_ttl: Duration) -> Self {
        Self {
            resources: Mutex::new(HashMap::new()),
            hold_index: Mutex::new(HashMap::new()),
            hold_ttl,
        }
    }

    /// Seed a ledger for a resource. Idempotent: an existing ledger (with
    /// its live holds and allocations) is left untouched.
    pub fn register(&self, resource: &BookableResource) {
        let mut resources = lock(&self.resources);
        resources
            .entry(resource.id)
            .or_insert_with(|| Arc::new(Mutex::new(ResourceLedger::new(resource))));
    }

    /// Flag a resource in or out of sale.
    pub fn set_active(&self, resource_id: Uuid, is_active: bool) -> Result<(), AvailabilityError> {
        let ledger = self.ledger(resource_id)?;
        lock(&ledger).is_active = is_active;
        Ok(())
    }

    /// Atomically check remaining capacity and place a hold on it.
    pub fn try_reserve(
        &self,
        resource_id: Uuid,
        window: StayWindow,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Hold, AvailabilityError> {
        let ledger = self.ledger(resource_id)?;
        let (hold, purged) = {
            let mut ledger = lock(&ledger);
            if !ledger.is_active {
                return Err(AvailabilityError::ResourceUnavailable(resource_id));
            }

            let purged = ledger.purge_expired(now);

            match ledger.capacity {
                CapacityModel::Seats { limit } => {
                    let used = ledger.seats_in_use();
                    let available = limit.saturating_sub(used);
                    if quantity > available {
                        self.forget_holds(&purged);
                        return Err(AvailabilityError::InsufficientCapacity {
                            requested: quantity,
                            available,
                        });
                    }
                }
                CapacityModel::ExclusiveWindow => {
                    if let Some(taken) = ledger.window_conflict(&window) {
                        self.forget_holds(&purged);
                        return Err(AvailabilityError::WindowConflict {
                            start: taken.start(),
                            end: taken.end(),
                        });
                    }
                }
            }

            let hold = Hold {
                id: Uuid::new_v4(),
                resource_id,
                quantity,
                window,
                expires_at: now + self.hold_ttl,
            };
            ledger.holds.insert(hold.id, hold.clone());
            (hold, purged)
        };

        let mut index = lock(&self.hold_index);
        for id in &purged {
            index.remove(id);
        }
        index.insert(hold.id, resource_id);
        Ok(hold)
    }

    /// Promote a hold into the allocation committed to `booking_id`.
    pub fn commit(
        &self,
        hold_id: Uuid,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AvailabilityError> {
        let resource_id = lock(&self.hold_index)
            .get(&hold_id)
            .copied()
            .ok_or(AvailabilityError::HoldNotFound(hold_id))?;
        let ledger = self.ledger(resource_id)?;

        let result = {
            let mut ledger = lock(&ledger);
            match ledger.holds.remove(&hold_id) {
                None => Err(AvailabilityError::HoldNotFound(hold_id)),
                Some(hold) if hold.expires_at <= now => {
                    Err(AvailabilityError::HoldExpired(hold_id))
                }
                Some(hold) => {
                    ledger.allocations.insert(
                        booking_id,
                        Allocation { quantity: hold.quantity, window: hold.window },
                    );
                    Ok(())
                }
            }
        };

        lock(&self.hold_index).remove(&hold_id);
        result
    }

    /// Discard an uncommitted hold. Releasing a hold that has already been
    /// reaped is not an error.
    pub fn release(&self, hold_id: Uuid) {
        let resource_id = match lock(&self.hold_index).remove(&hold_id) {
            Some(id) => id,
            None => return,
        };
        if let Ok(ledger) = self.ledger(resource_id) {
            if lock(&ledger).holds.remove(&hold_id).is_none() {
                tracing::debug!(%hold_id, "hold already reaped before release");
            }
        }
    }

    /// Return a cancelled booking's capacity to the pool. Returns whether an
    /// allocation was actually released.
    pub fn release_allocation(
        &self,
        resource_id: Uuid,
        booking_id: Uuid,
    ) -> Result<bool, AvailabilityError> {
        let ledger = self.ledger(resource_id)?;
        let released = lock(&ledger).allocations.remove(&booking_id).is_some();
        Ok(released)
    }

    /// Rebuild an allocation from a persisted booking, e.g. at startup.
    pub fn restore_allocation(
        &self,
        resource_id: Uuid,
        booking_id: Uuid,
        quantity: u32,
        window: StayWindow,
    ) -> Result<(), AvailabilityError> {
        let ledger = self.ledger(resource_id)?;
        lock(&ledger)
            .allocations
            .insert(booking_id, Allocation { quantity, window });
        Ok(())
    }

    /// Reap every expired hold across all resources. Called by the
    /// background sweep so abandoned booking attempts cannot strand
    /// capacity.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let ledgers: Vec<Arc<Mutex<ResourceLedger>>> =
            lock(&self.resources).values().cloned().collect();

        let mut purged = Vec::new();
        for ledger in ledgers {
            purged.extend(lock(&ledger).purge_expired(now));
        }
        self.forget_holds(&purged);
        purged.len()
    }

    /// Advisory seat count for display. Never used to authorize a booking.
    pub fn remaining_seats(&self, resource_id: Uuid) -> Option<u32> {
        let ledger = self.ledger(resource_id).ok()?;
        let ledger = lock(&ledger);
        match ledger.capacity {
            CapacityModel::Seats { limit } => Some(limit.saturating_sub(ledger.seats_in_use())),
            CapacityModel::ExclusiveWindow => None,
        }
    }

    /// Advisory overlap probe for display. Never used to authorize a booking.
    pub fn is_window_free(&self, resource_id: Uuid, window: &StayWindow) -> Option<bool> {
        let ledger = self.ledger(resource_id).ok()?;
        let ledger = lock(&ledger);
        match ledger.capacity {
            CapacityModel::Seats { .. } => None,
            CapacityModel::ExclusiveWindow => Some(ledger.window_conflict(window).is_none()),
        }
    }

    fn ledger(&self, resource_id: Uuid) -> Result<Arc<Mutex<ResourceLedger>>, AvailabilityError> {
        lock(&self.resources)
            .get(&resource_id)
            .cloned()
            .ok_or(AvailabilityError::ResourceNotFound(resource_id))
    }

    fn forget_holds(&self, hold_ids: &[Uuid]) {
        if hold_ids.is_empty() {
            return;
        }
        let mut index = lock(&self.hold_index);
        for id in hold_ids {
            index.remove(id);
        }
    }
}

// A poisoned mutex still guards a consistent ledger: every mutation either
// completes or leaves the maps untouched.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn date(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap()
    }

    fn seat_resource(limit: u32) -> BookableResource {
        BookableResource::new(
            ResourceKind::Flight,
            "GVA-NCE charter".to_string(),
            Decimal::from(1000),
            "USD".to_string(),
            CapacityModel::Seats { limit },
            now(),
        )
    }

    fn room_resource() -> BookableResource {
        BookableResource::new(
            ResourceKind::HotelRoom,
            "Royal suite".to_string(),
            Decimal::from(900),
            "USD".to_string(),
            CapacityModel::ExclusiveWindow,
            now(),
        )
    }

    fn departure() -> StayWindow {
        StayWindow::Instant { at: Utc.with_ymd_and_hms(2024, 3, 20, 9, 0, 0).unwrap() }
    }

    #[test]
    fn test_seat_reservation_scenario() {
        let index = AvailabilityIndex::new(Duration::minutes(15));
        let resource = seat_resource(8);
        index.register(&resource);

        let first = index.try_reserve(resource.id, departure(), 6, now()).unwrap();
        index.commit(first.id, Uuid::new_v4(), now()).unwrap();
        assert_eq!(index.remaining_seats(resource.id), Some(2));

        let denied = index.try_reserve(resource.id, departure(), 3, now());
        assert!(matches!(
            denied,
            Err(AvailabilityError::InsufficientCapacity { requested: 3, available: 2 })
        ));

        let second = index.try_reserve(resource.id, departure(), 2, now()).unwrap();
        index.commit(second.id, Uuid::new_v4(), now()).unwrap();
        assert_eq!(index.remaining_seats(resource.id), Some(0));
    }

    #[test]
    fn test_adjacent_windows_allowed_overlap_rejected() {
        let index = AvailabilityIndex::new(Duration::minutes(15));
        let room = room_resource();
        index.register(&room);

        let first = StayWindow::Range { start: date(10), end: date(12) };
        let hold = index.try_reserve(room.id, first, 2, now()).unwrap();
        index.commit(hold.id, Uuid::new_v4(), now()).unwrap();

        // Checkout on the 12th, check-in on the 12th: no conflict
        let adjacent = StayWindow::Range { start: date(12), end: date(14) };
        let hold = index.try_reserve(room.id, adjacent, 2, now()).unwrap();
        index.commit(hold.id, Uuid::new_v4(), now()).unwrap();

        let overlapping = StayWindow::Range { start: date(11), end: date(13) };
        assert!(matches!(
            index.try_reserve(room.id, overlapping, 2, now()),
            Err(AvailabilityError::WindowConflict { .. })
        ));
    }

    #[test]
    fn test_expired_hold_frees_capacity() {
        let index = AvailabilityIndex::new(Duration::minutes(15));
        let resource = seat_resource(4);
        index.register(&resource);

        index.try_reserve(resource.id, departure(), 4, now()).unwrap();
        assert!(index.try_reserve(resource.id, departure(), 1, now()).is_err());

        // Past the TTL the stale hold no longer counts
        let later = now() + Duration::minutes(16);
        let hold = index.try_reserve(resource.id, departure(), 4, later).unwrap();
        assert_eq!(hold.quantity, 4);
    }

    #[test]
    fn test_expired_hold_cannot_commit() {
        let index = AvailabilityIndex::new(Duration::minutes(15));
        let resource = seat_resource(4);
        index.register(&resource);

        let hold = index.try_reserve(resource.id, departure(), 2, now()).unwrap();
        let later = now() + Duration::minutes(16);
        assert!(matches!(
            index.commit(hold.id, Uuid::new_v4(), later),
            Err(AvailabilityError::HoldExpired(_))
        ));
        assert_eq!(index.remaining_seats(resource.id), Some(4));
    }

    #[test]
    fn test_sweep_reaps_expired_holds() {
        let index = AvailabilityIndex::new(Duration::minutes(15));
        let resource = seat_resource(8);
        index.register(&resource);

        index.try_reserve(resource.id, departure(), 3, now()).unwrap();
        index.try_reserve(resource.id, departure(), 2, now()).unwrap();

        assert_eq!(index.sweep_expired(now()), 0);
        assert_eq!(index.sweep_expired(now() + Duration::minutes(16)), 2);
        assert_eq!(index.remaining_seats(resource.id), Some(8));
    }

    #[test]
    fn test_release_allocation_returns_capacity_once() {
        let index = AvailabilityIndex::new(Duration::minutes(15));
        let resource = seat_resource(8);
        index.register(&resource);
        let booking_id = Uuid::new_v4();

        let hold = index.try_reserve(resource.id, departure(), 5, now()).unwrap();
        index.commit(hold.id, booking_id, now()).unwrap();
        assert_eq!(index.remaining_seats(resource.id), Some(3));

        assert!(index.release_allocation(resource.id, booking_id).unwrap());
        assert_eq!(index.remaining_seats(resource.id), Some(8));

        // Second release finds nothing to return
        assert!(!index.release_allocation(resource.id, booking_id).unwrap());
        assert_eq!(index.remaining_seats(resource.id), Some(8));
    }

    #[test]
    fn test_inactive_resource_rejected() {
        let index = AvailabilityIndex::new(Duration::minutes(15));
        let resource = seat_resource(8);
        index.register(&resource);
        index.set_active(resource.id, false).unwrap();

        assert!(matches!(
            index.try_reserve(resource.id, departure(), 1, now()),
            Err(AvailabilityError::ResourceUnavailable(_))
        ));
    }

    #[test]
    fn test_unknown_resource_rejected() {
        let index = AvailabilityIndex::new(Duration::minutes(15));
        assert!(matches!(
            index.try_reserve(Uuid::new_v4(), departure(), 1, now()),
            Err(AvailabilityError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_reservations_never_oversubscribe() {
        let index = Arc::new(AvailabilityIndex::new(Duration::minutes(15)));
        let resource = seat_resource(8);
        index.register(&resource);

        // Each contender wants more than half the cabin; only one can win.
        let mut handles = Vec::new();
        for _ in 0..4 {
            let index = Arc::clone(&index);
            let resource_id = resource.id;
            handles.push(std::thread::spawn(move || {
                index.try_reserve(resource_id, departure(), 5, now()).is_ok()
            }));
        }

        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|granted| *granted)
            .count();
        assert_eq!(granted, 1);
        assert_eq!(index.remaining_seats(resource.id), Some(3));
    }
}
