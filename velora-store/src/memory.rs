use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use velora_booking::{
    Booking, BookingRepository, BookingStatus, PaymentRecord, RepositoryError, ResourceRepository,
};
use velora_catalog::BookableResource;

/// In-memory booking store backing tests and the default dev wiring.
/// Honors the same optimistic-concurrency contract as the Postgres repo.
#[derive(Default)]
pub struct MemoryBookingRepository {
    bookings: RwLock<HashMap<Uuid, Booking>>,
    payments: RwLock<Vec<PaymentRecord>>,
}

impl MemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.id) {
            return Err(RepositoryError::Duplicate(booking.id.to_string()));
        }
        bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn update(&self, booking: &Booking) -> Result<Booking, RepositoryError> {
        let mut bookings = self.bookings.write().await;
        let existing = bookings
            .get(&booking.id)
            .ok_or_else(|| RepositoryError::NotFound(booking.id.to_string()))?;
        if existing.version != booking.version {
            return Err(RepositoryError::VersionConflict(booking.id));
        }
        let mut stored = booking.clone();
        stored.version += 1;
        bookings.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn remove(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.bookings.write().await.remove(&id);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, RepositoryError> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list_for_resource(&self, resource_id: Uuid) -> Result<Vec<Booking>, RepositoryError> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.resource_id == resource_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.created_at);
        Ok(bookings)
    }

    async fn list_active(&self) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| matches!(b.status, BookingStatus::Pending | BookingStatus::Confirmed))
            .cloned()
            .collect())
    }

    async fn reference_exists(&self, reference: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .bookings
            .read()
            .await
            .values()
            .any(|b| b.reference == reference))
    }

    async fn add_payment(&self, record: &PaymentRecord) -> Result<(), RepositoryError> {
        self.payments.write().await.push(record.clone());
        Ok(())
    }

    async fn list_payments(&self, booking_id: Uuid) -> Result<Vec<PaymentRecord>, RepositoryError> {
        Ok(self
            .payments
            .read()
            .await
            .iter()
            .filter(|p| p.booking_id == booking_id)
            .cloned()
            .collect())
    }
}

/// In-memory catalogue store.
#[derive(Default)]
pub struct MemoryResourceRepository {
    resources: RwLock<HashMap<Uuid, BookableResource>>,
}

impl MemoryResourceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceRepository for MemoryResourceRepository {
    async fn insert(&self, resource: &BookableResource) -> Result<(), RepositoryError> {
        self.resources
            .write()
            .await
            .insert(resource.id, resource.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<BookableResource>, RepositoryError> {
        Ok(self.resources.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<BookableResource>, RepositoryError> {
        let mut resources: Vec<BookableResource> =
            self.resources.read().await.values().cloned().collect();
        resources.sort_by_key(|r| r.created_at);
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use velora_booking::models::BookingRequest;
    use velora_catalog::{CapacityModel, FeeCalculator, ResourceKind, StayWindow};

    fn sample_booking() -> Booking {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let resource = BookableResource::new(
            ResourceKind::Flight,
            "store test".to_string(),
            Decimal::from(100),
            "USD".to_string(),
            CapacityModel::Seats { limit: 4 },
            created,
        );
        let window = StayWindow::Instant {
            at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
        };
        let request = BookingRequest {
            resource_id: resource.id,
            requester_id: "guest-1".to_string(),
            quantity: 1,
            window,
            add_ons: vec![],
            guests: vec![],
        };
        let quote = FeeCalculator::default().quote(&resource, 1, &window, &[]).unwrap();
        Booking::create(&resource, &request, &quote, "FLSTORE001".to_string(), created)
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let repo = MemoryBookingRepository::new();
        let booking = sample_booking();

        repo.insert(&booking).await.unwrap();
        assert!(matches!(
            repo.insert(&booking).await,
            Err(RepositoryError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_update_enforces_versions() {
        let repo = MemoryBookingRepository::new();
        let booking = sample_booking();
        repo.insert(&booking).await.unwrap();

        let stored = repo.update(&booking).await.unwrap();
        assert_eq!(stored.version, booking.version + 1);

        // A writer holding the stale snapshot loses
        assert!(matches!(
            repo.update(&booking).await,
            Err(RepositoryError::VersionConflict(_))
        ));
    }

    #[tokio::test]
    async fn test_reference_lookup() {
        let repo = MemoryBookingRepository::new();
        let booking = sample_booking();
        repo.insert(&booking).await.unwrap();

        assert!(repo.reference_exists("FLSTORE001").await.unwrap());
        assert!(!repo.reference_exists("FLSTORE002").await.unwrap());
    }
}
