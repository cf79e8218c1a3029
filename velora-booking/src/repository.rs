use crate::models::{Booking, PaymentRecord};
use async_trait::async_trait;
use uuid::Uuid;
use velora_catalog::BookableResource;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Version conflict on booking {0}")]
    VersionConflict(Uuid),

    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Persistence contract for bookings and their payment records.
///
/// `update` must enforce optimistic concurrency: it compares the incoming
/// `version` against the stored one, bumps it on success, and fails with
/// `VersionConflict` when another writer got there first.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError>;

    async fn update(&self, booking: &Booking) -> Result<Booking, RepositoryError>;

    /// Remove a just-inserted record whose capacity commit failed. Only the
    /// creation path may call this; bookings are otherwise never deleted.
    async fn remove(&self, id: Uuid) -> Result<(), RepositoryError>;

    async fn get(&self, id: Uuid) -> Result<Option<Booking>, RepositoryError>;

    async fn list_for_resource(&self, resource_id: Uuid) -> Result<Vec<Booking>, RepositoryError>;

    /// Bookings still holding capacity (`Pending` or `Confirmed`).
    async fn list_active(&self) -> Result<Vec<Booking>, RepositoryError>;

    async fn reference_exists(&self, reference: &str) -> Result<bool, RepositoryError>;

    async fn add_payment(&self, record: &PaymentRecord) -> Result<(), RepositoryError>;

    async fn list_payments(&self, booking_id: Uuid) -> Result<Vec<PaymentRecord>, RepositoryError>;
}

/// Persistence contract for the bookable catalogue.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn insert(&self, resource: &BookableResource) -> Result<(), RepositoryError>;

    async fn get(&self, id: Uuid) -> Result<Option<BookableResource>, RepositoryError>;

    async fn list(&self) -> Result<Vec<BookableResource>, RepositoryError>;
}
