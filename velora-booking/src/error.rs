use crate::models::BookingStatus;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use velora_catalog::AvailabilityError;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(Uuid),

    #[error("Resource is not open for booking: {0}")]
    ResourceUnavailable(Uuid),

    #[error("Insufficient capacity: {0}")]
    InsufficientCapacity(String),

    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Cancellation window closed at {deadline}")]
    CancellationWindowClosed { deadline: DateTime<Utc> },

    #[error("Not permitted: {0}")]
    Unauthorized(String),

    #[error("Invalid booking request: {0}")]
    Validation(String),

    #[error("Booking reference collision")]
    ReferenceCollision,

    #[error("Concurrent update lost on booking {0}")]
    PersistenceConflict(Uuid),

    #[error("Storage failure: {0}")]
    Repository(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AvailabilityError> for BookingError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::ResourceNotFound(id) => BookingError::ResourceNotFound(id),
            AvailabilityError::ResourceUnavailable(id) => BookingError::ResourceUnavailable(id),
            AvailabilityError::InsufficientCapacity { requested, available } => {
                BookingError::InsufficientCapacity(format!(
                    "requested {requested}, available {available}"
                ))
            }
            AvailabilityError::WindowConflict { start, end } => {
                BookingError::InsufficientCapacity(format!(
                    "window [{start}, {end}) is already booked"
                ))
            }
            AvailabilityError::HoldNotFound(id) => {
                BookingError::Internal(format!("capacity hold vanished: {id}"))
            }
            AvailabilityError::HoldExpired(id) => {
                BookingError::Internal(format!("capacity hold expired before commit: {id}"))
            }
        }
    }
}
