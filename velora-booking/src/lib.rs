pub mod engine;
pub mod error;
pub mod models;
pub mod policy;
pub mod reference;
pub mod repository;
pub mod state;

pub use engine::{EngineLimits, ReservationEngine};
pub use error::BookingError;
pub use models::{Booking, BookingRequest, BookingStatus, GuestDetail, PaymentRecord};
pub use repository::{BookingRepository, RepositoryError, ResourceRepository};
