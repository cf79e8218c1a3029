pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod memory;
pub mod resource_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use memory::{MemoryBookingRepository, MemoryResourceRepository};
pub use resource_repo::PgResourceRepository;
