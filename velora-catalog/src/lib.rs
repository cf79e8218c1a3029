pub mod availability;
pub mod pricing;
pub mod resource;

pub use availability::{AvailabilityError, AvailabilityIndex, Hold};
pub use pricing::{AddOn, FeeCalculator, PricingError, Quote};
pub use resource::{BookableResource, CapacityModel, ResourceKind, StayWindow, WindowError};
