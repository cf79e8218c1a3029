use std::sync::Arc;
use velora_booking::{ReservationEngine, ResourceRepository};
use velora_catalog::AvailabilityIndex;
use velora_store::app_config::BusinessRules;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ReservationEngine>,
    pub availability: Arc<AvailabilityIndex>,
    pub resources: Arc<dyn ResourceRepository>,
    pub business_rules: BusinessRules,
}
