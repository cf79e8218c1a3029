use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use velora_booking::BookingError;
use velora_catalog::{BookableResource, CapacityModel, ResourceKind, StayWindow};
use velora_shared::money::DEFAULT_CURRENCY;

use crate::error::ApiError;
use crate::identity::actor_from_headers;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    pub kind: ResourceKind,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub currency: Option<String>,
    /// Required for seat-based kinds, ignored for exclusive-window kinds
    pub seat_limit: Option<u32>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    pub id: Uuid,
    pub kind: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub currency: String,
    pub capacity: CapacityModel,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<BookableResource> for ResourceResponse {
    fn from(resource: BookableResource) -> Self {
        Self {
            id: resource.id,
            kind: resource.kind.to_string(),
            name: resource.name,
            description: resource.description,
            unit_price: resource.unit_price,
            currency: resource.currency,
            capacity: resource.capacity,
            is_active: resource.is_active,
            created_at: resource.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Advisory snapshot for display. Booking authorization happens only
/// inside the availability index.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub resource_id: Uuid,
    pub remaining_seats: Option<u32>,
    pub window_free: Option<bool>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/resources
/// Operator surface for adding units to the catalogue
pub async fn create_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateResourceRequest>,
) -> Result<(StatusCode, Json<ResourceResponse>), ApiError> {
    let actor = actor_from_headers(&headers)?;
    if !actor.role.is_privileged() {
        return Err(ApiError::Domain(BookingError::Unauthorized(
            "only operators may manage the catalogue".to_string(),
        )));
    }

    let capacity = if req.kind.is_seat_based() {
        let limit = req.seat_limit.ok_or_else(|| {
            ApiError::BadRequest("seat_limit is required for seat-based resources".to_string())
        })?;
        if limit == 0 {
            return Err(ApiError::BadRequest("seat_limit must be at least 1".to_string()));
        }
        CapacityModel::Seats { limit }
    } else {
        CapacityModel::ExclusiveWindow
    };

    let mut resource = BookableResource::new(
        req.kind,
        req.name,
        req.unit_price,
        req.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        capacity,
        Utc::now(),
    );
    resource.description = req.description;
    if let Some(metadata) = req.metadata {
        resource.metadata = metadata;
    }

    state
        .resources
        .insert(&resource)
        .await
        .map_err(|e| ApiError::Domain(BookingError::Repository(e.to_string())))?;
    state.availability.register(&resource);

    tracing::info!(resource_id = %resource.id, kind = %resource.kind, "resource created");
    Ok((StatusCode::CREATED, Json(resource.into())))
}

/// GET /v1/resources
pub async fn list_resources(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResourceResponse>>, ApiError> {
    let resources = state
        .resources
        .list()
        .await
        .map_err(|e| ApiError::Domain(BookingError::Repository(e.to_string())))?;
    Ok(Json(resources.into_iter().map(Into::into).collect()))
}

/// GET /v1/resources/:id
pub async fn get_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<Uuid>,
) -> Result<Json<ResourceResponse>, ApiError> {
    let resource = state
        .resources
        .get(resource_id)
        .await
        .map_err(|e| ApiError::Domain(BookingError::Repository(e.to_string())))?
        .ok_or(ApiError::Domain(BookingError::ResourceNotFound(resource_id)))?;
    Ok(Json(resource.into()))
}

/// GET /v1/resources/:id/availability
pub async fn get_availability(
    State(state): State<AppState>,
    Path(resource_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    // Make sure the ledger exists even if nothing was booked yet
    let resource = state
        .resources
        .get(resource_id)
        .await
        .map_err(|e| ApiError::Domain(BookingError::Repository(e.to_string())))?
        .ok_or(ApiError::Domain(BookingError::ResourceNotFound(resource_id)))?;
    state.availability.register(&resource);

    let window_free = match (query.start, query.end) {
        (Some(start), Some(end)) => state
            .availability
            .is_window_free(resource_id, &StayWindow::Range { start, end }),
        _ => None,
    };

    Ok(Json(AvailabilityResponse {
        resource_id,
        remaining_seats: state.availability.remaining_seats(resource_id),
        window_free,
    }))
}
