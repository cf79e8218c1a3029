use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resource families offered on the marketplace
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Flight,
    Yacht,
    Car,
    HotelRoom,
}

impl ResourceKind {
    /// Seat-pool kinds share capacity across bookings; the others grant
    /// exclusive use of the unit for the booked window.
    pub fn is_seat_based(&self) -> bool {
        matches!(self, ResourceKind::Flight)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ResourceKind::Flight => "FLIGHT",
            ResourceKind::Yacht => "YACHT",
            ResourceKind::Car => "CAR",
            ResourceKind::HotelRoom => "HOTEL_ROOM",
        };
        write!(f, "{label}")
    }
}

/// How a resource's capacity is accounted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "model", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapacityModel {
    /// A shared pool of seats (flights)
    Seats { limit: u32 },
    /// One unit, exclusively allocated per date window (yacht, car, hotel room)
    ExclusiveWindow,
}

/// The time span a booking occupies.
///
/// Ranges are half-open `[start, end)`: a checkout at `T` and a check-in
/// at `T` do not conflict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StayWindow {
    /// A single departure instant (flights)
    Instant { at: DateTime<Utc> },
    /// An occupancy range (yacht charters, car rentals, hotel stays)
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl StayWindow {
    /// The instant the resource starts being consumed. Cancellation lead
    /// times count down to this.
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            StayWindow::Instant { at } => *at,
            StayWindow::Range { start, .. } => *start,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            StayWindow::Instant { at } => *at,
            StayWindow::Range { end, .. } => *end,
        }
    }

    /// Half-open interval overlap test.
    pub fn overlaps(&self, other: &StayWindow) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }

    /// Reject window shapes that do not fit the resource kind.
    pub fn validate_for(&self, kind: ResourceKind) -> Result<(), WindowError> {
        match (kind, self) {
            (ResourceKind::Flight, StayWindow::Instant { .. }) => Ok(()),
            (ResourceKind::Flight, StayWindow::Range { .. }) => {
                Err(WindowError::ExpectedInstant)
            }
            (_, StayWindow::Instant { .. }) => Err(WindowError::ExpectedRange),
            (_, StayWindow::Range { start, end }) => {
                if end <= start {
                    Err(WindowError::EmptyRange)
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("this resource kind books a single departure instant")]
    ExpectedInstant,

    #[error("this resource kind books a start/end range")]
    ExpectedRange,

    #[error("window end must be after its start")]
    EmptyRange,
}

/// A bookable unit in the catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookableResource {
    pub id: Uuid,
    pub kind: ResourceKind,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub currency: String,
    pub capacity: CapacityModel,
    pub is_active: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl BookableResource {
    pub fn new(
        kind: ResourceKind,
        name: String,
        unit_price: Decimal,
        currency: String,
        capacity: CapacityModel,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name,
            description: None,
            unit_price,
            currency,
            capacity,
            is_active: true,
            metadata: serde_json::json!({}),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_half_open_windows_do_not_conflict_at_boundary() {
        let first = StayWindow::Range { start: at(10, 14), end: at(12, 10) };
        let second = StayWindow::Range { start: at(12, 10), end: at(14, 10) };
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn test_overlapping_ranges_detected() {
        let first = StayWindow::Range { start: at(10, 0), end: at(12, 0) };
        let second = StayWindow::Range { start: at(11, 0), end: at(13, 0) };
        assert!(first.overlaps(&second));
        assert!(second.overlaps(&first));
    }

    #[test]
    fn test_window_shape_validation() {
        let range = StayWindow::Range { start: at(10, 0), end: at(12, 0) };
        let instant = StayWindow::Instant { at: at(10, 0) };

        assert!(range.validate_for(ResourceKind::HotelRoom).is_ok());
        assert!(instant.validate_for(ResourceKind::Flight).is_ok());
        assert_eq!(
            instant.validate_for(ResourceKind::Car),
            Err(WindowError::ExpectedRange)
        );
        assert_eq!(
            range.validate_for(ResourceKind::Flight),
            Err(WindowError::ExpectedInstant)
        );

        let empty = StayWindow::Range { start: at(12, 0), end: at(12, 0) };
        assert_eq!(
            empty.validate_for(ResourceKind::Yacht),
            Err(WindowError::EmptyRange)
        );
    }
}
