use crate::models::{Booking, BookingStatus};
use chrono::{DateTime, Duration, Utc};
use velora_catalog::ResourceKind;

/// Minimum notice required before the window start for a cancellation to
/// be accepted.
pub fn cancellation_lead_time(kind: ResourceKind) -> Duration {
    match kind {
        ResourceKind::Flight => Duration::hours(24),
        ResourceKind::Yacht => Duration::days(7),
        ResourceKind::Car => Duration::hours(4),
        ResourceKind::HotelRoom => Duration::days(1),
    }
}

/// Why a cancellation is or is not allowed. `WrongStatus` and
/// `WindowClosed` surface as different errors to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelVerdict {
    Eligible,
    WrongStatus { status: BookingStatus },
    WindowClosed { deadline: DateTime<Utc> },
}

/// Pure eligibility check over a booking snapshot and an explicit clock.
pub fn can_cancel(booking: &Booking, now: DateTime<Utc>) -> CancelVerdict {
    if !matches!(booking.status, BookingStatus::Pending | BookingStatus::Confirmed) {
        return CancelVerdict::WrongStatus { status: booking.status };
    }

    let deadline = booking.window.start() - cancellation_lead_time(booking.resource_kind);
    if now >= deadline {
        CancelVerdict::WindowClosed { deadline }
    } else {
        CancelVerdict::Eligible
    }
}
