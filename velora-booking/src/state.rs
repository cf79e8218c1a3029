use crate::error::BookingError;
use crate::models::{Booking, BookingStatus};
use crate::policy::{self, CancelVerdict};
use chrono::{DateTime, Utc};
use velora_core::identity::Actor;

/// The legal transition table. Everything else is rejected.
///
/// Pending -> Confirmed -> Completed; Pending/Confirmed -> Cancelled.
pub fn is_legal(from: BookingStatus, to: BookingStatus) -> bool {
    matches!(
        (from, to),
        (BookingStatus::Pending, BookingStatus::Confirmed)
            | (BookingStatus::Confirmed, BookingStatus::Completed)
            | (BookingStatus::Pending, BookingStatus::Cancelled)
            | (BookingStatus::Confirmed, BookingStatus::Cancelled)
    )
}

/// Validate and apply a status transition over an immutable snapshot.
///
/// Returns the updated booking; the caller persists it and performs
/// capacity side effects. `now` and `actor` arrive explicitly so the
/// check is deterministic.
pub fn transition(
    booking: &Booking,
    target: BookingStatus,
    actor: &Actor,
    now: DateTime<Utc>,
    reason: Option<String>,
) -> Result<Booking, BookingError> {
    if !is_legal(booking.status, target) {
        return Err(BookingError::InvalidTransition { from: booking.status, to: target });
    }

    match target {
        BookingStatus::Confirmed | BookingStatus::Completed => {
            if !actor.role.is_privileged() {
                return Err(BookingError::Unauthorized(format!(
                    "only operators may move a booking to {target}"
                )));
            }
        }
        BookingStatus::Cancelled => {
            let owns = actor.user_id == booking.requester_id;
            if !owns && !actor.role.is_privileged() {
                return Err(BookingError::Unauthorized(
                    "only the booking owner or an operator may cancel".to_string(),
                ));
            }
            match policy::can_cancel(booking, now) {
                CancelVerdict::Eligible => {}
                CancelVerdict::WrongStatus { status } => {
                    return Err(BookingError::InvalidTransition { from: status, to: target });
                }
                CancelVerdict::WindowClosed { deadline } => {
                    return Err(BookingError::CancellationWindowClosed { deadline });
                }
            }
        }
        // Nothing transitions back into Pending; is_legal already refused
        BookingStatus::Pending => unreachable!("rejected by the transition table"),
    }

    let mut updated = booking.clone();
    updated.status = target;
    updated.updated_at = now;
    if target == BookingStatus::Cancelled {
        updated.cancelled_at = Some(now);
        updated.cancellation_reason = reason;
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingRequest;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use velora_catalog::{
        BookableResource, CapacityModel, FeeCalculator, ResourceKind, StayWindow,
    };

    const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    fn flight_booking(status: BookingStatus) -> Booking {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let departure = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let resource = BookableResource::new(
            ResourceKind::Flight,
            "LHR-GVA charter".to_string(),
            Decimal::from(2000),
            "USD".to_string(),
            CapacityModel::Seats { limit: 8 },
            created,
        );
        let window = StayWindow::Instant { at: departure };
        let request = BookingRequest {
            resource_id: resource.id,
            requester_id: "guest-1".to_string(),
            quantity: 2,
            window,
            add_ons: vec![],
            guests: vec![],
        };
        let quote = FeeCalculator::default().quote(&resource, 2, &window, &[]).unwrap();
        let mut booking =
            Booking::create(&resource, &request, &quote, "FLTEST0001".to_string(), created);
        booking.status = status;
        booking
    }

    fn far_from_departure() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_every_pair_outside_the_table_is_rejected() {
        let operator = Actor::operator("ops-1");
        for from in ALL {
            for to in ALL {
                let booking = flight_booking(from);
                let result = transition(&booking, to, &operator, far_from_departure(), None);
                if is_legal(from, to) {
                    assert!(result.is_ok(), "{from} -> {to} should be allowed");
                } else {
                    assert!(
                        matches!(result, Err(BookingError::InvalidTransition { .. })),
                        "{from} -> {to} should be InvalidTransition"
                    );
                }
            }
        }
    }

    #[test]
    fn test_terminal_states_admit_no_exit() {
        let operator = Actor::operator("ops-1");
        for from in [BookingStatus::Completed, BookingStatus::Cancelled] {
            for to in ALL {
                let booking = flight_booking(from);
                assert!(
                    transition(&booking, to, &operator, far_from_departure(), None).is_err(),
                    "{from} -> {to} must not succeed"
                );
            }
        }
    }

    #[test]
    fn test_confirm_requires_operator() {
        let booking = flight_booking(BookingStatus::Pending);

        let owner = Actor::customer("guest-1");
        assert!(matches!(
            transition(&booking, BookingStatus::Confirmed, &owner, far_from_departure(), None),
            Err(BookingError::Unauthorized(_))
        ));

        let operator = Actor::operator("ops-1");
        let confirmed = transition(
            &booking,
            BookingStatus::Confirmed,
            &operator,
            far_from_departure(),
            None,
        )
        .unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
    }

    #[test]
    fn test_owner_may_cancel_strangers_may_not() {
        let booking = flight_booking(BookingStatus::Confirmed);

        let stranger = Actor::customer("guest-2");
        assert!(matches!(
            transition(&booking, BookingStatus::Cancelled, &stranger, far_from_departure(), None),
            Err(BookingError::Unauthorized(_))
        ));

        let owner = Actor::customer("guest-1");
        let cancelled = transition(
            &booking,
            BookingStatus::Cancelled,
            &owner,
            far_from_departure(),
            Some("change of plans".to_string()),
        )
        .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("change of plans"));
        assert!(cancelled.cancelled_at.is_some());
    }

    #[test]
    fn test_late_cancellation_is_window_closed_not_invalid_transition() {
        let booking = flight_booking(BookingStatus::Confirmed);
        let owner = Actor::customer("guest-1");

        // 23 hours before a flight: the transition itself is legal, the
        // policy window is not
        let late = booking.window.start() - Duration::hours(23);
        assert!(matches!(
            transition(&booking, BookingStatus::Cancelled, &owner, late, None),
            Err(BookingError::CancellationWindowClosed { .. })
        ));
    }
}
