use crate::resource::{BookableResource, ResourceKind, StayWindow, WindowError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use velora_shared::money::round_money;

/// A chargeable extra attached to a booking (catering, transfers, crew)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddOn {
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

/// Priced components of a booking. `total` is always the sum of the three
/// parts; nothing is stored pre-summed without them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub base: Decimal,
    pub service_fee: Decimal,
    pub additional_fees: Decimal,
    pub total: Decimal,
    pub currency: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("window does not fit the resource kind: {0}")]
    InvalidWindow(#[from] WindowError),
}

/// Deterministic fee calculator.
///
/// Pure over its inputs: the same (resource, quantity, window, add-ons)
/// always produces the same quote. All arithmetic is decimal; the service
/// fee is the only value that gets rounded.
#[derive(Debug, Clone)]
pub struct FeeCalculator {
    service_fee_rate: Decimal,
}

impl FeeCalculator {
    pub fn new(service_fee_rate: Decimal) -> Self {
        Self { service_fee_rate }
    }

    /// Platform fee expressed in basis points (300 = 3%).
    pub fn from_basis_points(bps: u32) -> Self {
        Self::new(Decimal::new(bps as i64, 4))
    }

    pub fn quote(
        &self,
        resource: &BookableResource,
        quantity: u32,
        window: &StayWindow,
        add_ons: &[AddOn],
    ) -> Result<Quote, PricingError> {
        window.validate_for(resource.kind)?;

        let base = if resource.kind.is_seat_based() {
            resource.unit_price * Decimal::from(quantity)
        } else {
            resource.unit_price * Decimal::from(duration_units(resource.kind, window))
        };

        let service_fee = round_money(base * self.service_fee_rate);

        let additional_fees: Decimal = add_ons
            .iter()
            .map(|a| a.price * Decimal::from(a.quantity))
            .sum();

        let total = base + service_fee + additional_fees;

        Ok(Quote {
            base,
            service_fee,
            additional_fees,
            total,
            currency: resource.currency.clone(),
        })
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::from_basis_points(300)
    }
}

/// Billable units for a range window: hours for cars, nights for hotel
/// rooms, days for yachts. Partial units bill as whole ones.
fn duration_units(kind: ResourceKind, window: &StayWindow) -> u32 {
    let minutes = (window.end() - window.start()).num_minutes().max(0);
    let unit_minutes: i64 = match kind {
        ResourceKind::Car => 60,
        ResourceKind::HotelRoom | ResourceKind::Yacht => 24 * 60,
        // Seat-based kinds never reach here
        ResourceKind::Flight => 1,
    };
    ((minutes as u64).div_ceil(unit_minutes as u64)).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::CapacityModel;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn resource(kind: ResourceKind, price: &str, capacity: CapacityModel) -> BookableResource {
        BookableResource::new(
            kind,
            "test resource".to_string(),
            Decimal::from_str(price).unwrap(),
            "USD".to_string(),
            capacity,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    fn range(start_day: u32, start_hour: u32, end_day: u32, end_hour: u32) -> StayWindow {
        StayWindow::Range {
            start: Utc.with_ymd_and_hms(2024, 3, start_day, start_hour, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, end_day, end_hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_seat_quote_with_three_percent_fee() {
        let flight = resource(ResourceKind::Flight, "1000.00", CapacityModel::Seats { limit: 8 });
        let window = StayWindow::Instant {
            at: Utc.with_ymd_and_hms(2024, 3, 20, 9, 0, 0).unwrap(),
        };

        let quote = FeeCalculator::default().quote(&flight, 6, &window, &[]).unwrap();
        assert_eq!(quote.base, Decimal::from_str("6000.00").unwrap());
        assert_eq!(quote.service_fee, Decimal::from_str("180.00").unwrap());
        assert_eq!(quote.additional_fees, Decimal::ZERO);
        assert_eq!(quote.total, Decimal::from_str("6180.00").unwrap());
    }

    #[test]
    fn test_fee_rounds_half_up() {
        let flight = resource(ResourceKind::Flight, "100.50", CapacityModel::Seats { limit: 8 });
        let window = StayWindow::Instant {
            at: Utc.with_ymd_and_hms(2024, 3, 20, 9, 0, 0).unwrap(),
        };

        // 100.50 * 0.03 = 3.015 -> 3.02
        let quote = FeeCalculator::default().quote(&flight, 1, &window, &[]).unwrap();
        assert_eq!(quote.service_fee, Decimal::from_str("3.02").unwrap());
    }

    #[test]
    fn test_hotel_bills_by_night() {
        let room = resource(ResourceKind::HotelRoom, "850.00", CapacityModel::ExclusiveWindow);
        // Check-in the 10th at 14:00, checkout the 12th at 10:00: two nights
        let quote = FeeCalculator::default()
            .quote(&room, 2, &range(10, 14, 12, 10), &[])
            .unwrap();
        assert_eq!(quote.base, Decimal::from_str("1700.00").unwrap());
    }

    #[test]
    fn test_car_bills_by_hour_rounding_up() {
        let car = resource(ResourceKind::Car, "40.00", CapacityModel::ExclusiveWindow);
        let window = StayWindow::Range {
            start: Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, 10, 11, 30, 0).unwrap(),
        };

        // 2.5 hours bill as 3
        let quote = FeeCalculator::default().quote(&car, 1, &window, &[]).unwrap();
        assert_eq!(quote.base, Decimal::from_str("120.00").unwrap());
    }

    #[test]
    fn test_yacht_bills_by_day() {
        let yacht = resource(ResourceKind::Yacht, "12000.00", CapacityModel::ExclusiveWindow);
        let quote = FeeCalculator::default()
            .quote(&yacht, 6, &range(10, 8, 13, 8), &[])
            .unwrap();
        assert_eq!(quote.base, Decimal::from_str("36000.00").unwrap());
    }

    #[test]
    fn test_add_ons_summed_into_total() {
        let yacht = resource(ResourceKind::Yacht, "10000.00", CapacityModel::ExclusiveWindow);
        let add_ons = vec![
            AddOn {
                name: "Catering".to_string(),
                price: Decimal::from_str("450.00").unwrap(),
                quantity: 2,
            },
            AddOn {
                name: "Helicopter transfer".to_string(),
                price: Decimal::from_str("1200.00").unwrap(),
                quantity: 1,
            },
        ];

        let quote = FeeCalculator::default()
            .quote(&yacht, 4, &range(10, 8, 11, 8), &add_ons)
            .unwrap();
        assert_eq!(quote.additional_fees, Decimal::from_str("2100.00").unwrap());
        assert_eq!(quote.total, quote.base + quote.service_fee + quote.additional_fees);
    }

    #[test]
    fn test_quote_is_deterministic() {
        let room = resource(ResourceKind::HotelRoom, "999.99", CapacityModel::ExclusiveWindow);
        let window = range(10, 14, 12, 10);
        let calculator = FeeCalculator::default();

        let first = calculator.quote(&room, 2, &window, &[]).unwrap();
        let second = calculator.quote(&room, 2, &window, &[]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mismatched_window_rejected() {
        let room = resource(ResourceKind::HotelRoom, "850.00", CapacityModel::ExclusiveWindow);
        let window = StayWindow::Instant {
            at: Utc.with_ymd_and_hms(2024, 3, 20, 9, 0, 0).unwrap(),
        };
        assert!(FeeCalculator::default().quote(&room, 1, &window, &[]).is_err());
    }
}
