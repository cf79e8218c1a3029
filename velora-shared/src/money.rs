use rust_decimal::{Decimal, RoundingStrategy};

/// Settlement currency applied when a resource does not specify one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Round a monetary amount to two decimal places, half-up.
///
/// Fees are rounded exactly once, at the point they are computed;
/// intermediate sums stay unrounded.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_rounds_half_up() {
        let amount = Decimal::from_str("10.005").unwrap();
        assert_eq!(round_money(amount), Decimal::from_str("10.01").unwrap());

        let amount = Decimal::from_str("10.004").unwrap();
        assert_eq!(round_money(amount), Decimal::from_str("10.00").unwrap());
    }

    #[test]
    fn test_already_scaled_amounts_unchanged() {
        let amount = Decimal::from_str("1234.56").unwrap();
        assert_eq!(round_money(amount), amount);
    }
}
