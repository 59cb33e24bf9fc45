//! Percentage-of-balance order sizing

use super::{Side, VenueError};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Percent steps offered to the operator
pub const PERCENT_STEPS: [u32; 4] = [25, 50, 75, 100];

/// Base quantities are floored to this many decimal places
pub const QUANTITY_DP: u32 = 5;

/// Minimum free quote balance required before offering a buy
pub const MIN_QUOTE_BALANCE: Decimal = dec!(10);

/// Minimum free base balance required before offering a sell
pub const MIN_BASE_BALANCE: Decimal = dec!(0.0001);

/// A sized order ready to be placed
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    pub side: Side,
    pub percent: u32,
    /// Base quantity
    pub quantity: Decimal,
    /// Limit price
    pub price: Decimal,
    /// Quote value of the order
    pub notional: Decimal,
}

fn floor_quantity(quantity: Decimal) -> Decimal {
    quantity.round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::ToZero)
}

fn check_percent(percent: u32) -> Result<(), VenueError> {
    if percent == 0 || percent > 100 {
        return Err(VenueError::InvalidOrder(format!(
            "percent must be between 1 and 100, got {percent}"
        )));
    }
    Ok(())
}

/// Size a buy spending `percent` of the free quote balance at `price`
pub fn plan_buy(
    quote_asset: &str,
    quote_balance: Decimal,
    price: Decimal,
    percent: u32,
) -> Result<OrderPlan, VenueError> {
    check_percent(percent)?;
    if price <= Decimal::ZERO {
        return Err(VenueError::InvalidOrder("price must be positive".to_string()));
    }
    if quote_balance < MIN_QUOTE_BALANCE {
        return Err(VenueError::InsufficientBalance {
            asset: quote_asset.to_string(),
            available: quote_balance,
            required: MIN_QUOTE_BALANCE,
        });
    }

    let spend = quote_balance * Decimal::from(percent) / dec!(100);
    let quantity = floor_quantity(spend / price);
    if quantity.is_zero() {
        return Err(VenueError::InvalidOrder(format!(
            "{percent}% of {quote_balance} {quote_asset} buys nothing at {price}"
        )));
    }

    Ok(OrderPlan {
        side: Side::Buy,
        percent,
        quantity,
        price,
        notional: quantity * price,
    })
}

/// Size a sell of `percent` of the free base balance at `price`
pub fn plan_sell(
    base_asset: &str,
    base_balance: Decimal,
    price: Decimal,
    percent: u32,
) -> Result<OrderPlan, VenueError> {
    check_percent(percent)?;
    if price <= Decimal::ZERO {
        return Err(VenueError::InvalidOrder("price must be positive".to_string()));
    }
    if base_balance < MIN_BASE_BALANCE {
        return Err(VenueError::InsufficientBalance {
            asset: base_asset.to_string(),
            available: base_balance,
            required: MIN_BASE_BALANCE,
        });
    }

    let quantity = floor_quantity(base_balance * Decimal::from(percent) / dec!(100));
    if quantity.is_zero() {
        return Err(VenueError::InvalidOrder(format!(
            "{percent}% of {base_balance} {base_asset} rounds to zero"
        )));
    }

    Ok(OrderPlan {
        side: Side::Sell,
        percent,
        quantity,
        price,
        notional: quantity * price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_quantity_floored() {
        let plan = plan_buy("USDT", dec!(1000), dec!(30000), 25).unwrap();
        // 250 / 30000 = 0.0083333.. -> 0.00833
        assert_eq!(plan.quantity, dec!(0.00833));
        assert_eq!(plan.notional, dec!(249.9));
        assert_eq!(plan.side, Side::Buy);
    }

    #[test]
    fn test_buy_requires_minimum_quote() {
        let err = plan_buy("USDT", dec!(9.99), dec!(30000), 100).unwrap_err();
        assert!(matches!(err, VenueError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_sell_full_balance() {
        let plan = plan_sell("BTC", dec!(0.0123456), dec!(50000), 100).unwrap();
        assert_eq!(plan.quantity, dec!(0.01234));
        assert_eq!(plan.notional, dec!(617));
    }

    #[test]
    fn test_sell_requires_minimum_base() {
        let err = plan_sell("BTC", dec!(0.00009), dec!(50000), 50).unwrap_err();
        assert!(matches!(err, VenueError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_sell_rounding_to_zero_rejected() {
        let err = plan_sell("BTC", dec!(0.0001), dec!(50000), 5).unwrap_err();
        assert!(matches!(err, VenueError::InvalidOrder(_)));
    }

    #[test]
    fn test_percent_bounds() {
        assert!(plan_buy("USDT", dec!(100), dec!(1), 0).is_err());
        assert!(plan_sell("BTC", dec!(1), dec!(1), 101).is_err());
        for percent in PERCENT_STEPS {
            assert!(plan_sell("BTC", dec!(1), dec!(1), percent).is_ok());
        }
    }
}
