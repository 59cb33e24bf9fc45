//! Command argument parsing

use crate::venue::sizing::PERCENT_STEPS;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ArgsError {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("{0} must be positive")]
    NotPositive(&'static str),
    #[error("percent must be one of 25, 50, 75, 100 (got {0})")]
    Percent(String),
    #[error("unexpected argument '{0}'")]
    Unexpected(String),
}

/// `/buy` and `/sell` arguments
#[derive(Debug, Clone, PartialEq)]
pub struct OrderArgs {
    pub percent: u32,
    /// Limit price; current price when absent
    pub price: Option<Decimal>,
}

/// `/autosell` arguments
#[derive(Debug, Clone, PartialEq)]
pub struct AutosellArgs {
    pub target: Decimal,
    /// Overrides the configured sell quantity
    pub quantity: Option<Decimal>,
}

fn positive(raw: &str, what: &'static str) -> Result<Decimal, ArgsError> {
    let value = Decimal::from_str(raw.trim().replace(',', ".").as_str())
        .map_err(|_| ArgsError::NotANumber(raw.to_string()))?;
    if value <= Decimal::ZERO {
        return Err(ArgsError::NotPositive(what));
    }
    Ok(value)
}

fn percent(raw: &str) -> Result<u32, ArgsError> {
    raw.trim_end_matches('%')
        .parse::<u32>()
        .ok()
        .filter(|p| PERCENT_STEPS.contains(p))
        .ok_or_else(|| ArgsError::Percent(raw.to_string()))
}

pub fn parse_order_args(input: &str) -> Result<OrderArgs, ArgsError> {
    let mut parts = input.split_whitespace();
    let percent = percent(parts.next().ok_or(ArgsError::Missing("percent"))?)?;
    let price = parts.next().map(|p| positive(p, "price")).transpose()?;
    if let Some(extra) = parts.next() {
        return Err(ArgsError::Unexpected(extra.to_string()));
    }
    Ok(OrderArgs { percent, price })
}

pub fn parse_autosell_args(input: &str) -> Result<AutosellArgs, ArgsError> {
    let mut parts = input.split_whitespace();
    let target = positive(parts.next().ok_or(ArgsError::Missing("target price"))?, "target price")?;
    let quantity = parts.next().map(|q| positive(q, "quantity")).transpose()?;
    if let Some(extra) = parts.next() {
        return Err(ArgsError::Unexpected(extra.to_string()));
    }
    Ok(AutosellArgs { target, quantity })
}

/// Optional count, clamped to `1..=max`
pub fn parse_count(input: &str, default: usize, max: usize) -> usize {
    input
        .trim()
        .parse::<usize>()
        .map(|n| n.clamp(1, max))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_args() {
        assert_eq!(
            parse_order_args("50").unwrap(),
            OrderArgs {
                percent: 50,
                price: None
            }
        );
        assert_eq!(
            parse_order_args("25% 49000.5").unwrap(),
            OrderArgs {
                percent: 25,
                price: Some(dec!(49000.5))
            }
        );
    }

    #[test]
    fn test_order_args_errors() {
        assert_eq!(parse_order_args(""), Err(ArgsError::Missing("percent")));
        assert_eq!(parse_order_args("30"), Err(ArgsError::Percent("30".into())));
        assert_eq!(
            parse_order_args("50 abc"),
            Err(ArgsError::NotANumber("abc".into()))
        );
        assert_eq!(parse_order_args("50 -1"), Err(ArgsError::NotPositive("price")));
        assert_eq!(
            parse_order_args("50 1 2"),
            Err(ArgsError::Unexpected("2".into()))
        );
    }

    #[test]
    fn test_autosell_args() {
        let args = parse_autosell_args("50000").unwrap();
        assert_eq!(args.target, dec!(50000));
        assert!(args.quantity.is_none());

        let args = parse_autosell_args(" 50000,5  0.001 ").unwrap();
        assert_eq!(args.target, dec!(50000.5));
        assert_eq!(args.quantity, Some(dec!(0.001)));
    }

    #[test]
    fn test_autosell_rejects_non_positive_target() {
        assert_eq!(
            parse_autosell_args("0"),
            Err(ArgsError::NotPositive("target price"))
        );
        assert_eq!(
            parse_autosell_args(""),
            Err(ArgsError::Missing("target price"))
        );
    }

    #[test]
    fn test_count() {
        assert_eq!(parse_count("", 10, 50), 10);
        assert_eq!(parse_count("5", 10, 50), 5);
        assert_eq!(parse_count("500", 10, 50), 50);
        assert_eq!(parse_count("0", 10, 50), 1);
    }
}
