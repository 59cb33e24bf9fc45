//! Relative Strength Index

use super::Zone;
use serde::Serialize;

/// Default lookback
pub const RSI_PERIOD: usize = 14;

/// Above this the market reads overbought
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// Below this the market reads oversold
pub const RSI_OVERSOLD: f64 = 30.0;

/// RSI value with its classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RsiReading {
    pub value: f64,
    pub zone: Zone,
}

impl RsiReading {
    pub fn new(value: f64) -> Self {
        let zone = if value > RSI_OVERBOUGHT {
            Zone::Overbought
        } else if value < RSI_OVERSOLD {
            Zone::Oversold
        } else {
            Zone::Neutral
        };
        Self { value, zone }
    }
}

/// RSI of the last close using simple rolling means of gains and losses
/// over `period` price changes.
///
/// Returns `None` with fewer than `period + 1` closes, or when the window
/// has neither gains nor losses.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let window = &closes[closes.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(gains, losses), delta| {
            if delta > 0.0 {
                (gains + delta, losses)
            } else {
                (gains, losses - delta)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return (avg_gain > 0.0).then_some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_enough_data() {
        let closes: Vec<f64> = (0..14).map(f64::from).collect();
        assert!(rsi(&closes, 14).is_none());
    }

    #[test]
    fn test_only_gains_is_100() {
        let closes: Vec<f64> = (0..15).map(f64::from).collect();
        assert_eq!(rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn test_only_losses_is_0() {
        let closes: Vec<f64> = (0..15).rev().map(f64::from).collect();
        assert_eq!(rsi(&closes, 14), Some(0.0));
    }

    #[test]
    fn test_flat_is_undefined() {
        assert!(rsi(&[5.0; 20], 14).is_none());
    }

    #[test]
    fn test_balanced_moves_are_50() {
        // alternating +1 / -1
        let closes: Vec<f64> = (0..15).map(|i| if i % 2 == 0 { 10.0 } else { 11.0 }).collect();
        let value = rsi(&closes, 14).unwrap();
        assert!((value - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_last_window_counts() {
        // an old crash outside the window does not matter
        let mut closes = vec![100.0, 1.0];
        closes.extend((0..15).map(|i| 10.0 + i as f64));
        assert_eq!(rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn test_zones() {
        assert_eq!(RsiReading::new(75.0).zone, Zone::Overbought);
        assert_eq!(RsiReading::new(25.0).zone, Zone::Oversold);
        assert_eq!(RsiReading::new(70.0).zone, Zone::Neutral);
        assert_eq!(RsiReading::new(30.0).zone, Zone::Neutral);
    }
}
