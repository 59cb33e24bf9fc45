//! Bollinger Bands

use super::Zone;
use serde::Serialize;

pub const BOLLINGER_WINDOW: usize = 20;
pub const BOLLINGER_STD_DEV: f64 = 2.0;

/// Bands over the last window and where the last close sits
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandReading {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub close: f64,
    /// Above the upper band reads overbought, below the lower oversold
    pub zone: Zone,
}

/// Bands over the last `window` closes: mean ± `std_dev` sample standard
/// deviations.
pub fn bollinger(closes: &[f64], window: usize, std_dev: f64) -> Option<BandReading> {
    if window < 2 || closes.len() < window {
        return None;
    }

    let recent = &closes[closes.len() - window..];
    let n = window as f64;
    let middle = recent.iter().sum::<f64>() / n;
    let variance = recent.iter().map(|c| (c - middle).powi(2)).sum::<f64>() / (n - 1.0);
    let width = variance.sqrt() * std_dev;

    let upper = middle + width;
    let lower = middle - width;
    let close = *recent.last()?;

    let zone = if close > upper {
        Zone::Overbought
    } else if close < lower {
        Zone::Oversold
    } else {
        Zone::Neutral
    };

    Some(BandReading {
        upper,
        middle,
        lower,
        close,
        zone,
    })
}
