//! Technical indicators over candle history
//!
//! All math runs on `f64` closes and volumes.

mod analysis;
mod bollinger;
mod crash;
mod rsi;

pub use analysis::{analyze, analyze_closes, MarketAnalysis, Verdict};
pub use bollinger::{bollinger, BandReading, BOLLINGER_STD_DEV, BOLLINGER_WINDOW};
pub use crash::{crash_reading, detect_crash_reversal, CrashParams, CrashReading};
pub use rsi::{rsi, RsiReading, RSI_OVERBOUGHT, RSI_OVERSOLD, RSI_PERIOD};

use serde::Serialize;
use std::fmt;

/// Indicator classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Zone {
    Overbought,
    Oversold,
    Neutral,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Overbought => f.write_str("overbought"),
            Zone::Oversold => f.write_str("oversold"),
            Zone::Neutral => f.write_str("neutral"),
        }
    }
}
