//! Combined Bollinger + RSI market reading

use super::bollinger::{bollinger, BandReading, BOLLINGER_STD_DEV, BOLLINGER_WINDOW};
use super::rsi::{rsi, RsiReading, RSI_PERIOD};
use super::Zone;
use crate::venue::Candle;
use serde::Serialize;
use std::fmt;

/// Overall verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// Both indicators read overbought
    Sell,
    /// Both indicators read oversold
    Buy,
    /// Indicators disagree or read neutral
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketAnalysis {
    pub bands: Option<BandReading>,
    pub rsi: Option<RsiReading>,
    pub verdict: Verdict,
}

/// Run both indicators over the candle closes
pub fn analyze(candles: &[Candle]) -> MarketAnalysis {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    analyze_closes(&closes)
}

pub fn analyze_closes(closes: &[f64]) -> MarketAnalysis {
    let bands = bollinger(closes, BOLLINGER_WINDOW, BOLLINGER_STD_DEV);
    let rsi = rsi(closes, RSI_PERIOD).map(RsiReading::new);

    let verdict = match (bands.map(|b| b.zone), rsi.map(|r| r.zone)) {
        (Some(Zone::Overbought), Some(Zone::Overbought)) => Verdict::Sell,
        (Some(Zone::Oversold), Some(Zone::Oversold)) => Verdict::Buy,
        _ => Verdict::Neutral,
    };

    MarketAnalysis {
        bands,
        rsi,
        verdict,
    }
}

fn band_text(bands: &Option<BandReading>) -> String {
    match bands {
        Some(b) => match b.zone {
            Zone::Overbought => format!("Price above upper band {:.2} (overbought)", b.upper),
            Zone::Oversold => format!("Price below lower band {:.2} (oversold)", b.lower),
            Zone::Neutral => format!("Price within bands {:.2} - {:.2}", b.lower, b.upper),
        },
        None => "Bollinger Bands unavailable (not enough data)".to_string(),
    }
}

fn rsi_text(rsi: &Option<RsiReading>) -> String {
    match rsi {
        Some(r) => format!("RSI = {:.2} ({})", r.value, r.zone),
        None => "RSI unavailable".to_string(),
    }
}

impl fmt::Display for MarketAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details = format!("{}, {}", band_text(&self.bands), rsi_text(&self.rsi));
        match self.verdict {
            Verdict::Sell => write!(f, "Sell signal! {details}"),
            Verdict::Buy => write!(f, "Buy signal! {details}"),
            Verdict::Neutral => f.write_str(&details),
        }
    }
}
