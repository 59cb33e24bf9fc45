//! Crash-reversal detection
//!
//! A sharp drop over the last `period` candles accompanied by a volume
//! surge relative to the `period` candles before it.

use crate::venue::Candle;
use serde::{Deserialize, Serialize};

/// Detector parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrashParams {
    /// Minimum drop over the recent window, in percent
    pub drop_threshold_pct: f64,
    /// Candles in the recent window
    pub period: usize,
    /// Required ratio of recent to prior average volume
    pub volume_multiplier: f64,
}

impl Default for CrashParams {
    fn default() -> Self {
        Self {
            drop_threshold_pct: 5.0,
            period: 10,
            volume_multiplier: 1.5,
        }
    }
}

/// What the detector measured
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrashReading {
    /// Close-to-close change over the recent window, in percent
    pub price_change_pct: f64,
    pub avg_volume_before: Option<f64>,
    pub avg_volume_after: f64,
    pub detected: bool,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Measure the last `params.period` candles (oldest first)
pub fn crash_reading(candles: &[Candle], params: &CrashParams) -> Option<CrashReading> {
    if params.period == 0 || candles.is_empty() {
        return None;
    }

    let split = candles.len().saturating_sub(params.period);
    let recent = &candles[split..];
    let prior = &candles[split.saturating_sub(params.period)..split];

    let first = recent.first()?.close;
    let last = recent.last()?.close;
    if first <= 0.0 {
        return None;
    }

    let price_change_pct = (last - first) / first * 100.0;
    let avg_volume_before = mean(prior.iter().map(|c| c.volume));
    let avg_volume_after = mean(recent.iter().map(|c| c.volume))?;

    let detected = price_change_pct < -params.drop_threshold_pct
        && avg_volume_before
            .is_some_and(|before| avg_volume_after > before * params.volume_multiplier);

    Some(CrashReading {
        price_change_pct,
        avg_volume_before,
        avg_volume_after,
        detected,
    })
}

/// Whether the candles show a crash followed by a volume surge
pub fn detect_crash_reversal(candles: &[Candle], params: &CrashParams) -> bool {
    crash_reading(candles, params).is_some_and(|r| r.detected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(minute: i64, close: f64, volume: f64) -> Candle {
        Candle {
            open_time: Utc.timestamp_opt(minute * 60, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    /// 10 calm candles then 10 falling ones
    fn series(drop_to: f64, recent_volume: f64) -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..10).map(|i| candle(i, 100.0, 10.0)).collect();
        for i in 0..10 {
            let close = 100.0 - (100.0 - drop_to) * i as f64 / 9.0;
            candles.push(candle(10 + i, close, recent_volume));
        }
        candles
    }

    #[test]
    fn test_crash_with_volume_surge_detected() {
        let candles = series(90.0, 20.0);
        assert!(detect_crash_reversal(&candles, &CrashParams::default()));

        let reading = crash_reading(&candles, &CrashParams::default()).unwrap();
        assert!((reading.price_change_pct + 10.0).abs() < 1e-9);
        assert_eq!(reading.avg_volume_before, Some(10.0));
    }

    #[test]
    fn test_crash_without_volume_ignored() {
        let candles = series(90.0, 12.0);
        assert!(!detect_crash_reversal(&candles, &CrashParams::default()));
    }

    #[test]
    fn test_small_drop_ignored() {
        let candles = series(97.0, 50.0);
        assert!(!detect_crash_reversal(&candles, &CrashParams::default()));

        let sensitive = CrashParams {
            drop_threshold_pct: 1.0,
            ..CrashParams::default()
        };
        assert!(detect_crash_reversal(&candles, &sensitive));
    }

    #[test]
    fn test_no_prior_window_never_detects() {
        let candles: Vec<Candle> = (0..10)
            .map(|i| candle(i, 100.0 - i as f64 * 2.0, 100.0))
            .collect();
        assert!(!detect_crash_reversal(&candles, &CrashParams::default()));
    }

    #[test]
    fn test_empty_input() {
        assert!(crash_reading(&[], &CrashParams::default()).is_none());
    }
}
