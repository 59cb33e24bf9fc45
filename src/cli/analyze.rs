//! One-shot indicator readings

use super::build_venue;
use crate::config::{Config, Secrets};
use crate::indicators::{analyze, crash_reading};
use clap::Args;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Candle interval
    #[arg(short, long, default_value = "15m")]
    pub interval: String,

    /// Number of candles to fetch
    #[arg(short, long, default_value_t = 50)]
    pub limit: u16,
}

impl AnalyzeArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let venue = build_venue(&config, &Secrets::from_env()).await?;
        let symbol = config.feed.symbol.to_uppercase();
        let candles = venue.candles(&symbol, &self.interval, self.limit).await?;

        println!("{} {} x{}", symbol, self.interval, candles.len());
        println!("{}", analyze(&candles));

        let params = config.alerts.crash_params();
        match crash_reading(&candles, &params) {
            Some(r) => println!(
                "Crash check: {:+.2}% over {} candles, volume {:.2} vs {} -> {}",
                r.price_change_pct,
                params.period,
                r.avg_volume_after,
                r.avg_volume_before
                    .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}")),
                if r.detected { "REVERSAL" } else { "none" }
            ),
            None => println!("Crash check: not enough data"),
        }
        Ok(())
    }
}
