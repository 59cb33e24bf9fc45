use super::build_venue;
use crate::config::{Config, Secrets};
use clap::Args;

#[derive(Args, Debug)]
pub struct PriceArgs {
    /// Symbol to quote; defaults to the configured one
    pub symbol: Option<String>,
}

impl PriceArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let venue = build_venue(&config, &Secrets::from_env()).await?;
        let symbol = self
            .symbol
            .as_deref()
            .unwrap_or(&config.feed.symbol)
            .to_uppercase();

        let price = venue.price(&symbol).await?;
        println!("{symbol}: {price}");
        Ok(())
    }
}
