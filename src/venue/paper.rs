//! Paper trading venue

use super::{Candle, OrderResult, Side, TradingVenue, VenueError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct PaperBook {
    mark_price: Option<Decimal>,
    balances: HashMap<String, Decimal>,
    fills: Vec<OrderResult>,
    candles: Vec<Candle>,
}

/// Paper venue with simulated immediate fills at the limit price.
///
/// Balances move on every fill; fees are charged in the quote asset.
/// With a market source attached, prices and candles come from it.
#[derive(Clone)]
pub struct PaperVenue {
    base_asset: String,
    quote_asset: String,
    fee_rate: Decimal,
    book: Arc<RwLock<PaperBook>>,
    market: Option<Arc<dyn TradingVenue>>,
}

impl PaperVenue {
    /// Create a new paper venue for `base`/`quote`
    pub fn new(base_asset: impl Into<String>, quote_asset: impl Into<String>, fee_rate: Decimal) -> Self {
        Self {
            base_asset: base_asset.into(),
            quote_asset: quote_asset.into(),
            fee_rate,
            book: Arc::new(RwLock::new(PaperBook::default())),
            market: None,
        }
    }

    /// Read prices and candles from a real venue; orders stay simulated
    pub fn with_market(mut self, market: Arc<dyn TradingVenue>) -> Self {
        self.market = Some(market);
        self
    }

    /// Seed a free balance
    pub async fn set_balance(&self, asset: &str, amount: Decimal) {
        self.book
            .write()
            .await
            .balances
            .insert(asset.to_string(), amount);
    }

    /// Update the mark price used by `price` and `sell`
    pub async fn set_price(&self, price: Decimal) {
        self.book.write().await.mark_price = Some(price);
    }

    /// Replace the candle history returned by `candles`
    pub async fn set_candles(&self, candles: Vec<Candle>) {
        self.book.write().await.candles = candles;
    }

    /// Every simulated fill so far
    pub async fn fills(&self) -> Vec<OrderResult> {
        self.book.read().await.fills.clone()
    }

    fn symbol(&self) -> String {
        format!("{}{}", self.base_asset, self.quote_asset)
    }
}

#[async_trait]
impl TradingVenue for PaperVenue {
    async fn price(&self, symbol: &str) -> Result<Decimal, VenueError> {
        if let Some(market) = &self.market {
            let price = market.price(symbol).await?;
            self.book.write().await.mark_price = Some(price);
            return Ok(price);
        }
        self.book
            .read()
            .await
            .mark_price
            .ok_or_else(|| VenueError::Decode("no mark price yet".to_string()))
    }

    async fn balance(&self, asset: &str) -> Result<Decimal, VenueError> {
        Ok(self
            .book
            .read()
            .await
            .balances
            .get(asset)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn place_limit(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderResult, VenueError> {
        if symbol != self.symbol() {
            return Err(VenueError::InvalidOrder(format!(
                "paper venue trades {} only",
                self.symbol()
            )));
        }
        if quantity <= Decimal::ZERO || price <= Decimal::ZERO {
            return Err(VenueError::InvalidOrder(
                "quantity and price must be positive".to_string(),
            ));
        }

        let notional = quantity * price;
        let fees = notional * self.fee_rate;
        let mut book = self.book.write().await;

        let (debit_asset, debit, credit_asset, credit) = match side {
            Side::Buy => (&self.quote_asset, notional + fees, &self.base_asset, quantity),
            Side::Sell => (&self.base_asset, quantity, &self.quote_asset, notional - fees),
        };

        let available = book.balances.get(debit_asset).copied().unwrap_or(Decimal::ZERO);
        if available < debit {
            return Err(VenueError::InsufficientBalance {
                asset: debit_asset.clone(),
                available,
                required: debit,
            });
        }
        book.balances.insert(debit_asset.clone(), available - debit);
        *book.balances.entry(credit_asset.clone()).or_insert(Decimal::ZERO) += credit;

        let fill = OrderResult {
            order_id: Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            side,
            price,
            quantity,
            status: "FILLED".to_string(),
        };
        book.fills.push(fill.clone());

        tracing::info!(order_id = %fill.order_id, %side, %quantity, %price, "Paper order filled");
        Ok(fill)
    }

    async fn open_orders(&self, _symbol: &str) -> Result<Vec<OrderResult>, VenueError> {
        // fills are immediate, nothing ever rests
        Ok(vec![])
    }

    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
    ) -> Result<Vec<Candle>, VenueError> {
        if let Some(market) = &self.market {
            return market.candles(symbol, interval, limit).await;
        }
        let book = self.book.read().await;
        let skip = book.candles.len().saturating_sub(limit as usize);
        Ok(book.candles[skip..].to_vec())
    }
}
