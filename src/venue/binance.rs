//! Binance spot REST client
//!
//! Public market-data endpoints plus HMAC-SHA256 signed account and order
//! endpoints (`X-MBX-APIKEY` header, `signature` appended to the query).

use super::{Candle, OrderResult, Side, TradingVenue, VenueError};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::str::FromStr;
use std::time::Duration;

/// Binance spot REST base URL
pub const BINANCE_API_URL: &str = "https://api.binance.com";

type HmacSha256 = Hmac<Sha256>;

/// Configuration for the Binance REST client
#[derive(Debug, Clone)]
pub struct BinanceVenueConfig {
    /// Base URL for the REST API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// `recvWindow` sent with signed requests (milliseconds)
    pub recv_window_ms: u64,
}

impl Default for BinanceVenueConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            recv_window_ms: 5000,
        }
    }
}

/// API key pair for signed endpoints
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    balances: Vec<AssetBalance>,
}

#[derive(Debug, Deserialize)]
struct AssetBalance {
    asset: String,
    free: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    symbol: String,
    #[serde(rename = "orderId")]
    order_id: u64,
    price: String,
    #[serde(rename = "origQty")]
    orig_qty: String,
    status: String,
    side: Side,
}

impl OrderResponse {
    fn into_result(self) -> Result<OrderResult, VenueError> {
        Ok(OrderResult {
            order_id: self.order_id.to_string(),
            price: parse_decimal("price", &self.price)?,
            quantity: parse_decimal("origQty", &self.orig_qty)?,
            symbol: self.symbol,
            side: self.side,
            status: self.status,
        })
    }
}

/// Binance spot venue
pub struct BinanceVenue {
    config: BinanceVenueConfig,
    credentials: Option<Credentials>,
    client: Client,
}

impl BinanceVenue {
    /// Create a client. Without credentials only public endpoints work.
    pub fn new(
        config: BinanceVenueConfig,
        credentials: Option<Credentials>,
    ) -> Result<Self, VenueError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            config,
            credentials,
            client,
        })
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, VenueError> {
        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!(%url, "Binance public request");
        let response = self.client.get(&url).query(query).send().await?;
        Self::decode(response).await
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, VenueError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(VenueError::MissingCredentials)?;

        let mut query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        query.push(format!("recvWindow={}", self.config.recv_window_ms));
        query.push(format!("timestamp={}", Utc::now().timestamp_millis()));
        let query = query.join("&");
        let signature = sign(&credentials.api_secret, &query)?;

        let url = format!(
            "{}{}?{}&signature={}",
            self.config.base_url, path, query, signature
        );
        tracing::debug!(%method, %path, "Binance signed request");

        let response = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", &credentials.api_key)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, VenueError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(err) => VenueError::Api {
                    code: err.code,
                    msg: err.msg,
                },
                Err(_) => VenueError::Decode(format!("{status}: {body}")),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TradingVenue for BinanceVenue {
    async fn price(&self, symbol: &str) -> Result<Decimal, VenueError> {
        let ticker: TickerPrice = self
            .get_public("/api/v3/ticker/price", &[("symbol", symbol.to_string())])
            .await?;
        parse_decimal("price", &ticker.price)
    }

    async fn balance(&self, asset: &str) -> Result<Decimal, VenueError> {
        let account: AccountInfo = self.send_signed(Method::GET, "/api/v3/account", &[]).await?;
        match account.balances.iter().find(|b| b.asset == asset) {
            Some(balance) => parse_decimal("free", &balance.free),
            None => Ok(Decimal::ZERO),
        }
    }

    async fn place_limit(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderResult, VenueError> {
        if quantity <= Decimal::ZERO || price <= Decimal::ZERO {
            return Err(VenueError::InvalidOrder(
                "quantity and price must be positive".to_string(),
            ));
        }

        let params = [
            ("symbol", symbol.to_string()),
            ("side", side.as_str().to_string()),
            ("type", "LIMIT".to_string()),
            ("timeInForce", "GTC".to_string()),
            ("quantity", quantity.normalize().to_string()),
            ("price", price.normalize().to_string()),
        ];
        let response: OrderResponse = self
            .send_signed(Method::POST, "/api/v3/order", &params)
            .await?;
        let order = response.into_result()?;

        tracing::info!(order_id = %order.order_id, %side, %quantity, %price, "Order placed");
        Ok(order)
    }

    async fn open_orders(&self, symbol: &str) -> Result<Vec<OrderResult>, VenueError> {
        let orders: Vec<OrderResponse> = self
            .send_signed(
                Method::GET,
                "/api/v3/openOrders",
                &[("symbol", symbol.to_string())],
            )
            .await?;
        orders.into_iter().map(OrderResponse::into_result).collect()
    }

    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
    ) -> Result<Vec<Candle>, VenueError> {
        let rows: Vec<Vec<serde_json::Value>> = self
            .get_public(
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        rows.iter().map(|row| parse_kline(row)).collect()
    }
}

/// Hex-encoded HMAC-SHA256 of `payload`
fn sign(secret: &str, payload: &str) -> Result<String, VenueError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| VenueError::Decode(format!("invalid API secret: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, VenueError> {
    Decimal::from_str(raw).map_err(|e| VenueError::Decode(format!("{field}={raw:?}: {e}")))
}

/// Kline rows are positional: open time, open, high, low, close, volume, ...
fn parse_kline(row: &[serde_json::Value]) -> Result<Candle, VenueError> {
    let number = |idx: usize| -> Result<f64, VenueError> {
        row.get(idx)
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| VenueError::Decode(format!("kline field {idx} missing or invalid")))
    };
    let open_ms = row
        .first()
        .and_then(|v| v.as_i64())
        .ok_or_else(|| VenueError::Decode("kline open time missing".to_string()))?;
    let open_time = Utc
        .timestamp_millis_opt(open_ms)
        .single()
        .ok_or_else(|| VenueError::Decode(format!("kline open time {open_ms} out of range")))?;

    Ok(Candle {
        open_time,
        open: number(1)?,
        high: number(2)?,
        low: number(3)?,
        close: number(4)?,
        volume: number(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signature_matches_reference_vector() {
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            sign(secret, query).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_parse_kline_row() {
        let row = vec![
            json!(1499040000000i64),
            json!("0.01634790"),
            json!("0.80000000"),
            json!("0.01575800"),
            json!("0.01577100"),
            json!("148976.11427815"),
            json!(1499644799999i64),
        ];
        let candle = parse_kline(&row).unwrap();
        assert_eq!(candle.open_time.timestamp_millis(), 1499040000000);
        assert_eq!(candle.close, 0.015771);
        assert_eq!(candle.volume, 148976.11427815);
    }

    #[test]
    fn test_parse_kline_rejects_short_row() {
        let row = vec![json!(1499040000000i64), json!("1.0")];
        assert!(matches!(parse_kline(&row), Err(VenueError::Decode(_))));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials {
            api_key: "key".into(),
            api_secret: "secret".into(),
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("secret\""));
        assert!(debug.contains("redacted"));
    }

    #[tokio::test]
    async fn test_signed_call_without_credentials() {
        let venue = BinanceVenue::new(BinanceVenueConfig::default(), None).unwrap();
        assert!(matches!(
            venue.balance("USDT").await,
            Err(VenueError::MissingCredentials)
        ));
    }
}
