//! WebSocket client library
//!
//! Read-only streaming client with ping keepalive and an explicit,
//! bounded reconnection policy.

mod client;
mod types;

pub use client::WsClient;
pub use types::{WsConfig, WsError, WsMessage};
