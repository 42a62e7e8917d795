//! Market data ingestion.
//!
//! Adapters normalize exchange-native ticks and push them into the shared
//! `MarketState`; everything downstream of the book update is the engine's
//! concern. The only implementation today is the Binance book-ticker
//! WebSocket client, one stream per symbol.

pub mod parser;
pub mod ws;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;

use engine::MarketState;

/// A market data feed pushing top-of-book updates into the shared state.
///
/// Implementations run until the shared running flag clears and must ride
/// out transient transport failures themselves rather than returning early.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    async fn run(&self, market: Arc<MarketState>, running: Arc<AtomicBool>) -> anyhow::Result<()>;
}
