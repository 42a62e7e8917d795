//! Update payloads pushed by ingestion adapters.

use crate::orderbook::PriceLevel;

/// Top-of-book tick for one symbol (the book-ticker feed shape).
#[derive(Debug, Clone, PartialEq)]
pub struct TopUpdate {
    pub symbol: String,
    pub bid_price: f64,
    pub bid_qty: f64,
    pub ask_price: f64,
    pub ask_qty: f64,
    pub ts_ms: u64,
}

/// Depth update for one symbol, either a full snapshot or an incremental
/// delta. Level quantities of zero act as deletion markers in deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketUpdate {
    pub symbol: String,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub is_snapshot: bool,
    pub ts_ms: u64,
}
