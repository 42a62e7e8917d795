//! Registry of order books keyed by canonical symbol.
//!
//! The key set is fixed at construction, so lookups need no outer lock; the
//! only synchronization is the per-book mutex. Updates for symbols outside
//! the universe are dropped rather than inserted.

use std::collections::HashMap;

use crate::orderbook::{OrderBook, TopOfBook};
use crate::update::{MarketUpdate, TopUpdate};

/// Shared market view: one order book per symbol in the universe.
#[derive(Debug, Default)]
pub struct MarketState {
    books: HashMap<String, OrderBook>,
}

impl MarketState {
    /// Creates a book for every symbol in the universe.
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let books = symbols
            .into_iter()
            .map(|s| (s.into(), OrderBook::new()))
            .collect();
        Self { books }
    }

    /// The order book for `symbol`, if it is part of the universe.
    pub fn book(&self, symbol: &str) -> Option<&OrderBook> {
        self.books.get(symbol)
    }

    /// Value copy of the top of book for `symbol`. `None` for symbols
    /// outside the universe; a known but not yet populated symbol returns a
    /// snapshot with `has_data == false`.
    pub fn get_snapshot(&self, symbol: &str) -> Option<TopOfBook> {
        self.books.get(symbol).map(OrderBook::snapshot)
    }

    /// Applies a top-of-book tick. Returns whether the book accepted it.
    pub fn apply_top(&self, update: &TopUpdate) -> bool {
        match self.books.get(&update.symbol) {
            Some(book) => book.update_top(
                update.bid_price,
                update.bid_qty,
                update.ask_price,
                update.ask_qty,
                update.ts_ms,
            ),
            None => false,
        }
    }

    /// Applies a depth update (snapshot or delta). Returns whether the
    /// symbol is part of the universe.
    pub fn apply(&self, update: &MarketUpdate) -> bool {
        let Some(book) = self.books.get(&update.symbol) else {
            return false;
        };
        if update.is_snapshot {
            book.apply_snapshot(&update.bids, &update.asks, update.ts_ms);
        } else {
            book.apply_delta(&update.bids, &update.asks, update.ts_ms);
        }
        true
    }

    /// All symbols in the universe, in no particular order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.books.keys().map(String::as_str)
    }

    /// Symbols whose book has received at least one accepted update.
    pub fn symbols_with_data(&self) -> Vec<String> {
        self.books
            .iter()
            .filter(|(_, book)| book.snapshot().has_data)
            .map(|(symbol, _)| symbol.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::PriceLevel;

    fn top(symbol: &str, bid: f64, ask: f64, ts_ms: u64) -> TopUpdate {
        TopUpdate {
            symbol: symbol.to_string(),
            bid_price: bid,
            bid_qty: 10.0,
            ask_price: ask,
            ask_qty: 10.0,
            ts_ms,
        }
    }

    #[test]
    fn unknown_symbols_are_not_inserted() {
        let market = MarketState::new(["ARB/USDT"]);
        assert!(!market.apply_top(&top("ARB/BTC", 1.0, 2.0, 1_000)));
        assert_eq!(market.get_snapshot("ARB/BTC"), None);
        assert_eq!(market.len(), 1);
    }

    #[test]
    fn known_symbol_without_updates_reports_no_data() {
        let market = MarketState::new(["ARB/USDT"]);
        let snap = market.get_snapshot("ARB/USDT").unwrap();
        assert!(!snap.has_data);
        assert!(market.symbols_with_data().is_empty());
    }

    #[test]
    fn top_updates_reach_the_right_book() {
        let market = MarketState::new(["ARB/USDT", "BTC/USDT"]);
        assert!(market.apply_top(&top("ARB/USDT", 0.52, 0.53, 1_000)));

        let snap = market.get_snapshot("ARB/USDT").unwrap();
        assert!(snap.has_data);
        assert_eq!(snap.bid_price, 0.52);
        assert!(!market.get_snapshot("BTC/USDT").unwrap().has_data);
        assert_eq!(market.symbols_with_data(), vec!["ARB/USDT".to_string()]);
    }

    #[test]
    fn depth_updates_route_by_snapshot_flag() {
        let market = MarketState::new(["ARB/USDT"]);
        let snapshot = MarketUpdate {
            symbol: "ARB/USDT".to_string(),
            bids: vec![PriceLevel::new(0.52, 5.0)],
            asks: vec![PriceLevel::new(0.53, 5.0)],
            is_snapshot: true,
            ts_ms: 1_000,
        };
        assert!(market.apply(&snapshot));
        assert_eq!(market.get_snapshot("ARB/USDT").unwrap().bid_price, 0.52);

        let delta = MarketUpdate {
            symbol: "ARB/USDT".to_string(),
            bids: vec![PriceLevel::new(0.52, 0.0)],
            asks: vec![],
            is_snapshot: false,
            ts_ms: 1_100,
        };
        assert!(market.apply(&delta));
        // the only bid level was deleted; the top keeps its last good value
        let book = market.book("ARB/USDT").unwrap();
        assert!(book.top_n(crate::orderbook::Side::Bid, 5).is_empty());
    }
}
