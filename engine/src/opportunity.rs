//! Evaluated arbitrage opportunity, as handed to sinks.

use crate::routes::Direction;

/// Top-of-book prices of one symbol referenced by an opportunity, kept for
/// display and audit.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRef {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
}

impl PriceRef {
    pub fn new(symbol: impl Into<String>, bid: f64, ask: f64) -> Self {
        Self {
            symbol: symbol.into(),
            bid,
            ask,
        }
    }
}

/// Immutable outcome of a profitable route evaluation.
///
/// `max_tradable_amount` is denominated in `max_tradable_currency`, which is
/// the base asset for every catalog route.
#[derive(Debug, Clone, PartialEq)]
pub struct Opportunity {
    pub route_name: String,
    pub direction: Direction,
    pub trade_sequence: String,
    pub profit_percent: f64,
    pub max_tradable_amount: f64,
    pub max_tradable_currency: String,
    pub prices: Vec<PriceRef>,
}
