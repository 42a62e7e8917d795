//! Market-state and route-evaluation core of the ARB arbitrage detector.
//!
//! This crate is pure and synchronous: it holds the per-symbol order books,
//! the static route catalog and the profit algebra, and knows nothing about
//! transports, sinks or scheduling. The application crate feeds it updates
//! and drives evaluation at its own cadence.

pub mod evaluator;
pub mod market_state;
pub mod opportunity;
pub mod orderbook;
pub mod routes;
pub mod symbols;
pub mod update;

pub use evaluator::{Evaluator, Skip};
pub use market_state::MarketState;
pub use opportunity::{Opportunity, PriceRef};
pub use orderbook::{OrderBook, PriceLevel, Side, TopOfBook};
pub use routes::{Direction, Route, CATALOG};
pub use update::{MarketUpdate, TopUpdate};
