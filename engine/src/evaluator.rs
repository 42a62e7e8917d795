//! Route profit evaluation.
//!
//! For each route the evaluator reads validated snapshots from the market
//! state and either produces an `Opportunity` or a `Skip` explaining why the
//! route was not emitted. A `Skip` is not an error: missing books, invalid
//! or stale prices and degenerate arithmetic all recover locally so that one
//! bad route can never poison a detection tick.
//!
//! Validity gates, applied to every referenced snapshot:
//! - the book has received at least one accepted update
//! - bid and ask are finite, strictly positive and within the sanity bound
//! - bid <= ask
//! - the snapshot is no older than `max_age_ms` at the injected clock
//!
//! All arithmetic is IEEE-754 double precision. Tradable sizes are
//! depth-limited across every leg and denominated in the base asset.

use thiserror::Error;

use crate::market_state::MarketState;
use crate::opportunity::{Opportunity, PriceRef};
use crate::orderbook::TopOfBook;
use crate::routes::{Direction, Route};
use crate::symbols;

/// Upper sanity bound on any quoted price.
pub const MAX_REASONABLE_PRICE: f64 = 1_000_000.0;

/// Default minimum round-trip profit, in percent.
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 0.10;

/// Default maximum snapshot age for a route to be evaluable.
pub const DEFAULT_MAX_AGE_MS: u64 = 500;

/// Why a route produced no opportunity this tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Skip {
    #[error("no data for {symbol}")]
    MissingData { symbol: String },

    #[error("invalid price for {symbol}")]
    InvalidPrice { symbol: String },

    #[error("stale data for {symbol}")]
    Stale { symbol: String },

    #[error("degenerate arithmetic")]
    Degenerate,

    #[error("profit {profit_percent}% below threshold")]
    BelowThreshold { profit_percent: f64 },
}

/// Evaluates catalog routes against the current market state.
pub struct Evaluator {
    threshold_percent: f64,
    max_age_ms: u64,
    max_reasonable_price: f64,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(
            DEFAULT_THRESHOLD_PERCENT,
            DEFAULT_MAX_AGE_MS,
            MAX_REASONABLE_PRICE,
        )
    }
}

impl Evaluator {
    pub fn new(threshold_percent: f64, max_age_ms: u64, max_reasonable_price: f64) -> Self {
        Self {
            threshold_percent,
            max_age_ms,
            max_reasonable_price,
        }
    }

    pub fn threshold_percent(&self) -> f64 {
        self.threshold_percent
    }

    /// Evaluates one route. `now_ms` is the clock the freshness gate runs
    /// against; passing it in keeps the gate deterministic under test.
    pub fn evaluate(
        &self,
        route: &Route,
        market: &MarketState,
        now_ms: u64,
    ) -> Result<Opportunity, Skip> {
        match *route {
            Route::TwoLeg {
                arb_pair,
                cross_pair,
                direction,
            } => self.eval_two_leg(route, arb_pair, cross_pair, direction, market, now_ms),
            Route::DirectStable { stable_pair } => {
                self.eval_direct_stable(route, stable_pair, market, now_ms)
            }
            Route::ThreeLeg {
                start_pair,
                middle_pair,
                final_pair,
            } => self.eval_three_leg(route, start_pair, middle_pair, final_pair, market, now_ms),
        }
    }

    fn eval_two_leg(
        &self,
        route: &Route,
        arb_pair: &str,
        cross_pair: &str,
        direction: Direction,
        market: &MarketState,
        now_ms: u64,
    ) -> Result<Opportunity, Skip> {
        let arb = self.valid_snapshot(market, arb_pair, now_ms)?;
        let cross = self.valid_snapshot(market, cross_pair, now_ms)?;
        let direct = self.valid_snapshot(market, symbols::DIRECT_PAIR, now_ms)?;

        let (profit_percent, max_tradable, trade_sequence) = match direction {
            Direction::Forward => {
                // Buy ARB via the cross rate, sell it on the direct book.
                let cost = arb.ask_price * cross.ask_price;
                let proceeds = direct.bid_price;
                let profit = profit_percent(proceeds, cost)?;

                let step1 = arb.ask_qty;
                let available_cross = step1 * arb.ask_price;
                let step2_base =
                    cross.ask_qty.min(available_cross / cross.ask_price) / arb.ask_price;
                let step3 = direct.bid_qty.min(step1);
                let size = finite_positive(step1.min(step2_base).min(step3))?;

                let sequence = format!(
                    "Buy {arb_pair} -> Buy {cross_pair} -> Sell {}",
                    symbols::DIRECT_PAIR
                );
                (profit, size, sequence)
            }
            Direction::Reverse => {
                // Buy ARB on the direct book, unwind it via the cross rate.
                let cost = direct.ask_price;
                let proceeds = arb.bid_price * cross.bid_price;
                let profit = profit_percent(proceeds, cost)?;

                let step1 = direct.ask_qty;
                let step2 = arb.bid_qty.min(step1);
                let step3_base =
                    cross.bid_qty.min(step2 * arb.bid_price) / arb.bid_price;
                let size = finite_positive(step1.min(step2).min(step3_base))?;

                let sequence = format!(
                    "Buy {} -> Sell {arb_pair} -> Sell {cross_pair}",
                    symbols::DIRECT_PAIR
                );
                (profit, size, sequence)
            }
        };

        self.require_threshold(profit_percent)?;

        Ok(Opportunity {
            route_name: route.name(),
            direction,
            trade_sequence,
            profit_percent,
            max_tradable_amount: max_tradable,
            max_tradable_currency: symbols::BASE_ASSET.to_string(),
            prices: vec![
                PriceRef::new(arb_pair, arb.bid_price, arb.ask_price),
                PriceRef::new(cross_pair, cross.bid_price, cross.ask_price),
                PriceRef::new(symbols::DIRECT_PAIR, direct.bid_price, direct.ask_price),
            ],
        })
    }

    fn eval_direct_stable(
        &self,
        route: &Route,
        stable_pair: &str,
        market: &MarketState,
        now_ms: u64,
    ) -> Result<Opportunity, Skip> {
        let stable = self.valid_snapshot(market, stable_pair, now_ms)?;
        let direct = self.valid_snapshot(market, symbols::DIRECT_PAIR, now_ms)?;

        let forward = direct.bid_price / stable.ask_price - 1.0;
        let reverse = stable.bid_price / direct.ask_price - 1.0;
        if !forward.is_finite() || !reverse.is_finite() {
            return Err(Skip::Degenerate);
        }

        let (direction, profit_percent, size, trade_sequence) = if forward >= reverse {
            let size = stable.ask_qty.min(direct.bid_qty);
            let sequence = format!("Buy {stable_pair} -> Sell {}", symbols::DIRECT_PAIR);
            (Direction::Forward, forward * 100.0, size, sequence)
        } else {
            let size = direct.ask_qty.min(stable.bid_qty);
            let sequence = format!("Buy {} -> Sell {stable_pair}", symbols::DIRECT_PAIR);
            (Direction::Reverse, reverse * 100.0, size, sequence)
        };
        let size = finite_positive(size)?;

        self.require_threshold(profit_percent)?;

        Ok(Opportunity {
            route_name: route.name(),
            direction,
            trade_sequence,
            profit_percent,
            max_tradable_amount: size,
            max_tradable_currency: symbols::BASE_ASSET.to_string(),
            prices: vec![
                PriceRef::new(stable_pair, stable.bid_price, stable.ask_price),
                PriceRef::new(symbols::DIRECT_PAIR, direct.bid_price, direct.ask_price),
            ],
        })
    }

    fn eval_three_leg(
        &self,
        route: &Route,
        start_pair: &str,
        middle_pair: &str,
        final_pair: &str,
        market: &MarketState,
        now_ms: u64,
    ) -> Result<Opportunity, Skip> {
        let start = self.valid_snapshot(market, start_pair, now_ms)?;
        let middle = self.valid_snapshot(market, middle_pair, now_ms)?;
        let last = self.valid_snapshot(market, final_pair, now_ms)?;

        let comparison_pair =
            Route::comparison_pair(start_pair).ok_or(Skip::Degenerate)?;
        let comparison = self.valid_snapshot(market, &comparison_pair, now_ms)?;

        // One unit of the starting quote currency through all three legs,
        // compared against converting that unit to USDT directly.
        let arb_qty = 1.0 / start.ask_price;
        let middle_qty = arb_qty * middle.bid_price;
        let final_usdt = middle_qty * last.bid_price;
        let initial_usdt = comparison.ask_price;
        let profit = profit_percent(final_usdt, initial_usdt)?;

        let step1 = start.ask_qty;
        let step2 = middle.bid_qty.min(step1);
        let step3_base = last.bid_qty.min(step2 * middle.bid_price) / middle.bid_price;
        let size = finite_positive(step1.min(step2).min(step3_base))?;

        self.require_threshold(profit)?;

        Ok(Opportunity {
            route_name: route.name(),
            direction: Direction::Forward,
            trade_sequence: format!(
                "Buy {start_pair} -> Sell {middle_pair} -> Sell {final_pair}"
            ),
            profit_percent: profit,
            max_tradable_amount: size,
            max_tradable_currency: symbols::BASE_ASSET.to_string(),
            prices: vec![
                PriceRef::new(start_pair, start.bid_price, start.ask_price),
                PriceRef::new(middle_pair, middle.bid_price, middle.ask_price),
                PriceRef::new(final_pair, last.bid_price, last.ask_price),
                PriceRef::new(
                    comparison_pair,
                    comparison.bid_price,
                    comparison.ask_price,
                ),
            ],
        })
    }

    /// Fetches one snapshot and runs every validity gate against it.
    fn valid_snapshot(
        &self,
        market: &MarketState,
        symbol: &str,
        now_ms: u64,
    ) -> Result<TopOfBook, Skip> {
        let snap = market.get_snapshot(symbol).ok_or_else(|| Skip::MissingData {
            symbol: symbol.to_string(),
        })?;
        if !snap.has_data {
            return Err(Skip::MissingData {
                symbol: symbol.to_string(),
            });
        }
        if !self.price_ok(snap.bid_price)
            || !self.price_ok(snap.ask_price)
            || snap.bid_price > snap.ask_price
        {
            return Err(Skip::InvalidPrice {
                symbol: symbol.to_string(),
            });
        }
        if !snap.is_fresh(self.max_age_ms, now_ms) {
            return Err(Skip::Stale {
                symbol: symbol.to_string(),
            });
        }
        Ok(snap)
    }

    fn price_ok(&self, price: f64) -> bool {
        price.is_finite() && price > 0.0 && price <= self.max_reasonable_price
    }

    fn require_threshold(&self, profit_percent: f64) -> Result<(), Skip> {
        if profit_percent >= self.threshold_percent {
            Ok(())
        } else {
            Err(Skip::BelowThreshold { profit_percent })
        }
    }
}

/// Round-trip profit in percent, guarding the division.
fn profit_percent(proceeds: f64, cost: f64) -> Result<f64, Skip> {
    if !cost.is_finite() || cost <= 0.0 || !proceeds.is_finite() || proceeds <= 0.0 {
        return Err(Skip::Degenerate);
    }
    let profit = (proceeds / cost - 1.0) * 100.0;
    if profit.is_finite() {
        Ok(profit)
    } else {
        Err(Skip::Degenerate)
    }
}

fn finite_positive(v: f64) -> Result<f64, Skip> {
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(Skip::Degenerate)
    }
}
