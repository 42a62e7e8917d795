//! Arbitrage detection loop.
//!
//! Responsibilities:
//! - Evaluate every catalog route once per tick against the shared market
//!   state.
//! - Select the single best outcome (highest profit, catalog order breaks
//!   ties) and fan it out to the configured sinks.
//! - Track running statistics for the status view.
//!
//! Non-responsibilities:
//! - Book updates (ingestion workers own them).
//! - Route algebra and validity gating (the evaluator owns them).
//!
//! One bad route must never poison a tick: every evaluation returns a
//! result whose skip variants are counted and, where useful, logged. Sink
//! failures are swallowed after a warning.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use engine::{evaluator::Skip, Evaluator, MarketState, Opportunity, CATALOG};

use crate::logger::warn_if_slow;
use crate::metrics::Counters;
use crate::sink::OpportunitySink;
use crate::time::now_ms;

/// Per-sink delivery budget.
const SINK_BUDGET: Duration = Duration::from_millis(10);

/// Running statistics over emitted opportunities and symbol health,
/// snapshot-copied by the status view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    pub opportunities_found: u64,
    pub max_profit_percent: f64,
    pub avg_profit_percent: f64,
    pub last_route: Option<String>,
    pub active_symbols: usize,
    pub stale_symbols: usize,
    pub total_symbols: usize,
}

#[derive(Default)]
pub struct DetectorStats {
    inner: Mutex<StatsSnapshot>,
}

impl DetectorStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().clone()
    }

    fn record_emission(&self, opp: &Opportunity) {
        let mut s = self.inner.lock();
        s.opportunities_found += 1;
        if opp.profit_percent > s.max_profit_percent || s.opportunities_found == 1 {
            s.max_profit_percent = opp.profit_percent;
        }
        let n = s.opportunities_found as f64;
        s.avg_profit_percent = (s.avg_profit_percent * (n - 1.0) + opp.profit_percent) / n;
        s.last_route = Some(opp.route_name.clone());
    }

    fn record_symbol_health(&self, active: usize, stale: usize, total: usize) {
        let mut s = self.inner.lock();
        s.active_symbols = active;
        s.stale_symbols = stale;
        s.total_symbols = total;
    }
}

/// Drives route evaluation at a fixed cadence.
pub struct Detector {
    market: Arc<MarketState>,
    evaluator: Evaluator,
    sinks: Vec<Arc<dyn OpportunitySink>>,
    counters: Counters,
    stats: Arc<DetectorStats>,
    stale_age_ms: u64,
}

impl Detector {
    pub fn new(
        market: Arc<MarketState>,
        evaluator: Evaluator,
        sinks: Vec<Arc<dyn OpportunitySink>>,
        counters: Counters,
        stats: Arc<DetectorStats>,
        stale_age_ms: u64,
    ) -> Self {
        Self {
            market,
            evaluator,
            sinks,
            counters,
            stats,
            stale_age_ms,
        }
    }

    /// Executes one detection pass and returns the emitted opportunity, if
    /// any. `now_ms` is the clock every freshness decision runs against.
    pub fn tick(&self, now_ms: u64) -> Option<Opportunity> {
        self.counters.det_checks.fetch_add(1, Ordering::Relaxed);

        let mut best: Option<Opportunity> = None;
        let mut warned_stale: HashSet<String> = HashSet::new();

        for route in CATALOG {
            match self.evaluator.evaluate(route, &self.market, now_ms) {
                Ok(opp) => {
                    let better = best
                        .as_ref()
                        .map_or(true, |b| opp.profit_percent > b.profit_percent);
                    if better {
                        best = Some(opp);
                    }
                }
                Err(Skip::Stale { symbol }) => {
                    self.counters.det_skip_stale.fetch_add(1, Ordering::Relaxed);
                    if warned_stale.insert(symbol.clone()) {
                        warn!(route = %route.name(), symbol = %symbol, "route skipped on stale data");
                    }
                }
                Err(Skip::MissingData { symbol }) => {
                    self.counters
                        .det_skip_missing
                        .fetch_add(1, Ordering::Relaxed);
                    debug!(route = %route.name(), symbol = %symbol, "route skipped, book not populated");
                }
                Err(Skip::InvalidPrice { symbol }) => {
                    self.counters
                        .det_skip_invalid
                        .fetch_add(1, Ordering::Relaxed);
                    debug!(route = %route.name(), symbol = %symbol, "route skipped on invalid price");
                }
                Err(Skip::Degenerate) => {
                    self.counters
                        .det_skip_degenerate
                        .fetch_add(1, Ordering::Relaxed);
                    debug!(route = %route.name(), "route skipped on degenerate arithmetic");
                }
                Err(Skip::BelowThreshold { profit_percent }) => {
                    self.counters
                        .det_below_threshold
                        .fetch_add(1, Ordering::Relaxed);
                    debug!(
                        route = %route.name(),
                        profit_percent,
                        "route below threshold"
                    );
                }
            }
        }

        if let Some(ref opp) = best {
            self.counters
                .det_opportunities
                .fetch_add(1, Ordering::Relaxed);
            self.emit(opp);
            self.stats.record_emission(opp);
        } else {
            debug!("no opportunity this tick");
        }

        self.update_symbol_health(now_ms);
        best
    }

    fn emit(&self, opp: &Opportunity) {
        for sink in &self.sinks {
            let result = warn_if_slow(sink.name(), SINK_BUDGET, || sink.on_opportunity(opp));
            if let Err(e) = result {
                self.counters.sink_failures.fetch_add(1, Ordering::Relaxed);
                warn!(sink = sink.name(), error = %e, "sink failed; continuing");
            }
        }
    }

    fn update_symbol_health(&self, now_ms: u64) {
        let mut active = 0;
        let mut stale = 0;
        let mut total = 0;
        for symbol in self.market.symbols() {
            total += 1;
            if let Some(snap) = self.market.get_snapshot(symbol) {
                if !snap.has_data {
                    continue;
                }
                if snap.is_fresh(self.stale_age_ms, now_ms) {
                    active += 1;
                } else {
                    stale += 1;
                }
            }
        }
        self.stats.record_symbol_health(active, stale, total);
    }

    /// Runs detection until the shared running flag clears.
    pub async fn run(self: Arc<Self>, running: Arc<AtomicBool>, tick_interval: Duration) {
        let mut ticker = interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            every_ms = tick_interval.as_millis() as u64,
            routes = CATALOG.len(),
            "detector loop started"
        );

        while running.load(Ordering::Relaxed) {
            ticker.tick().await;
            let _ = self.tick(now_ms());
        }

        info!("detector loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::symbols::all_symbols;
    use engine::TopUpdate;

    struct CollectingSink(Mutex<Vec<Opportunity>>);

    impl CollectingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Vec::new())))
        }
        fn emitted(&self) -> Vec<Opportunity> {
            self.0.lock().clone()
        }
    }

    impl OpportunitySink for CollectingSink {
        fn name(&self) -> &'static str {
            "collect"
        }
        fn on_opportunity(&self, opp: &Opportunity) -> anyhow::Result<()> {
            self.0.lock().push(opp.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl OpportunitySink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn on_opportunity(&self, _opp: &Opportunity) -> anyhow::Result<()> {
            anyhow::bail!("sink unavailable")
        }
    }

    const NOW: u64 = 5_000_000;

    fn set_top(market: &MarketState, symbol: &str, bid: f64, ask: f64, ts_ms: u64) {
        assert!(market.apply_top(&TopUpdate {
            symbol: symbol.to_string(),
            bid_price: bid,
            bid_qty: 100.0,
            ask_price: ask,
            ask_qty: 100.0,
            ts_ms,
        }));
    }

    fn detector_with(
        market: Arc<MarketState>,
        sinks: Vec<Arc<dyn OpportunitySink>>,
    ) -> (Detector, Arc<DetectorStats>, Counters) {
        let stats = Arc::new(DetectorStats::default());
        let counters = Counters::default();
        let detector = Detector::new(
            market,
            Evaluator::default(),
            sinks,
            counters.clone(),
            stats.clone(),
            3_000,
        );
        (detector, stats, counters)
    }

    #[test]
    fn best_route_wins_the_tick() {
        let market = Arc::new(MarketState::new(all_symbols()));
        // forward two-leg at roughly +2.76%
        set_top(&market, "ARB/BTC", 0.00001, 0.0000101, NOW);
        set_top(&market, "BTC/USDT", 50_000.0, 50_100.0, NOW);
        set_top(&market, "ARB/USDT", 0.520, 0.530, NOW);
        // direct stable at a weaker +0.19%
        set_top(&market, "ARB/FDUSD", 0.518, 0.519, NOW);

        let sink = CollectingSink::new();
        let (detector, stats, counters) =
            detector_with(market, vec![sink.clone() as Arc<dyn OpportunitySink>]);

        let best = detector.tick(NOW).expect("an opportunity");
        assert_eq!(best.route_name, "ARB/BTC -> BTC/USDT (forward)");

        let emitted = sink.emitted();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0], best);
        assert_eq!(counters.det_checks.load(Ordering::Relaxed), 1);
        assert_eq!(counters.det_opportunities.load(Ordering::Relaxed), 1);
        assert_eq!(stats.snapshot().opportunities_found, 1);
    }

    #[test]
    fn stale_books_produce_no_emission() {
        let market = Arc::new(MarketState::new(all_symbols()));
        set_top(&market, "ARB/BTC", 0.00001, 0.0000101, NOW);
        set_top(&market, "BTC/USDT", 50_000.0, 50_100.0, NOW - 800);
        set_top(&market, "ARB/USDT", 0.520, 0.530, NOW);

        let sink = CollectingSink::new();
        let (detector, _, counters) =
            detector_with(market, vec![sink.clone() as Arc<dyn OpportunitySink>]);

        assert!(detector.tick(NOW).is_none());
        assert!(sink.emitted().is_empty());
        assert!(counters.det_skip_stale.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn failing_sink_does_not_block_the_others() {
        let market = Arc::new(MarketState::new(all_symbols()));
        set_top(&market, "ARB/FDUSD", 0.499, 0.500, NOW);
        set_top(&market, "ARB/USDT", 0.502, 0.503, NOW);

        let collector = CollectingSink::new();
        let (detector, _, counters) = detector_with(
            market,
            vec![
                Arc::new(FailingSink) as Arc<dyn OpportunitySink>,
                collector.clone() as Arc<dyn OpportunitySink>,
            ],
        );

        assert!(detector.tick(NOW).is_some());
        assert_eq!(collector.emitted().len(), 1);
        assert_eq!(counters.sink_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn statistics_accumulate_across_ticks() {
        let market = Arc::new(MarketState::new(all_symbols()));
        set_top(&market, "ARB/FDUSD", 0.499, 0.500, NOW);
        set_top(&market, "ARB/USDT", 0.502, 0.503, NOW);

        let sink = CollectingSink::new();
        let (detector, stats, _) =
            detector_with(market.clone(), vec![sink as Arc<dyn OpportunitySink>]);

        detector.tick(NOW);
        // widen the edge for the second tick
        set_top(&market, "ARB/USDT", 0.504, 0.505, NOW + 100);
        detector.tick(NOW + 100);

        let snap = stats.snapshot();
        assert_eq!(snap.opportunities_found, 2);
        let first = (0.502 / 0.500 - 1.0) * 100.0;
        let second = (0.504 / 0.500 - 1.0) * 100.0;
        assert!((snap.max_profit_percent - second).abs() < 1e-9);
        assert!((snap.avg_profit_percent - (first + second) / 2.0).abs() < 1e-9);
        assert_eq!(snap.active_symbols, 2);
        assert_eq!(snap.total_symbols, all_symbols().len());
    }

    #[test]
    fn symbol_health_distinguishes_active_and_stale() {
        let market = Arc::new(MarketState::new(all_symbols()));
        set_top(&market, "ARB/USDT", 0.502, 0.503, NOW);
        set_top(&market, "ARB/BTC", 0.00001, 0.0000101, NOW - 10_000);

        let (detector, stats, _) = detector_with(market, Vec::new());
        detector.tick(NOW);

        let snap = stats.snapshot();
        assert_eq!(snap.active_symbols, 1);
        assert_eq!(snap.stale_symbols, 1);
        assert_eq!(snap.total_symbols, all_symbols().len());
    }
}
