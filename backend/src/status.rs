//! Periodic status view.
//!
//! Stands in for an interactive dashboard: one structured log line at a
//! fixed cadence summarizing detection progress and symbol health.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::detector::DetectorStats;
use crate::metrics::Counters;

pub async fn run_status_loop(
    stats: Arc<DetectorStats>,
    counters: Counters,
    running: Arc<AtomicBool>,
    every: Duration,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while running.load(Ordering::Relaxed) {
        ticker.tick().await;

        let snap = stats.snapshot();
        info!(
            target: "status",
            checks = counters.det_checks.load(Ordering::Relaxed),
            opportunities = snap.opportunities_found,
            max_profit_percent = snap.max_profit_percent,
            avg_profit_percent = snap.avg_profit_percent,
            active = snap.active_symbols,
            stale = snap.stale_symbols,
            total = snap.total_symbols,
            last_route = snap.last_route.as_deref().unwrap_or("none"),
            feed_updates = counters.feed_updates.load(Ordering::Relaxed),
            feed_reconnects = counters.feed_reconnects.load(Ordering::Relaxed),
            "detector status"
        );
    }
}
