use std::sync::atomic::AtomicU64;
use std::sync::Arc;

/// Minimal counters for operational visibility.
///
/// Counters never affect behavior; every field is bumped with `Relaxed`
/// ordering at its call site and read by the status view.
#[derive(Clone, Default)]
pub struct Counters {
    pub det_checks: Arc<AtomicU64>,
    pub det_opportunities: Arc<AtomicU64>,

    // per-route skip reasons
    pub det_skip_missing: Arc<AtomicU64>,
    pub det_skip_invalid: Arc<AtomicU64>,
    pub det_skip_stale: Arc<AtomicU64>,
    pub det_skip_degenerate: Arc<AtomicU64>,
    pub det_below_threshold: Arc<AtomicU64>,

    // ingestion health
    pub feed_updates: Arc<AtomicU64>,
    pub feed_rejects: Arc<AtomicU64>,
    pub feed_parse_errors: Arc<AtomicU64>,
    pub feed_reconnects: Arc<AtomicU64>,

    pub sink_failures: Arc<AtomicU64>,
}
