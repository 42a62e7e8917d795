use std::path::PathBuf;

use clap::Parser;

/// Runtime configuration.
///
/// Every option carries a default, so running the binary with no arguments
/// is the supported minimal form.
#[derive(Clone, Debug, Parser)]
#[clap(name = "arb-detector", version)]
pub struct AppConfig {
    /// Minimum round-trip profit (percent) required to emit an opportunity.
    #[clap(long, default_value_t = 0.10)]
    pub threshold_percent: f64,

    /// Maximum snapshot age (ms) for a route to be evaluable.
    ///
    /// Cross-symbol snapshots carry no mutual ordering guarantee; this gate
    /// bounds the skew a single evaluation can observe.
    #[clap(long, default_value_t = 500)]
    pub max_age_ms: u64,

    /// Age (ms) after which a symbol is classified as stale in the
    /// statistics view.
    #[clap(long, default_value_t = 3_000)]
    pub stale_age_ms: u64,

    /// Detector tick cadence (ms).
    #[clap(long, default_value_t = 1_000)]
    pub tick_interval_ms: u64,

    /// Upper sanity bound on any quoted price. Quotes above it are treated
    /// as feed garbage and the affected route is skipped.
    #[clap(long, default_value_t = 1_000_000.0)]
    pub max_reasonable_price: f64,

    /// Exchange WebSocket endpoint; per-symbol streams attach underneath.
    #[clap(long, default_value = "wss://stream.binance.com:9443/ws")]
    pub ws_url: String,

    /// Directory the JSON opportunity sink writes into.
    #[clap(long, default_value = ".")]
    pub out_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_is_a_valid_invocation() {
        let cfg = AppConfig::parse_from(["arb-detector"]);
        assert_eq!(cfg.threshold_percent, 0.10);
        assert_eq!(cfg.max_age_ms, 500);
        assert_eq!(cfg.stale_age_ms, 3_000);
        assert_eq!(cfg.tick_interval_ms, 1_000);
        assert_eq!(cfg.max_reasonable_price, 1_000_000.0);
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = AppConfig::parse_from([
            "arb-detector",
            "--threshold-percent",
            "0.25",
            "--tick-interval-ms",
            "250",
        ]);
        assert_eq!(cfg.threshold_percent, 0.25);
        assert_eq!(cfg.tick_interval_ms, 250);
    }
}
