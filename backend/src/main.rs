use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::task::JoinHandle;
use tracing::{error, info};

use backend::{
    config::AppConfig,
    detector::{Detector, DetectorStats},
    error::AppError,
    feed::{ws::BinanceBookTickerClient, MarketFeed},
    logger::init_tracing,
    metrics::Counters,
    sink::{json::JsonFileSink, log::LogSink, OpportunitySink},
    status::run_status_loop,
};
use engine::{symbols, Evaluator, MarketState, CATALOG};

/// Delay between feed worker launches, to stay clear of connection rate
/// limits on the exchange side.
const FEED_START_STAGGER: Duration = Duration::from_millis(100);

/// Grace period before the first detection tick so books can populate.
const STARTUP_GRACE: Duration = Duration::from_secs(2);

/// Cadence of the status view.
const STATUS_INTERVAL: Duration = Duration::from_secs(5);

/// Builds the market state and verifies the catalog only references books
/// that exist in the universe.
fn build_market_state() -> Result<Arc<MarketState>, AppError> {
    let market = MarketState::new(symbols::all_symbols());
    for route in CATALOG {
        for symbol in route.referenced_symbols() {
            if market.book(&symbol).is_none() {
                return Err(AppError::UnknownSymbol(symbol));
            }
        }
    }
    Ok(Arc::new(market))
}

/// Spawns one feed worker per symbol, staggered to avoid rate limiting.
fn start_feeds(
    cfg: &AppConfig,
    market: Arc<MarketState>,
    counters: Counters,
    running: Arc<AtomicBool>,
) -> Vec<JoinHandle<()>> {
    symbols::all_symbols()
        .iter()
        .enumerate()
        .map(|(i, symbol)| {
            let client = BinanceBookTickerClient::for_symbol(&cfg.ws_url, symbol, counters.clone());
            let market = market.clone();
            let running = running.clone();
            let symbol = symbol.to_string();
            tokio::spawn(async move {
                tokio::time::sleep(FEED_START_STAGGER * i as u32).await;
                if let Err(e) = client.run(market, running).await {
                    error!(symbol = %symbol, error = %e, "feed worker failed");
                }
            })
        })
        .collect()
}

async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            r = tokio::signal::ctrl_c() => r?,
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::parse();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    info!(
        threshold_percent = cfg.threshold_percent,
        max_age_ms = cfg.max_age_ms,
        tick_interval_ms = cfg.tick_interval_ms,
        "starting ARB arbitrage detector"
    );

    let market = build_market_state()?;
    info!(symbols = market.len(), routes = CATALOG.len(), "market state ready");

    let counters = Counters::default();
    let stats = Arc::new(DetectorStats::default());
    let running = Arc::new(AtomicBool::new(true));

    let sinks: Vec<Arc<dyn OpportunitySink>> = vec![
        Arc::new(LogSink),
        Arc::new(JsonFileSink::new(&cfg.out_dir)?),
    ];

    let mut handles = start_feeds(&cfg, market.clone(), counters.clone(), running.clone());

    // Let the books fill before evaluating anything.
    tokio::time::sleep(STARTUP_GRACE).await;

    let evaluator = Evaluator::new(cfg.threshold_percent, cfg.max_age_ms, cfg.max_reasonable_price);
    let detector = Arc::new(Detector::new(
        market,
        evaluator,
        sinks,
        counters.clone(),
        stats.clone(),
        cfg.stale_age_ms,
    ));
    handles.push(tokio::spawn(detector.run(
        running.clone(),
        Duration::from_millis(cfg.tick_interval_ms),
    )));
    handles.push(tokio::spawn(run_status_loop(
        stats,
        counters,
        running.clone(),
        STATUS_INTERVAL,
    )));

    shutdown_signal().await?;
    info!("shutdown signal received");
    running.store(false, Ordering::Relaxed);

    for handle in handles {
        let _ = handle.await;
    }
    info!("all workers stopped");

    Ok(())
}
