use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tracing::{debug, error, info, warn};

use engine::MarketState;

use crate::feed::{parser, MarketFeed};
use crate::metrics::Counters;
use crate::time::now_ms;

/// Delay between reconnection attempts after a dropped socket.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// How long a read may block before the running flag is re-checked.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// WebSocket client for one Binance book-ticker stream.
///
/// Each client owns a single `<symbol>@bookTicker` subscription and writes
/// accepted ticks straight into the shared market state. Connection loss is
/// never fatal: the worker logs, backs off and reconnects until shutdown.
pub struct BinanceBookTickerClient {
    url: String,
    stream: String,
    counters: Counters,
}

impl BinanceBookTickerClient {
    pub fn for_symbol(ws_url: &str, symbol: &str, counters: Counters) -> Self {
        let stream = engine::symbols::stream_name(symbol);
        Self {
            url: format!("{}/{}", ws_url.trim_end_matches('/'), stream),
            stream,
            counters,
        }
    }

    /// Consumes messages from one established connection until the socket
    /// dies or shutdown is requested.
    async fn consume(
        &self,
        mut read: impl futures::Stream<Item = Result<tokio_tungstenite::tungstenite::Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
        market: &MarketState,
        running: &AtomicBool,
    ) {
        while running.load(Ordering::Relaxed) {
            let msg = match tokio::time::timeout(READ_TIMEOUT, read.next()).await {
                Err(_) => continue, // idle socket; re-check the running flag
                Ok(None) => {
                    info!(stream = %self.stream, "stream closed by server");
                    return;
                }
                Ok(Some(Ok(m))) => m,
                Ok(Some(Err(e))) => {
                    warn!(stream = %self.stream, error = ?e, "WebSocket read error");
                    return;
                }
            };

            if msg.is_ping() || msg.is_pong() {
                continue;
            }
            if !msg.is_text() {
                debug!(stream = %self.stream, "ignoring non-text message");
                continue;
            }
            let raw = match msg.to_text() {
                Ok(t) => t,
                Err(e) => {
                    warn!(stream = %self.stream, error = ?e, "failed to extract message text");
                    continue;
                }
            };

            match parser::parse_book_ticker(raw, now_ms()) {
                Ok(Some(update)) => {
                    if market.apply_top(&update) {
                        self.counters
                            .feed_updates
                            .fetch_add(1, Ordering::Relaxed);
                    } else {
                        self.counters
                            .feed_rejects
                            .fetch_add(1, Ordering::Relaxed);
                        debug!(symbol = %update.symbol, "tick rejected by order book");
                    }
                }
                Ok(None) => {
                    debug!(stream = %self.stream, "tick for unmonitored symbol");
                }
                Err(e) => {
                    self.counters
                        .feed_parse_errors
                        .fetch_add(1, Ordering::Relaxed);
                    warn!(stream = %self.stream, error = ?e, "failed to parse book ticker message");
                }
            }
        }
    }
}

#[async_trait]
impl MarketFeed for BinanceBookTickerClient {
    async fn run(&self, market: Arc<MarketState>, running: Arc<AtomicBool>) -> anyhow::Result<()> {
        info!(stream = %self.stream, url = %self.url, "feed worker starting");

        while running.load(Ordering::Relaxed) {
            match connect_async(self.url.as_str()).await {
                Ok((ws, _)) => {
                    info!(stream = %self.stream, "connected");
                    let (_write, read) = ws.split();
                    self.consume(read, &market, &running).await;
                }
                Err(e) => {
                    error!(stream = %self.stream, error = ?e, "WebSocket connection failed");
                }
            }

            if !running.load(Ordering::Relaxed) {
                break;
            }
            self.counters.feed_reconnects.fetch_add(1, Ordering::Relaxed);
            warn!(
                stream = %self.stream,
                retry_in = ?RECONNECT_DELAY,
                "disconnected; scheduling reconnect"
            );
            tokio::time::sleep(RECONNECT_DELAY).await;
        }

        info!(stream = %self.stream, "feed worker stopped");
        Ok(())
    }
}
