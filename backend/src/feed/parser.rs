//! Binance book-ticker message parser.
//!
//! Each `<symbol>@bookTicker` stream delivers a flat JSON object per tick:
//!
//! ```jsonc
//! {
//!   "u": 400900217,       // order book update id
//!   "s": "ARBUSDT",       // exchange-native symbol
//!   "b": "0.19700000",    // best bid price
//!   "B": "216197.40",     // best bid quantity
//!   "a": "0.19710000",    // best ask price
//!   "A": "12194.70"       // best ask quantity
//! }
//! ```
//!
//! Prices and quantities arrive as decimal strings. The parser converts one
//! raw message into a canonical `TopUpdate` stamped with the local receive
//! clock; messages for symbols outside the known quote set yield `None`.

use serde::Deserialize;

use engine::symbols;
use engine::TopUpdate;

#[derive(Debug, Deserialize)]
struct BookTickerMsg {
    #[serde(rename = "u")]
    _update_id: u64,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "b")]
    bid_price: String,
    #[serde(rename = "B")]
    bid_qty: String,
    #[serde(rename = "a")]
    ask_price: String,
    #[serde(rename = "A")]
    ask_qty: String,
}

pub fn parse_book_ticker(raw: &str, recv_ts_ms: u64) -> anyhow::Result<Option<TopUpdate>> {
    let msg: BookTickerMsg = serde_json::from_str(raw)?;

    let Some(symbol) = symbols::normalize(&msg.symbol) else {
        return Ok(None);
    };

    Ok(Some(TopUpdate {
        symbol,
        bid_price: msg.bid_price.parse()?,
        bid_qty: msg.bid_qty.parse()?,
        ask_price: msg.ask_price.parse()?,
        ask_qty: msg.ask_qty.parse()?,
        ts_ms: recv_ts_ms,
    }))
}
