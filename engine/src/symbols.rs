//! Symbol registry.
//!
//! The trading universe is fixed at startup: every ARB pair the detector
//! watches plus the cross pairs needed to synthesize an implied ARB/USDT
//! price. Symbols are canonical `BASE/QUOTE` strings; this module also owns
//! the mapping to and from the exchange's native encoding.

/// The asset every route begins and ends in.
pub const BASE_ASSET: &str = "ARB";

/// The direct pair every comparison is anchored to.
pub const DIRECT_PAIR: &str = "ARB/USDT";

/// All ARB trading pairs under observation.
pub const ARB_PAIRS: &[&str] = &[
    "ARB/USDT",
    "ARB/BTC",
    "ARB/ETH",
    "ARB/FDUSD",
    "ARB/USDC",
    "ARB/TUSD",
    "ARB/TRY",
    "ARB/EUR",
];

/// Cross pairs used to convert quote currencies into USDT.
pub const CROSS_PAIRS: &[&str] = &["BTC/USDT", "ETH/USDT", "EUR/USDT", "TRY/USDT"];

/// Quote currencies the exchange may suffix a raw symbol with.
pub const QUOTE_ASSETS: &[&str] = &[
    "USDT", "USDC", "FDUSD", "TUSD", "BTC", "ETH", "EUR", "TRY", "BNB", "BUSD",
];

/// Every symbol that needs a live order book.
pub fn all_symbols() -> Vec<&'static str> {
    let mut all = Vec::with_capacity(ARB_PAIRS.len() + CROSS_PAIRS.len());
    all.extend_from_slice(ARB_PAIRS);
    all.extend_from_slice(CROSS_PAIRS);
    all
}

/// Exchange stream name for a canonical symbol: `ARB/USDT` -> `arbusdt@bookTicker`.
pub fn stream_name(symbol: &str) -> String {
    let compact: String = symbol
        .chars()
        .filter(|c| *c != '/')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    format!("{compact}@bookTicker")
}

/// Normalizes an exchange-native symbol (`ARBUSDT`) to canonical form
/// (`ARB/USDT`) by matching the longest known quote-currency suffix.
///
/// Returns `None` when no known quote matches or the base would be empty.
pub fn normalize(exchange_symbol: &str) -> Option<String> {
    let upper = exchange_symbol.to_ascii_uppercase();

    let mut best: Option<&str> = None;
    for quote in QUOTE_ASSETS {
        if upper.len() > quote.len() && upper.ends_with(quote) {
            match best {
                Some(b) if b.len() >= quote.len() => {}
                _ => best = Some(quote),
            }
        }
    }

    best.map(|quote| {
        let base = &upper[..upper.len() - quote.len()];
        format!("{base}/{quote}")
    })
}

/// Quote currency of a canonical symbol (`ARB/EUR` -> `EUR`).
pub fn quote_asset(symbol: &str) -> Option<&str> {
    let (_, quote) = symbol.split_once('/')?;
    if quote.is_empty() {
        None
    } else {
        Some(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_covers_every_cross_rate() {
        let all = all_symbols();
        for pair in ["ARB/USDT", "ARB/EUR", "EUR/USDT", "TRY/USDT", "BTC/USDT"] {
            assert!(all.contains(&pair), "missing {pair}");
        }
        assert_eq!(all.len(), ARB_PAIRS.len() + CROSS_PAIRS.len());
    }

    #[test]
    fn stream_name_is_lowercase_without_slash() {
        assert_eq!(stream_name("ARB/USDT"), "arbusdt@bookTicker");
        assert_eq!(stream_name("BTC/USDT"), "btcusdt@bookTicker");
    }

    #[test]
    fn normalize_picks_longest_quote_suffix() {
        // ARBFDUSD could read as base ARBF + USD-ish quote; FDUSD must win.
        assert_eq!(normalize("ARBFDUSD").as_deref(), Some("ARB/FDUSD"));
        assert_eq!(normalize("ARBUSDT").as_deref(), Some("ARB/USDT"));
        assert_eq!(normalize("arbusdt").as_deref(), Some("ARB/USDT"));
        assert_eq!(normalize("BTCUSDT").as_deref(), Some("BTC/USDT"));
    }

    #[test]
    fn normalize_rejects_unknown_or_empty_base() {
        assert_eq!(normalize("USDT"), None);
        assert_eq!(normalize("ARBXYZ"), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn quote_asset_splits_canonical_symbols() {
        assert_eq!(quote_asset("ARB/EUR"), Some("EUR"));
        assert_eq!(quote_asset("ARBEUR"), None);
    }
}
