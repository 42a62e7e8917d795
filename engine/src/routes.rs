//! Static catalog of evaluable trade routes.
//!
//! Three route families exist:
//!
//! - `TwoLeg`: an ARB cross pair against its quote's USDT pair, compared
//!   with the direct ARB/USDT book. Forward buys the implied side and sells
//!   direct; Reverse buys direct and sells the implied side. Both directions
//!   are distinct catalog entries.
//! - `DirectStable`: an ARB stablecoin pair compared directly with
//!   ARB/USDT; the profitable direction is chosen at evaluation time.
//! - `ThreeLeg`: buy ARB with the starting quote currency, rotate through a
//!   bridge pair, sell the bridge currency for USDT. Single direction.
//!
//! The catalog is constant for the process lifetime and its iteration order
//! is stable, which makes best-of-tick tie-breaking deterministic. Adding a
//! route family means a new variant here and one new evaluator arm.

use crate::symbols;

/// Trade direction of an evaluated route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Buy the implied side, sell the direct ARB/USDT book.
    Forward,
    /// Buy the direct ARB/USDT book, sell the implied side.
    Reverse,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evaluable trade route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    TwoLeg {
        arb_pair: &'static str,
        cross_pair: &'static str,
        direction: Direction,
    },
    DirectStable {
        stable_pair: &'static str,
    },
    ThreeLeg {
        start_pair: &'static str,
        middle_pair: &'static str,
        final_pair: &'static str,
    },
}

const fn two_leg(arb_pair: &'static str, cross_pair: &'static str, direction: Direction) -> Route {
    Route::TwoLeg {
        arb_pair,
        cross_pair,
        direction,
    }
}

const fn three_leg(
    start_pair: &'static str,
    middle_pair: &'static str,
    final_pair: &'static str,
) -> Route {
    Route::ThreeLeg {
        start_pair,
        middle_pair,
        final_pair,
    }
}

/// Every route the detector evaluates, in stable order.
pub const CATALOG: &[Route] = &[
    two_leg("ARB/BTC", "BTC/USDT", Direction::Forward),
    two_leg("ARB/BTC", "BTC/USDT", Direction::Reverse),
    two_leg("ARB/ETH", "ETH/USDT", Direction::Forward),
    two_leg("ARB/ETH", "ETH/USDT", Direction::Reverse),
    two_leg("ARB/EUR", "EUR/USDT", Direction::Forward),
    two_leg("ARB/EUR", "EUR/USDT", Direction::Reverse),
    two_leg("ARB/TRY", "TRY/USDT", Direction::Forward),
    two_leg("ARB/TRY", "TRY/USDT", Direction::Reverse),
    Route::DirectStable {
        stable_pair: "ARB/FDUSD",
    },
    Route::DirectStable {
        stable_pair: "ARB/USDC",
    },
    Route::DirectStable {
        stable_pair: "ARB/TUSD",
    },
    three_leg("ARB/EUR", "ARB/BTC", "BTC/USDT"),
    three_leg("ARB/EUR", "ARB/ETH", "ETH/USDT"),
    three_leg("ARB/TRY", "ARB/BTC", "BTC/USDT"),
    three_leg("ARB/TRY", "ARB/ETH", "ETH/USDT"),
];

impl Route {
    /// Human-readable route identifier used in logs and sink output.
    pub fn name(&self) -> String {
        match self {
            Route::TwoLeg {
                arb_pair,
                cross_pair,
                direction,
            } => format!("{arb_pair} -> {cross_pair} ({direction})"),
            Route::DirectStable { stable_pair } => {
                format!("{stable_pair} vs {}", symbols::DIRECT_PAIR)
            }
            Route::ThreeLeg {
                start_pair,
                middle_pair,
                final_pair,
            } => format!("{start_pair} -> {middle_pair} -> {final_pair}"),
        }
    }

    /// Every symbol whose book the evaluation reads.
    pub fn referenced_symbols(&self) -> Vec<String> {
        match self {
            Route::TwoLeg {
                arb_pair,
                cross_pair,
                ..
            } => vec![
                (*arb_pair).to_string(),
                (*cross_pair).to_string(),
                symbols::DIRECT_PAIR.to_string(),
            ],
            Route::DirectStable { stable_pair } => vec![
                (*stable_pair).to_string(),
                symbols::DIRECT_PAIR.to_string(),
            ],
            Route::ThreeLeg {
                start_pair,
                middle_pair,
                final_pair,
            } => {
                let mut syms = vec![
                    (*start_pair).to_string(),
                    (*middle_pair).to_string(),
                    (*final_pair).to_string(),
                ];
                if let Some(pair) = Self::comparison_pair(start_pair) {
                    syms.push(pair);
                }
                syms
            }
        }
    }

    /// The `QUOTE/USDT` book a three-leg route is compared against.
    pub fn comparison_pair(start_pair: &str) -> Option<String> {
        let quote = symbols::quote_asset(start_pair)?;
        Some(format!("{quote}/USDT"))
    }
}
