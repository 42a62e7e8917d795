//! JSON file persistence for emitted opportunities.
//!
//! One file per opportunity, named `arbitrage_YYYY-MM-DD_HH-MM-SS.json` in
//! local time. Prices are written with eight decimals of precision.

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use serde_json::{json, Map, Value};

use engine::Opportunity;

use crate::error::AppError;
use crate::sink::OpportunitySink;

pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    /// Creates the sink, preparing the output directory up front so a bad
    /// path fails at startup instead of on the first opportunity.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| AppError::OutputDir {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn document(opp: &Opportunity, now: chrono::DateTime<Local>) -> Value {
        let mut prices = Map::new();
        for p in &opp.prices {
            prices.insert(
                p.symbol.clone(),
                json!({ "bid": round8(p.bid), "ask": round8(p.ask) }),
            );
        }

        json!({
            "timestamp_ms": now.timestamp_millis(),
            "timestamp": now.format("%Y-%m-%d %H:%M:%S").to_string(),
            "direction": opp.direction.as_str(),
            "route_name": opp.route_name,
            "trade_sequence": opp.trade_sequence,
            "profit_percent": round8(opp.profit_percent),
            "max_tradable_amount": round8(opp.max_tradable_amount),
            "max_tradable_currency": opp.max_tradable_currency,
            "prices": prices,
        })
    }
}

impl OpportunitySink for JsonFileSink {
    fn name(&self) -> &'static str {
        "json-file"
    }

    fn on_opportunity(&self, opp: &Opportunity) -> anyhow::Result<()> {
        let now = Local::now();
        let filename = format!("arbitrage_{}.json", now.format("%Y-%m-%d_%H-%M-%S"));
        let doc = Self::document(opp, now);
        fs::write(
            self.dir.join(filename),
            serde_json::to_string_pretty(&doc)?,
        )?;
        Ok(())
    }
}

/// Clamps a value to eight decimals so serialized prices stay readable.
fn round8(v: f64) -> f64 {
    (v * 1e8).round() / 1e8
}
