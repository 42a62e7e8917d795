use tracing::info;

use engine::Opportunity;

use crate::sink::OpportunitySink;

/// Emits every opportunity as one structured log line.
pub struct LogSink;

impl OpportunitySink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn on_opportunity(&self, opp: &Opportunity) -> anyhow::Result<()> {
        info!(
            route = %opp.route_name,
            direction = %opp.direction,
            profit_percent = opp.profit_percent,
            max_tradable = opp.max_tradable_amount,
            currency = %opp.max_tradable_currency,
            sequence = %opp.trade_sequence,
            "arbitrage opportunity"
        );
        Ok(())
    }
}
