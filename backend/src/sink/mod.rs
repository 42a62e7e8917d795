//! Opportunity sinks.
//!
//! A sink consumes each emitted opportunity exactly once per detection
//! tick. The contract is deliberately narrow: synchronous, quick (the
//! detector budgets 10 ms per delivery) and idempotent. Sink failures are
//! swallowed by the caller; a broken sink must never stall detection.

pub mod json;
pub mod log;

use engine::Opportunity;

pub trait OpportunitySink: Send + Sync {
    /// Short name used in logs and slow-sink warnings.
    fn name(&self) -> &'static str;

    fn on_opportunity(&self, opp: &Opportunity) -> anyhow::Result<()>;
}
