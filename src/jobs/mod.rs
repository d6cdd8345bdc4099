//! Batch fan-out jobs
//!
//! Two scheduled jobs sharing the vendor query pipeline: the daily
//! top-sellers broadcast and the price-drop sweep over favorites. The
//! scheduler invokes each as a parameterless entry point; single-flight per
//! job id is the scheduler's responsibility.

pub mod daily_top;
pub mod price_drop;

pub use daily_top::{run as run_daily_top_broadcast, fan_out, BroadcastRecipient};
pub use price_drop::run as run_price_drop_sweep;
