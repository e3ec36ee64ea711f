//! Usage metering domain
//!
//! Ephemeral per-key counters (day and hour buckets) and the durable daily
//! aggregates the rollup derives from them.

mod keys;
mod record;
mod repository;

pub use keys::{daily_counter_key, hourly_counter_key, rate_limit_key, UsageMetric};
pub use record::{
    DailyUsage, DailyUsageRecord, HourlyUsage, TodayUsage, UsageSnapshot, UsageSummary,
};
pub use repository::DailyUsageRepository;
