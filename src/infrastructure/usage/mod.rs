//! Usage metering infrastructure: live counters, reporting, and rollup

mod counter;
mod in_memory;
mod postgres_repository;
mod reporter;
mod rollup;

pub use counter::{UsageCounter, UsageCounterConfig};
pub use in_memory::InMemoryDailyUsageRepository;
pub use postgres_repository::PostgresDailyUsageRepository;
pub use reporter::{UsageReporter, DEFAULT_HISTORY_DAYS, MAX_HISTORY_DAYS};
pub use rollup::{RollupConfig, RollupJob, RollupReport};
