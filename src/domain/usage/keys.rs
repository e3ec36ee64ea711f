//! Counter key layout for usage metering
//!
//! `usage:{key_id}:{YYYY-MM-DD}:{metric}` for daily totals and
//! `usage:{key_id}:{YYYY-MM-DD}:{HH}:{metric}` for hourly buckets.

use chrono::NaiveDate;

use crate::domain::api_key::ApiKeyId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageMetric {
    Requests,
    Errors,
}

impl UsageMetric {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Requests => "requests",
            Self::Errors => "errors",
        }
    }
}

pub fn daily_counter_key(key_id: &ApiKeyId, date: NaiveDate, metric: UsageMetric) -> String {
    format!(
        "usage:{}:{}:{}",
        key_id,
        date.format("%Y-%m-%d"),
        metric.as_str()
    )
}

pub fn hourly_counter_key(
    key_id: &ApiKeyId,
    date: NaiveDate,
    hour: u32,
    metric: UsageMetric,
) -> String {
    format!(
        "usage:{}:{}:{:02}:{}",
        key_id,
        date.format("%Y-%m-%d"),
        hour,
        metric.as_str()
    )
}

/// Sliding-window key for a credential
pub fn rate_limit_key(key_id: &ApiKeyId) -> String {
    format!("ratelimit:{}", key_id)
}
