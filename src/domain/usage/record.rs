//! Usage records and summaries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::api_key::ApiKeyId;

/// Point-in-time request/error counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub requests: u64,
    pub errors: u64,
}

impl UsageSnapshot {
    pub fn new(requests: u64, errors: u64) -> Self {
        Self { requests, errors }
    }

    pub fn is_empty(&self) -> bool {
        self.requests == 0 && self.errors == 0
    }
}

/// Durable per-key, per-day aggregate written by the rollup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsageRecord {
    pub key_id: ApiKeyId,
    pub date: NaiveDate,
    pub request_count: u64,
    pub error_count: u64,
}

impl DailyUsageRecord {
    pub fn from_snapshot(key_id: ApiKeyId, date: NaiveDate, snapshot: UsageSnapshot) -> Self {
        Self {
            key_id,
            date,
            request_count: snapshot.requests,
            error_count: snapshot.errors,
        }
    }
}

/// Requests in one hour of today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyUsage {
    pub hour: u32,
    pub requests: u64,
    pub errors: u64,
}

/// Totals for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub requests: u64,
    pub errors: u64,
}

/// Live view of the current day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodayUsage {
    pub date: NaiveDate,
    pub requests: u64,
    pub errors: u64,
    pub hourly: Vec<HourlyUsage>,
}

/// Human-facing usage summary for one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub key_id: ApiKeyId,
    pub today: TodayUsage,
    /// Prior days, oldest first, from durable records
    pub history: Vec<DailyUsage>,
    pub total_requests: u64,
    pub total_errors: u64,
}

impl UsageSummary {
    pub fn new(key_id: ApiKeyId, today: TodayUsage, history: Vec<DailyUsage>) -> Self {
        let total_requests = today.requests + history.iter().map(|d| d.requests).sum::<u64>();
        let total_errors = today.errors + history.iter().map(|d| d.errors).sum::<u64>();

        Self {
            key_id,
            today,
            history,
            total_requests,
            total_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_empty() {
        assert!(UsageSnapshot::default().is_empty());
        assert!(!UsageSnapshot::new(0, 1).is_empty());
    }

    #[test]
    fn test_summary_totals() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let today = TodayUsage {
            date: day,
            requests: 10,
            errors: 1,
            hourly: vec![],
        };
        let history = vec![
            DailyUsage {
                date: day.pred_opt().unwrap(),
                requests: 5,
                errors: 2,
            },
            DailyUsage {
                date: day.pred_opt().unwrap().pred_opt().unwrap(),
                requests: 0,
                errors: 0,
            },
        ];

        let summary = UsageSummary::new(ApiKeyId::generate(), today, history);
        assert_eq!(summary.total_requests, 15);
        assert_eq!(summary.total_errors, 3);
    }
}
