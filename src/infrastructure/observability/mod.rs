//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use self::config::MetricsConfig;
pub use metrics::{
    create_metrics_router, init_metrics, record_auth_failure, record_http_request,
    record_rate_limited, record_rollup_run, record_store_unavailable, record_usage_failure,
    PrometheusMetrics,
};
