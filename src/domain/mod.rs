// Domain layer - Value types and pure state
pub mod dashboard;
pub mod dashboard_state;
pub mod logstash_metrics;
pub mod metric_series;
pub mod saved_dashboard;
