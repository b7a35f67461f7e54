// Repository trait for monitoring data access
use crate::domain::logstash_metrics::MetricAgg;
use crate::domain::metric_series::MetricBucket;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum MonitoringError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Insufficient user permissions for monitoring data")]
    Forbidden,

    #[error("monitoring data backend is unavailable: {0}")]
    Unavailable(String),

    #[error("monitoring data query failed with status {status}: {message}")]
    Backend { status: u16, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type MonitoringResult<T> = Result<T, MonitoringError>;

/// Identifies one Logstash node inside a monitored cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeScope {
    pub index_pattern: String,
    pub cluster_uuid: String,
    pub logstash_uuid: String,
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
}

/// Date histogram over `scope`, aggregating every field in each bucket
#[derive(Debug, Clone, PartialEq)]
pub struct MetricQuery {
    pub scope: NodeScope,
    pub bucket_seconds: i64,
    pub fields: Vec<(&'static str, MetricAgg)>,
}

#[async_trait]
pub trait MonitoringRepository: Send + Sync {
    /// Buckets of the node's stats documents, oldest first
    async fn search_metric_buckets(
        &self,
        query: &MetricQuery,
    ) -> MonitoringResult<Vec<MetricBucket>>;

    /// Source of the newest stats document for the node, if any
    async fn latest_node_stats(
        &self,
        scope: &NodeScope,
    ) -> MonitoringResult<Option<serde_json::Value>>;
}
