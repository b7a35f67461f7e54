// Logstash node service - Use case for the node detail page
use crate::application::monitoring_repository::{
    MetricQuery, MonitoringError, MonitoringRepository, MonitoringResult, NodeScope,
};
use crate::domain::logstash_metrics::{
    MetricDefinition, MetricSetEntry, advanced_metric_set, metric_definition, overview_metric_set,
};
use crate::domain::metric_series::{BucketSize, MetricSeries, SeriesTimeRange};
use crate::infrastructure::config::{MonitoringSettings, prefix_index_pattern};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A node counts as available when it reported within this window
const AVAILABILITY_WINDOW_MINUTES: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRequest {
    pub cluster_uuid: String,
    pub logstash_uuid: String,
    pub ccs: Option<String>,
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
    pub is_advanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogstashNodeResponse {
    pub metrics: BTreeMap<String, Vec<MetricSeries>>,
    pub node_summary: Value,
}

#[derive(Clone)]
pub struct LogstashNodeService {
    repository: Arc<dyn MonitoringRepository>,
    settings: MonitoringSettings,
}

impl LogstashNodeService {
    pub fn new(repository: Arc<dyn MonitoringRepository>, settings: MonitoringSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    /// Fetches metrics and the node summary concurrently; the first failure
    /// aborts the whole response.
    pub async fn get_node(&self, request: &NodeRequest) -> MonitoringResult<LogstashNodeResponse> {
        if request.max < request.min {
            return Err(MonitoringError::InvalidRequest(
                "timeRange.max must not be before timeRange.min".to_string(),
            ));
        }

        let scope = NodeScope {
            index_pattern: prefix_index_pattern(&self.settings, request.ccs.as_deref()),
            cluster_uuid: request.cluster_uuid.clone(),
            logstash_uuid: request.logstash_uuid.clone(),
            min: request.min,
            max: request.max,
        };
        let metric_set = self.metric_set(request.is_advanced);

        tracing::debug!(
            index = %scope.index_pattern,
            cluster = %scope.cluster_uuid,
            node = %scope.logstash_uuid,
            advanced = request.is_advanced,
            "fetching logstash node"
        );

        let (metrics, node_summary) =
            futures::try_join!(self.get_metrics(&scope, &metric_set), self.get_node_info(&scope))?;

        Ok(LogstashNodeResponse {
            metrics,
            node_summary,
        })
    }

    pub fn metric_set(&self, is_advanced: bool) -> Vec<MetricSetEntry> {
        if is_advanced {
            advanced_metric_set()
        } else {
            overview_metric_set(self.settings.container_logstash_enabled)
        }
    }

    async fn get_metrics(
        &self,
        scope: &NodeScope,
        metric_set: &[MetricSetEntry],
    ) -> MonitoringResult<BTreeMap<String, Vec<MetricSeries>>> {
        let bucket_size = BucketSize::for_range(
            (scope.max - scope.min).num_milliseconds(),
            self.settings.min_interval_seconds,
        );
        let time_range = SeriesTimeRange {
            min: scope.min.timestamp_millis(),
            max: scope.max.timestamp_millis(),
        };

        let lookups = metric_set.iter().map(|entry| async move {
            let definitions = entry
                .keys
                .iter()
                .map(|key| {
                    metric_definition(key).ok_or_else(|| anyhow::anyhow!("Unknown metric {}", key))
                })
                .collect::<anyhow::Result<Vec<&MetricDefinition>>>()?;

            let mut fields = Vec::new();
            for definition in &definitions {
                for field in definition.calculation.fields() {
                    if !fields.contains(&field) {
                        fields.push(field);
                    }
                }
            }

            let query = MetricQuery {
                scope: scope.clone(),
                bucket_seconds: bucket_size.seconds,
                fields,
            };
            let buckets = self.repository.search_metric_buckets(&query).await?;
            let series = definitions
                .iter()
                .map(|d| MetricSeries::build(d, &buckets, bucket_size, time_range))
                .collect();

            Ok::<_, MonitoringError>((entry.name.to_string(), series))
        });

        Ok(futures::future::try_join_all(lookups)
            .await?
            .into_iter()
            .collect())
    }

    async fn get_node_info(&self, scope: &NodeScope) -> MonitoringResult<Value> {
        let source = self.repository.latest_node_stats(scope).await?;
        Ok(summarize_node(source.as_ref(), Utc::now()))
    }
}

/// Flattens the newest stats document into the node summary.
pub fn summarize_node(source: Option<&Value>, now: DateTime<Utc>) -> Value {
    let stats = source.and_then(|s| s.get("logstash_stats"));

    let mut summary: Map<String, Value> = stats
        .and_then(|s| s.get("logstash"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    for key in ["events", "reloads", "queue"] {
        if let Some(value) = stats.and_then(|s| s.get(key)) {
            summary.insert(key.to_string(), value.clone());
        }
    }

    let details = [
        ("uptime", "/jvm/uptime_in_millis"),
        ("heap_used_percent", "/jvm/mem/heap_used_percent"),
        ("cpu_usage", "/process/cpu/percent"),
        ("load_average", "/os/cpu/load_average"),
    ];
    for (name, pointer) in details {
        if let Some(value) = stats.and_then(|s| s.pointer(pointer)) {
            summary.insert(name.to_string(), value.clone());
        }
    }

    let last_seen = source
        .and_then(|s| s.get("timestamp"))
        .and_then(Value::as_str)
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc));
    let available = last_seen
        .map(|ts| ts > now - Duration::minutes(AVAILABILITY_WINDOW_MINUTES))
        .unwrap_or(false);
    summary.insert("availability".to_string(), Value::Bool(available));

    Value::Object(summary)
}
