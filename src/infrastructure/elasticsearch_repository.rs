// Elasticsearch monitoring repository implementation
use crate::application::monitoring_repository::{
    MetricQuery, MonitoringError, MonitoringRepository, MonitoringResult, NodeScope,
};
use crate::domain::logstash_metrics::MetricAgg;
use crate::domain::metric_series::MetricBucket;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

const CLUSTER_UUID_FIELD: &str = "cluster_uuid";
const NODE_UUID_FIELD: &str = "logstash_stats.logstash.uuid";
const TIMESTAMP_FIELD: &str = "timestamp";
const HISTOGRAM_AGG: &str = "check";

#[derive(Debug, Clone)]
pub struct ElasticsearchRepository {
    host: String,
    username: Option<String>,
    password: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Option<Hits>,
    #[serde(default)]
    aggregations: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: Option<Value>,
}

impl ElasticsearchRepository {
    pub fn new(host: String, username: Option<String>, password: Option<String>) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            username,
            password,
            client: reqwest::Client::new(),
        }
    }

    fn build_search_url(&self, index_pattern: &str) -> String {
        format!(
            "{}/{}/_search?ignore_unavailable=true",
            self.host,
            urlencoding::encode(index_pattern)
        )
    }

    fn node_filter(scope: &NodeScope) -> Value {
        json!({
            "bool": {
                "filter": [
                    { "term": { CLUSTER_UUID_FIELD: scope.cluster_uuid } },
                    { "term": { NODE_UUID_FIELD: scope.logstash_uuid } },
                    {
                        "range": {
                            TIMESTAMP_FIELD: {
                                "gte": scope.min.timestamp_millis(),
                                "lte": scope.max.timestamp_millis(),
                                "format": "epoch_millis"
                            }
                        }
                    }
                ]
            }
        })
    }

    fn metric_body(query: &MetricQuery) -> Value {
        let metric_aggs: serde_json::Map<String, Value> = query
            .fields
            .iter()
            .enumerate()
            .map(|(i, (field, agg))| {
                let agg_type = match agg {
                    MetricAgg::Max => "max",
                    MetricAgg::Min => "min",
                    MetricAgg::Avg => "avg",
                };
                (format!("metric_{}", i), json!({ agg_type: { "field": field } }))
            })
            .collect();

        json!({
            "size": 0,
            "query": Self::node_filter(&query.scope),
            "aggs": {
                HISTOGRAM_AGG: {
                    "date_histogram": {
                        "field": TIMESTAMP_FIELD,
                        "interval": format!("{}s", query.bucket_seconds),
                        "min_doc_count": 1
                    },
                    "aggs": metric_aggs
                }
            }
        })
    }

    fn latest_stats_body(scope: &NodeScope) -> Value {
        json!({
            "size": 1,
            "query": Self::node_filter(scope),
            "sort": [{ TIMESTAMP_FIELD: { "order": "desc" } }]
        })
    }

    fn parse_buckets(query: &MetricQuery, aggregations: Option<&Value>) -> Vec<MetricBucket> {
        let buckets = aggregations
            .and_then(|a| a.pointer(&format!("/{}/buckets", HISTOGRAM_AGG)))
            .and_then(Value::as_array);

        let Some(buckets) = buckets else {
            return Vec::new();
        };

        buckets
            .iter()
            .filter_map(|raw| {
                let mut bucket = MetricBucket::new(raw.get("key")?.as_i64()?);
                for (i, (field, _)) in query.fields.iter().enumerate() {
                    let value = raw
                        .get(format!("metric_{}", i))
                        .and_then(|m| m.get("value"))
                        .and_then(Value::as_f64);
                    if let Some(value) = value {
                        bucket = bucket.with_value(field, value);
                    }
                }
                Some(bucket)
            })
            .collect()
    }

    async fn execute_search(
        &self,
        index_pattern: &str,
        body: &Value,
    ) -> MonitoringResult<SearchResponse> {
        let url = self.build_search_url(index_pattern);
        tracing::debug!("Executing monitoring search: {} {}", url, body);

        let mut request = self.client.post(&url).json(body);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| MonitoringError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("Monitoring search failed with status {}: {}", status, message);
            return Err(match status.as_u16() {
                401 | 403 => MonitoringError::Forbidden,
                code if code >= 500 => MonitoringError::Unavailable(message),
                code => MonitoringError::Backend {
                    status: code,
                    message,
                },
            });
        }

        let data = response
            .json::<SearchResponse>()
            .await
            .context("Failed to parse monitoring search response")?;
        Ok(data)
    }
}

#[async_trait]
impl MonitoringRepository for ElasticsearchRepository {
    async fn search_metric_buckets(
        &self,
        query: &MetricQuery,
    ) -> MonitoringResult<Vec<MetricBucket>> {
        let body = Self::metric_body(query);
        let response = self.execute_search(&query.scope.index_pattern, &body).await?;
        let buckets = Self::parse_buckets(query, response.aggregations.as_ref());

        tracing::debug!(
            "Got {} buckets for node {}",
            buckets.len(),
            query.scope.logstash_uuid
        );
        Ok(buckets)
    }

    async fn latest_node_stats(&self, scope: &NodeScope) -> MonitoringResult<Option<Value>> {
        let body = Self::latest_stats_body(scope);
        let response = self.execute_search(&scope.index_pattern, &body).await?;

        Ok(response
            .hits
            .and_then(|h| h.hits.into_iter().next())
            .and_then(|hit| hit.source))
    }
}
