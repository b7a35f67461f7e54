// Time series assembled from bucketed monitoring documents
use super::logstash_metrics::{Calculation, MetricDefinition, MetricDescriptor};
use serde::Serialize;
use std::collections::HashMap;

/// Buckets aimed for across the requested time range
const TARGET_BUCKETS: i64 = 100;

const BUCKET_STEPS_SECONDS: &[i64] = &[
    10, 30, 60, 300, 600, 1_800, 3_600, 10_800, 43_200, 86_400, 604_800,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSize {
    pub seconds: i64,
}

impl BucketSize {
    /// Smallest step that keeps the range near the target bucket count.
    pub fn for_range(range_ms: i64, min_interval_seconds: i64) -> Self {
        let range_seconds = (range_ms.max(0) + 999) / 1000;
        let wanted = ((range_seconds + TARGET_BUCKETS - 1) / TARGET_BUCKETS)
            .max(min_interval_seconds);
        let seconds = BUCKET_STEPS_SECONDS
            .iter()
            .copied()
            .find(|step| *step >= wanted)
            .unwrap_or(wanted);
        Self { seconds }
    }

    pub fn millis(&self) -> i64 {
        self.seconds * 1000
    }

    pub fn label(&self) -> String {
        match self.seconds {
            s if s % 86_400 == 0 => format!("{} d", s / 86_400),
            s if s % 3_600 == 0 => format!("{} hr", s / 3_600),
            s if s % 60 == 0 => format!("{} min", s / 60),
            s => format!("{} seconds", s),
        }
    }
}

/// One date-histogram bucket with the aggregated value of each field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricBucket {
    pub timestamp_ms: i64,
    pub values: HashMap<String, f64>,
}

impl MetricBucket {
    pub fn new(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            values: HashMap::new(),
        }
    }

    pub fn with_value(mut self, field: &str, value: f64) -> Self {
        self.values.insert(field.to_string(), value);
        self
    }

    fn value(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesTimeRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeries {
    #[serde(rename = "bucket_size")]
    pub bucket_size: String,
    pub time_range: SeriesTimeRange,
    pub metric: MetricDescriptor,
    pub data: Vec<(i64, Option<f64>)>,
}

impl MetricSeries {
    pub fn build(
        definition: &MetricDefinition,
        buckets: &[MetricBucket],
        bucket_size: BucketSize,
        time_range: SeriesTimeRange,
    ) -> Self {
        let values = calculate(&definition.calculation, buckets);
        let data = buckets
            .iter()
            .zip(values)
            .filter(|(bucket, _)| is_complete(bucket, bucket_size, time_range))
            .map(|(bucket, value)| (bucket.timestamp_ms, value))
            .collect();

        Self {
            bucket_size: bucket_size.label(),
            time_range,
            metric: definition.descriptor(),
            data,
        }
    }
}

fn is_complete(bucket: &MetricBucket, bucket_size: BucketSize, range: SeriesTimeRange) -> bool {
    bucket.timestamp_ms >= range.min && bucket.timestamp_ms + bucket_size.millis() <= range.max
}

fn calculate(calculation: &Calculation, buckets: &[MetricBucket]) -> Vec<Option<f64>> {
    match *calculation {
        Calculation::Value { field, .. } => buckets.iter().map(|b| b.value(field)).collect(),
        Calculation::Derivative { field } => rates(buckets, field),
        Calculation::DerivativeRatio {
            numerator,
            denominator,
        } => rates(buckets, numerator)
            .into_iter()
            .zip(rates(buckets, denominator))
            .map(|(num, den)| match (num, den) {
                (Some(num), Some(den)) if den != 0.0 => Some(num / den),
                _ => None,
            })
            .collect(),
        Calculation::CgroupQuota {
            usage,
            quota,
            period,
        } => rates(buckets, usage)
            .into_iter()
            .zip(buckets)
            .map(|(usage_rate, bucket)| {
                let quota = bucket.value(quota).filter(|q| *q > 0.0)?;
                let period = bucket.value(period).filter(|p| *p > 0.0)?;
                let allowed_nanos_per_second = quota / period * 1e9;
                Some(usage_rate? / allowed_nanos_per_second * 100.0)
            })
            .collect(),
    }
}

/// Per-second rate against the previous bucket, over the actual distance
/// between their keys since empty buckets are not returned.
/// Counter resets yield `None`.
fn rates(buckets: &[MetricBucket], field: &str) -> Vec<Option<f64>> {
    let mut previous: Option<(i64, f64)> = None;
    buckets
        .iter()
        .map(|bucket| {
            let current = bucket.value(field).map(|v| (bucket.timestamp_ms, v));
            let rate = match (previous, current) {
                (Some((prev_ts, prev)), Some((cur_ts, cur))) if cur >= prev && cur_ts > prev_ts => {
                    Some((cur - prev) / ((cur_ts - prev_ts) as f64 / 1000.0))
                }
                _ => None,
            };
            previous = current;
            rate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::logstash_metrics::metric_definition;

    const IN: &str = "logstash_stats.events.in";
    const OUT: &str = "logstash_stats.events.out";
    const TEN_SECONDS: BucketSize = BucketSize { seconds: 10 };

    fn range(buckets: i64) -> SeriesTimeRange {
        SeriesTimeRange {
            min: 0,
            max: buckets * 10_000,
        }
    }

    fn build(key: &str, buckets: &[MetricBucket], range_buckets: i64) -> MetricSeries {
        let definition = metric_definition(key).unwrap();
        MetricSeries::build(definition, buckets, TEN_SECONDS, range(range_buckets))
    }

    fn counter(points: &[(i64, f64)]) -> Vec<MetricBucket> {
        points
            .iter()
            .map(|(ts, v)| MetricBucket::new(*ts).with_value(IN, *v))
            .collect()
    }

    #[test]
    fn test_bucket_size_for_range() {
        // one hour over 100 buckets is 36s, rounded up to 60s
        assert_eq!(BucketSize::for_range(3_600_000, 10).seconds, 60);
        assert_eq!(BucketSize::for_range(60_000, 10).seconds, 10);
        assert_eq!(BucketSize::for_range(60_000, 30).seconds, 30);
        assert_eq!(BucketSize::for_range(0, 10).label(), "10 seconds");
        assert_eq!(BucketSize { seconds: 10_800 }.label(), "3 hr");
    }

    #[test]
    fn test_derivative_series() {
        let buckets = counter(&[(0, 100.0), (10_000, 200.0), (20_000, 50.0), (30_000, 150.0)]);

        let series = build("logstash_node_events_input_rate", &buckets, 4);

        assert_eq!(
            series.data,
            vec![(0, None), (10_000, Some(10.0)), (20_000, None), (30_000, Some(10.0))]
        );
        assert_eq!(series.bucket_size, "10 seconds");
    }

    #[test]
    fn test_derivative_spans_missing_buckets() {
        // no documents in the 10s and 30s buckets
        let buckets = counter(&[(0, 0.0), (20_000, 200.0), (40_000, 400.0), (50_000, 500.0)]);

        let series = build("logstash_node_events_input_rate", &buckets, 6);

        assert_eq!(
            series.data,
            vec![(0, None), (20_000, Some(10.0)), (40_000, Some(10.0)), (50_000, Some(10.0))]
        );
    }

    #[test]
    fn test_sparse_histogram_drops_partial_edges() {
        let buckets = counter(&[(-5_000, 0.0), (25_000, 300.0), (55_000, 600.0)]);

        let series = build("logstash_node_events_input_rate", &buckets, 6);

        // the leading partial bucket still anchors the first rate
        assert_eq!(series.data, vec![(25_000, Some(10.0))]);
    }

    #[test]
    fn test_partial_buckets_are_dropped() {
        let buckets: Vec<MetricBucket> = (0..4)
            .map(|i| MetricBucket::new(i * 10_000 - 5_000).with_value(IN, i as f64))
            .collect();

        let series = build("logstash_node_events_input_rate", &buckets, 3);

        let timestamps: Vec<i64> = series.data.iter().map(|(ts, _)| *ts).collect();
        assert_eq!(timestamps, vec![5_000, 15_000]);
    }

    #[test]
    fn test_latency_ratio() {
        let duration = "logstash_stats.events.duration_in_millis";
        let buckets = vec![
            MetricBucket::new(0).with_value(duration, 0.0).with_value(OUT, 0.0),
            MetricBucket::new(10_000).with_value(duration, 500.0).with_value(OUT, 100.0),
            MetricBucket::new(20_000).with_value(duration, 500.0).with_value(OUT, 100.0),
        ];

        let series = build("logstash_node_events_latency", &buckets, 3);
        assert_eq!(series.data, vec![(0, None), (10_000, Some(5.0)), (20_000, None)]);
    }

    #[test]
    fn test_cgroup_quota_percentage() {
        let usage = "logstash_stats.os.cgroup.cpuacct.usage_nanos";
        let quota = "logstash_stats.os.cgroup.cpu.cfs_quota_micros";
        let period = "logstash_stats.os.cgroup.cpu.cfs_period_micros";
        let bucket = |ts: i64, used: f64, limit: f64| {
            MetricBucket::new(ts)
                .with_value(usage, used)
                .with_value(quota, limit)
                .with_value(period, 100_000.0)
        };
        let buckets = vec![
            bucket(0, 0.0, 50_000.0),
            bucket(10_000, 2.5e9, 50_000.0),
            bucket(20_000, 5.0e9, -1.0),
            // 30s bucket missing
            bucket(40_000, 1.0e10, 50_000.0),
        ];

        let series = build("logstash_node_cgroup_quota_as_cpu_utilization", &buckets, 5);
        // 0.25 cpu-seconds per second against a half-cpu quota
        assert_eq!(
            series.data,
            vec![(0, None), (10_000, Some(50.0)), (20_000, None), (40_000, Some(50.0))]
        );
    }

    #[test]
    fn test_series_serialization_shape() {
        let buckets =
            vec![MetricBucket::new(0).with_value("logstash_stats.process.cpu.percent", 12.5)];

        let series = build("logstash_node_cpu_utilization", &buckets, 1);
        let json = serde_json::to_value(&series).unwrap();

        assert_eq!(json["bucket_size"], "10 seconds");
        assert_eq!(json["timeRange"]["max"], 10_000);
        assert_eq!(json["metric"]["metricAgg"], "max");
        assert_eq!(json["data"][0], serde_json::json!([0, 12.5]));
    }
}
