// Logstash node metric catalog and metric sets
use serde::Serialize;

/// Entry of the overview set whose keys depend on container monitoring.
pub const NODE_CPU_METRIC: &str = "logstash_node_cpu_metric";
pub const NODE_CPU_UTILIZATION: &str = "logstash_node_cpu_utilization";
pub const NODE_CGROUP_QUOTA_CPU: &str = "logstash_node_cgroup_quota_as_cpu_utilization";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricAgg {
    Max,
    Min,
    Avg,
}

/// How a series value is derived from the bucketed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calculation {
    Value { field: &'static str, agg: MetricAgg },
    Derivative { field: &'static str },
    DerivativeRatio {
        numerator: &'static str,
        denominator: &'static str,
    },
    CgroupQuota {
        usage: &'static str,
        quota: &'static str,
        period: &'static str,
    },
}

impl Calculation {
    /// Fields the search backend must aggregate for this calculation
    pub fn fields(&self) -> Vec<(&'static str, MetricAgg)> {
        match *self {
            Calculation::Value { field, agg } => vec![(field, agg)],
            Calculation::Derivative { field } => vec![(field, MetricAgg::Max)],
            Calculation::DerivativeRatio {
                numerator,
                denominator,
            } => vec![(numerator, MetricAgg::Max), (denominator, MetricAgg::Max)],
            Calculation::CgroupQuota {
                usage,
                quota,
                period,
            } => vec![
                (usage, MetricAgg::Max),
                (quota, MetricAgg::Min),
                (period, MetricAgg::Max),
            ],
        }
    }

    pub fn is_derivative(&self) -> bool {
        !matches!(self, Calculation::Value { .. })
    }

    pub fn has_calculation(&self) -> bool {
        matches!(
            self,
            Calculation::DerivativeRatio { .. } | Calculation::CgroupQuota { .. }
        )
    }

    fn primary_field(&self) -> (&'static str, MetricAgg) {
        self.fields()[0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricDefinition {
    pub key: &'static str,
    pub title: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub units: &'static str,
    pub format: &'static str,
    pub calculation: Calculation,
}

/// Metric descriptor as it appears in a series of the route response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDescriptor {
    pub app: &'static str,
    pub field: &'static str,
    pub metric_agg: MetricAgg,
    pub label: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub units: &'static str,
    pub format: &'static str,
    pub has_calculation: bool,
    pub is_derivative: bool,
}

impl MetricDefinition {
    pub fn descriptor(&self) -> MetricDescriptor {
        let (field, metric_agg) = self.calculation.primary_field();
        MetricDescriptor {
            app: "logstash",
            field,
            metric_agg,
            label: self.label,
            title: self.title,
            description: self.description,
            units: self.units,
            format: self.format,
            has_calculation: self.calculation.has_calculation(),
            is_derivative: self.calculation.is_derivative(),
        }
    }
}

const SMALL_FLOAT: &str = "0,0.[00]";
const LARGE_BYTES: &str = "0,0.0 b";
const LARGE_ABBREVIATED: &str = "0,0.[0]a";

const CATALOG: &[MetricDefinition] = &[
    MetricDefinition {
        key: "logstash_node_events_input_rate",
        title: "Events Rate",
        label: "Events Received Rate",
        description: "Number of events received per second by all inputs.",
        units: "e/s",
        format: LARGE_ABBREVIATED,
        calculation: Calculation::Derivative {
            field: "logstash_stats.events.in",
        },
    },
    MetricDefinition {
        key: "logstash_node_events_output_rate",
        title: "Events Rate",
        label: "Events Emitted Rate",
        description: "Number of events emitted per second by all outputs.",
        units: "e/s",
        format: LARGE_ABBREVIATED,
        calculation: Calculation::Derivative {
            field: "logstash_stats.events.out",
        },
    },
    MetricDefinition {
        key: "logstash_node_events_latency",
        title: "Event Latency",
        label: "Event Latency",
        description: "Average time spent by events in filter and output stages.",
        units: "ms",
        format: SMALL_FLOAT,
        calculation: Calculation::DerivativeRatio {
            numerator: "logstash_stats.events.duration_in_millis",
            denominator: "logstash_stats.events.out",
        },
    },
    MetricDefinition {
        key: NODE_CPU_UTILIZATION,
        title: "CPU Utilization",
        label: "CPU Utilization",
        description: "CPU usage of the Logstash process as reported by the OS.",
        units: "%",
        format: SMALL_FLOAT,
        calculation: Calculation::Value {
            field: "logstash_stats.process.cpu.percent",
            agg: MetricAgg::Max,
        },
    },
    MetricDefinition {
        key: NODE_CGROUP_QUOTA_CPU,
        title: "CPU Utilization",
        label: "Cgroup CPU Utilization",
        description: "CPU usage relative to the container's CPU quota.",
        units: "%",
        format: SMALL_FLOAT,
        calculation: Calculation::CgroupQuota {
            usage: "logstash_stats.os.cgroup.cpuacct.usage_nanos",
            quota: "logstash_stats.os.cgroup.cpu.cfs_quota_micros",
            period: "logstash_stats.os.cgroup.cpu.cfs_period_micros",
        },
    },
    MetricDefinition {
        key: "logstash_node_jvm_mem_heap_max_in_bytes",
        title: "JVM Heap",
        label: "Max Heap",
        description: "Total heap available to Logstash in the JVM.",
        units: "B",
        format: LARGE_BYTES,
        calculation: Calculation::Value {
            field: "logstash_stats.jvm.mem.heap_max_in_bytes",
            agg: MetricAgg::Max,
        },
    },
    MetricDefinition {
        key: "logstash_node_jvm_mem_heap_used_in_bytes",
        title: "JVM Heap",
        label: "Used Heap",
        description: "Total heap used by Logstash in the JVM.",
        units: "B",
        format: LARGE_BYTES,
        calculation: Calculation::Value {
            field: "logstash_stats.jvm.mem.heap_used_in_bytes",
            agg: MetricAgg::Max,
        },
    },
    MetricDefinition {
        key: "logstash_os_load_1m",
        title: "System Load",
        label: "1m",
        description: "Load average over the last minute.",
        units: "",
        format: SMALL_FLOAT,
        calculation: Calculation::Value {
            field: "logstash_stats.os.cpu.load_average.1m",
            agg: MetricAgg::Max,
        },
    },
    MetricDefinition {
        key: "logstash_os_load_5m",
        title: "System Load",
        label: "5m",
        description: "Load average over the last 5 minutes.",
        units: "",
        format: SMALL_FLOAT,
        calculation: Calculation::Value {
            field: "logstash_stats.os.cpu.load_average.5m",
            agg: MetricAgg::Max,
        },
    },
    MetricDefinition {
        key: "logstash_os_load_15m",
        title: "System Load",
        label: "15m",
        description: "Load average over the last 15 minutes.",
        units: "",
        format: SMALL_FLOAT,
        calculation: Calculation::Value {
            field: "logstash_stats.os.cpu.load_average.15m",
            agg: MetricAgg::Max,
        },
    },
    MetricDefinition {
        key: "logstash_node_cgroup_usage",
        title: "Cgroup CPU Performance",
        label: "Cgroup Usage",
        description: "CPU time consumed by the container, in nanoseconds.",
        units: "ns",
        format: LARGE_ABBREVIATED,
        calculation: Calculation::Derivative {
            field: "logstash_stats.os.cgroup.cpuacct.usage_nanos",
        },
    },
    MetricDefinition {
        key: "logstash_node_cgroup_throttled",
        title: "Cgroup CPU Performance",
        label: "Cgroup Throttling",
        description: "Time the container was throttled, in nanoseconds.",
        units: "ns",
        format: LARGE_ABBREVIATED,
        calculation: Calculation::Derivative {
            field: "logstash_stats.os.cgroup.cpu.stat.time_throttled_nanos",
        },
    },
    MetricDefinition {
        key: "logstash_node_cgroup_periods",
        title: "Cgroup CFS Stats",
        label: "Cgroup Elapsed Periods",
        description: "Number of CFS sampling periods elapsed.",
        units: "",
        format: SMALL_FLOAT,
        calculation: Calculation::Derivative {
            field: "logstash_stats.os.cgroup.cpu.stat.number_of_elapsed_periods",
        },
    },
    MetricDefinition {
        key: "logstash_node_cgroup_throttled_count",
        title: "Cgroup CFS Stats",
        label: "Cgroup Throttled Count",
        description: "Number of times the container was throttled.",
        units: "",
        format: SMALL_FLOAT,
        calculation: Calculation::Derivative {
            field: "logstash_stats.os.cgroup.cpu.stat.number_of_times_throttled",
        },
    },
    MetricDefinition {
        key: "logstash_queue_events_count",
        title: "Events Queued",
        label: "Events Queued",
        description: "Number of events in the persistent queue.",
        units: "",
        format: LARGE_ABBREVIATED,
        calculation: Calculation::Value {
            field: "logstash_stats.queue.events_count",
            agg: MetricAgg::Avg,
        },
    },
];

pub fn metric_definition(key: &str) -> Option<&'static MetricDefinition> {
    CATALOG.iter().find(|m| m.key == key)
}

/// Named group of metric keys rendered together as one chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSetEntry {
    pub name: &'static str,
    pub keys: Vec<&'static str>,
}

impl MetricSetEntry {
    fn single(key: &'static str) -> Self {
        Self {
            name: key,
            keys: vec![key],
        }
    }

    fn group(name: &'static str, keys: &[&'static str]) -> Self {
        Self {
            name,
            keys: keys.to_vec(),
        }
    }
}

pub fn overview_metric_set(container_metrics: bool) -> Vec<MetricSetEntry> {
    let cpu_key = if container_metrics {
        NODE_CGROUP_QUOTA_CPU
    } else {
        NODE_CPU_UTILIZATION
    };

    vec![
        MetricSetEntry::single("logstash_node_events_input_rate"),
        MetricSetEntry::single("logstash_node_events_output_rate"),
        MetricSetEntry::single("logstash_node_events_latency"),
        MetricSetEntry::group(
            "logstash_node_jvm_mem",
            &[
                "logstash_node_jvm_mem_heap_max_in_bytes",
                "logstash_node_jvm_mem_heap_used_in_bytes",
            ],
        ),
        MetricSetEntry::group(NODE_CPU_METRIC, &[cpu_key]),
        MetricSetEntry::group(
            "logstash_os_load",
            &["logstash_os_load_1m", "logstash_os_load_5m", "logstash_os_load_15m"],
        ),
    ]
}

pub fn advanced_metric_set() -> Vec<MetricSetEntry> {
    vec![
        MetricSetEntry::group(
            "logstash_node_cgroup_cpu",
            &["logstash_node_cgroup_usage", "logstash_node_cgroup_throttled"],
        ),
        MetricSetEntry::group(
            "logstash_node_cgroup_stats",
            &["logstash_node_cgroup_periods", "logstash_node_cgroup_throttled_count"],
        ),
        MetricSetEntry::single(NODE_CPU_UTILIZATION),
        MetricSetEntry::single("logstash_queue_events_count"),
    ]
}
