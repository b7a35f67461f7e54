use serde::Deserialize;
use std::path::PathBuf;

const ENV_PREFIX: &str = "DASHBOARD_MONITOR";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub elasticsearch: ElasticsearchSettings,
    pub monitoring: MonitoringSettings,
    #[serde(default)]
    pub dashboards: DashboardSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ElasticsearchSettings {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitoringSettings {
    pub logstash_index_pattern: String,
    pub ccs_enabled: bool,
    /// Report CPU against the cgroup quota for containerized Logstash nodes
    pub container_logstash_enabled: bool,
    pub min_interval_seconds: i64,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            logstash_index_pattern: ".monitoring-logstash-6-*".to_string(),
            ccs_enabled: true,
            container_logstash_enabled: false,
            min_interval_seconds: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardSettings {
    pub storage_dir: Option<PathBuf>,
}

fn builder_with_defaults() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    let monitoring = MonitoringSettings::default();
    Ok(config::Config::builder()
        .set_default("server.bind_addr", "0.0.0.0:8080")?
        .set_default("elasticsearch.host", "http://localhost:9200")?
        .set_default("monitoring.logstash_index_pattern", monitoring.logstash_index_pattern)?
        .set_default("monitoring.ccs_enabled", monitoring.ccs_enabled)?
        .set_default(
            "monitoring.container_logstash_enabled",
            monitoring.container_logstash_enabled,
        )?
        .set_default("monitoring.min_interval_seconds", monitoring.min_interval_seconds)?)
}

/// Defaults, then `config/monitoring.*` if present, then `DASHBOARD_MONITOR__*` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder_with_defaults()?
        .add_source(config::File::with_name("config/monitoring").required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Prefix every index pattern with the remote cluster for cross-cluster search.
/// `*` searches all remotes as well as the local cluster.
pub fn prefix_index_pattern(settings: &MonitoringSettings, ccs: Option<&str>) -> String {
    let pattern = settings.logstash_index_pattern.as_str();
    let ccs = match ccs.map(str::trim) {
        Some(ccs) if settings.ccs_enabled && !ccs.is_empty() => ccs,
        _ => return pattern.to_string(),
    };

    let prefixed = pattern
        .split(',')
        .map(|p| format!("{}:{}", ccs, p))
        .collect::<Vec<_>>()
        .join(",");

    if ccs == "*" {
        format!("{},{}", prefixed, pattern)
    } else {
        prefixed
    }
}
