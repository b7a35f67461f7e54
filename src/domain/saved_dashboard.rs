// Persisted dashboard record
use super::dashboard::{DashboardConfig, DashboardOptions, Filter, Panel, Query, TimeRange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDashboard {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub panels: Vec<Panel>,
    #[serde(default)]
    pub query: Query,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub options: DashboardOptions,
    #[serde(default)]
    pub time_restore: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

/// Entry shown on the dashboard landing page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardListing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

impl SavedDashboard {
    /// Builds the record for `config`. The time range is kept only when the
    /// dashboard stores its time.
    pub fn from_config(id: String, config: &DashboardConfig) -> Self {
        let (time_from, time_to) = if config.store_time_with_dashboard {
            (Some(config.time_range.from), Some(config.time_range.to))
        } else {
            (None, None)
        };

        Self {
            id,
            title: config.title.clone(),
            description: config.description.clone(),
            panels: config.panels.clone(),
            query: config.query.clone(),
            filters: config.filters.clone(),
            options: config.options,
            time_restore: config.store_time_with_dashboard,
            time_from,
            time_to,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn stored_time_range(&self) -> Option<TimeRange> {
        match (self.time_restore, self.time_from, self.time_to) {
            (true, Some(from), Some(to)) => Some(TimeRange::new(from, to)),
            _ => None,
        }
    }

    /// Rebuilds the config, falling back to `current_time` when no time is stored.
    pub fn to_config(&self, current_time: TimeRange) -> DashboardConfig {
        DashboardConfig {
            title: self.title.clone(),
            description: self.description.clone(),
            panels: self.panels.clone(),
            query: self.query.clone(),
            filters: self.filters.clone(),
            time_range: self.stored_time_range().unwrap_or(current_time),
            store_time_with_dashboard: self.time_restore,
            options: self.options,
        }
    }

    pub fn listing(&self) -> DashboardListing {
        DashboardListing {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            updated_at: self.updated_at,
        }
    }

    pub fn matches_search(&self, search: &str) -> bool {
        let search = search.trim().to_lowercase();
        search.is_empty() || self.title.to_lowercase().contains(&search)
    }
}
