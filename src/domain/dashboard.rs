// Dashboard domain model
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Grid width of the dashboard layout, in columns.
pub const GRID_COLUMNS: u32 = 48;
pub const DEFAULT_PANEL_WIDTH: u32 = 24;
pub const DEFAULT_PANEL_HEIGHT: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Range ending now and reaching `duration` into the past
    pub fn last(duration: Duration) -> Self {
        let to = Utc::now();
        Self {
            from: to - duration,
            to,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryLanguage {
    #[default]
    Kuery,
    Lucene,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    pub query: String,
    pub language: QueryLanguage,
}

impl Query {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: QueryLanguage::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: String,
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub disabled: bool,
}

impl Filter {
    pub fn phrase(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            negate: false,
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddableType {
    Visualization,
    Search,
}

/// Reference to a saved object that can be rendered as a panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddableRef {
    pub embeddable_type: EmbeddableType,
    pub saved_object_id: String,
}

impl EmbeddableRef {
    pub fn visualization(saved_object_id: impl Into<String>) -> Self {
        Self {
            embeddable_type: EmbeddableType::Visualization,
            saved_object_id: saved_object_id.into(),
        }
    }

    pub fn search(saved_object_id: impl Into<String>) -> Self {
        Self {
            embeddable_type: EmbeddableType::Search,
            saved_object_id: saved_object_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridData {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    pub panel_index: String,
    #[serde(flatten)]
    pub embeddable: EmbeddableRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub grid: GridData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardOptions {
    pub use_margins: bool,
    pub hide_panel_titles: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            use_margins: true,
            hide_panel_titles: false,
        }
    }
}

/// Parts of a dashboard that take part in change detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardField {
    Title,
    Description,
    Panels,
    Query,
    Filters,
    TimeRange,
    TimeRestore,
    Options,
}

/// Snapshot of everything a dashboard renders and persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub title: String,
    pub description: String,
    pub panels: Vec<Panel>,
    pub query: Query,
    pub filters: Vec<Filter>,
    pub time_range: TimeRange,
    pub store_time_with_dashboard: bool,
    pub options: DashboardOptions,
}

impl DashboardConfig {
    pub fn empty(time_range: TimeRange) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            panels: Vec::new(),
            query: Query::default(),
            filters: Vec::new(),
            time_range,
            store_time_with_dashboard: false,
            options: DashboardOptions::default(),
        }
    }

    /// Fields on which `self` differs from `saved`.
    ///
    /// The time range only counts when `saved` stores its time with the
    /// dashboard; otherwise it is the user's global time and never dirty.
    pub fn changed_fields(&self, saved: &DashboardConfig) -> Vec<DashboardField> {
        let mut changed = Vec::new();
        if self.title != saved.title {
            changed.push(DashboardField::Title);
        }
        if self.description != saved.description {
            changed.push(DashboardField::Description);
        }
        if self.panels != saved.panels {
            changed.push(DashboardField::Panels);
        }
        if self.query != saved.query {
            changed.push(DashboardField::Query);
        }
        if self.filters != saved.filters {
            changed.push(DashboardField::Filters);
        }
        if self.store_time_with_dashboard != saved.store_time_with_dashboard {
            changed.push(DashboardField::TimeRestore);
        }
        if saved.store_time_with_dashboard && self.time_range != saved.time_range {
            changed.push(DashboardField::TimeRange);
        }
        if self.options != saved.options {
            changed.push(DashboardField::Options);
        }
        changed
    }

    pub fn differs_from(&self, saved: &DashboardConfig) -> bool {
        !self.changed_fields(saved).is_empty()
    }

    /// Places a new panel below the lowest existing one and returns its index.
    pub fn add_panel(&mut self, embeddable: EmbeddableRef) -> String {
        let panel_index = self.next_panel_index();
        let y = self
            .panels
            .iter()
            .map(|p| p.grid.y + p.grid.h)
            .max()
            .unwrap_or(0);

        self.panels.push(Panel {
            panel_index: panel_index.clone(),
            embeddable,
            title: None,
            grid: GridData {
                x: 0,
                y,
                w: DEFAULT_PANEL_WIDTH,
                h: DEFAULT_PANEL_HEIGHT,
            },
        });
        panel_index
    }

    pub fn remove_panel(&mut self, panel_index: &str) -> Option<Panel> {
        let pos = self.panels.iter().position(|p| p.panel_index == panel_index)?;
        Some(self.panels.remove(pos))
    }

    fn next_panel_index(&self) -> String {
        let max = self
            .panels
            .iter()
            .filter_map(|p| p.panel_index.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        (max + 1).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn range(day: u32) -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2015, 9, day, 6, 31, 44).unwrap(),
            Utc.with_ymd_and_hms(2015, 9, day, 18, 31, 44).unwrap(),
        )
    }

    #[test]
    fn test_time_range_ignored_unless_stored() {
        let saved = DashboardConfig::empty(range(19));
        let mut working = saved.clone();
        working.time_range = range(20);
        assert!(!working.differs_from(&saved));

        let mut saved = saved;
        saved.store_time_with_dashboard = true;
        working.store_time_with_dashboard = true;
        assert_eq!(working.changed_fields(&saved), vec![DashboardField::TimeRange]);
    }

    #[test]
    fn test_add_panel_stacks_below() {
        let mut config = DashboardConfig::empty(range(19));
        let first = config.add_panel(EmbeddableRef::visualization("area"));
        let second = config.add_panel(EmbeddableRef::search("logs"));

        assert_eq!(first, "1");
        assert_eq!(second, "2");
        assert_eq!(config.panels[1].grid.y, DEFAULT_PANEL_HEIGHT);
        assert!(config.panels[1].grid.w <= GRID_COLUMNS);
    }

    #[test]
    fn test_remove_panel() {
        let mut config = DashboardConfig::empty(range(19));
        let index = config.add_panel(EmbeddableRef::visualization("area"));

        assert!(config.remove_panel("missing").is_none());
        assert_eq!(config.remove_panel(&index).map(|p| p.panel_index), Some(index));
        assert!(config.panels.is_empty());
    }

    #[test]
    fn test_filter_toggle_round_trip_is_clean() {
        let mut saved = DashboardConfig::empty(range(19));
        saved.filters.push(Filter::phrase("machine.os", "win 8"));
        let mut working = saved.clone();

        working.filters[0].disabled = true;
        assert_eq!(working.changed_fields(&saved), vec![DashboardField::Filters]);

        working.filters[0].disabled = false;
        assert!(!working.differs_from(&saved));
    }
}
