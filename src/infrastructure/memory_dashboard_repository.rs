// In-memory dashboard store
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::saved_dashboard::SavedDashboard;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryDashboardRepository {
    dashboards: RwLock<HashMap<String, SavedDashboard>>,
}

impl InMemoryDashboardRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DashboardRepository for InMemoryDashboardRepository {
    async fn save(&self, mut dashboard: SavedDashboard) -> Result<SavedDashboard> {
        let mut dashboards = self.dashboards.write().await;
        let previous = dashboards.get(&dashboard.id).map(|d| d.version).unwrap_or(0);
        dashboard.version = previous + 1;
        dashboard.updated_at = Utc::now();
        dashboards.insert(dashboard.id.clone(), dashboard.clone());
        Ok(dashboard)
    }

    async fn load(&self, id: &str) -> Result<Option<SavedDashboard>> {
        Ok(self.dashboards.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<SavedDashboard>> {
        let mut all: Vec<SavedDashboard> = self.dashboards.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Ok(all)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.dashboards.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::{DashboardConfig, TimeRange};
    use chrono::Duration;

    fn record(id: &str, title: &str) -> SavedDashboard {
        let mut config = DashboardConfig::empty(TimeRange::last(Duration::minutes(15)));
        config.title = title.to_string();
        SavedDashboard::from_config(id.to_string(), &config)
    }

    #[tokio::test]
    async fn test_save_bumps_version() {
        let repo = InMemoryDashboardRepository::new();
        assert_eq!(repo.save(record("a", "Alpha")).await.unwrap().version, 1);
        assert_eq!(repo.save(record("a", "Alpha")).await.unwrap().version, 2);
        assert_eq!(repo.load("a").await.unwrap().unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_list_and_find_by_title() {
        let repo = InMemoryDashboardRepository::new();
        repo.save(record("b", "beta")).await.unwrap();
        repo.save(record("a", "Alpha")).await.unwrap();

        let titles: Vec<String> = repo.list().await.unwrap().into_iter().map(|d| d.title).collect();
        assert_eq!(titles, vec!["Alpha", "beta"]);

        let found = repo.find_by_title("ALPHA").await.unwrap().unwrap();
        assert_eq!(found.id, "a");
        assert!(repo.find_by_title("gamma").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryDashboardRepository::new();
        repo.save(record("a", "Alpha")).await.unwrap();
        assert!(repo.delete("a").await.unwrap());
        assert!(!repo.delete("a").await.unwrap());
        assert!(repo.load("a").await.unwrap().is_none());
    }
}
