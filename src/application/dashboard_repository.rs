// Repository trait for saved dashboards
use crate::domain::saved_dashboard::SavedDashboard;
use async_trait::async_trait;

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Persist the record, returning it with its version bumped
    async fn save(&self, dashboard: SavedDashboard) -> anyhow::Result<SavedDashboard>;

    async fn load(&self, id: &str) -> anyhow::Result<Option<SavedDashboard>>;

    /// All saved dashboards, sorted by title
    async fn list(&self) -> anyhow::Result<Vec<SavedDashboard>>;

    async fn delete(&self, id: &str) -> anyhow::Result<bool>;

    /// Titles compare case-insensitively
    async fn find_by_title(&self, title: &str) -> anyhow::Result<Option<SavedDashboard>> {
        let wanted = title.trim().to_lowercase();
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|d| d.title.trim().to_lowercase() == wanted))
    }
}
