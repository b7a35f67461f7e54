// JSON file dashboard store, one file per dashboard
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::saved_dashboard::SavedDashboard;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct FileDashboardRepository {
    dir: PathBuf,
    // serializes read-modify-write of the version counter
    write_lock: Mutex<()>,
}

impl FileDashboardRepository {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create dashboard directory {}", dir.display()))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Ids map to file names, so only `[A-Za-z0-9_-]` is allowed.
    fn is_valid_id(id: &str) -> bool {
        !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if !Self::is_valid_id(id) {
            anyhow::bail!("Invalid dashboard id: {:?}", id);
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    async fn read_file(path: &Path) -> Result<SavedDashboard> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[async_trait]
impl DashboardRepository for FileDashboardRepository {
    async fn save(&self, mut dashboard: SavedDashboard) -> Result<SavedDashboard> {
        let path = self.path_for(&dashboard.id)?;
        let _guard = self.write_lock.lock().await;

        let previous = match tokio::fs::try_exists(&path).await? {
            true => Self::read_file(&path).await?.version,
            false => 0,
        };
        dashboard.version = previous + 1;
        dashboard.updated_at = Utc::now();

        let json = serde_json::to_vec_pretty(&dashboard)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(id = %dashboard.id, version = dashboard.version, "dashboard written");
        Ok(dashboard)
    }

    async fn load(&self, id: &str) -> Result<Option<SavedDashboard>> {
        // no file can hold such an id
        if !Self::is_valid_id(id) {
            return Ok(None);
        }
        let path = self.path_for(id)?;
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        Ok(Some(Self::read_file(&path).await?))
    }

    async fn list(&self) -> Result<Vec<SavedDashboard>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut all = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_file(&path).await {
                Ok(dashboard) => all.push(dashboard),
                Err(e) => tracing::warn!("Skipping unreadable dashboard file: {:#}", e),
            }
        }
        all.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Ok(all)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if !Self::is_valid_id(id) {
            return Ok(false);
        }
        let path = self.path_for(id)?;
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::{DashboardConfig, EmbeddableRef, TimeRange};
    use chrono::Duration;

    fn record(id: &str, title: &str, store_time: bool) -> SavedDashboard {
        let mut config = DashboardConfig::empty(TimeRange::last(Duration::hours(1)));
        config.title = title.to_string();
        config.store_time_with_dashboard = store_time;
        config.add_panel(EmbeddableRef::visualization("pie"));
        SavedDashboard::from_config(id.to_string(), &config)
    }

    #[tokio::test]
    async fn test_save_and_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileDashboardRepository::open(dir.path()).await.unwrap();

        let saved = repo.save(record("dash-1", "Disk", true)).await.unwrap();
        assert_eq!(saved.version, 1);

        let reopened = FileDashboardRepository::open(dir.path()).await.unwrap();
        let loaded = reopened.load("dash-1").await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert!(loaded.stored_time_range().is_some());

        assert_eq!(reopened.save(loaded).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_list_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileDashboardRepository::open(dir.path()).await.unwrap();
        repo.save(record("b", "Beta", false)).await.unwrap();
        repo.save(record("a", "Alpha", false)).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();

        let titles: Vec<String> = repo.list().await.unwrap().into_iter().map(|d| d.title).collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileDashboardRepository::open(dir.path()).await.unwrap();
        assert!(repo.load("../etc/passwd").await.unwrap().is_none());
        assert!(!repo.delete("../etc/passwd").await.unwrap());
        assert!(repo.save(record("../escape", "Escape", false)).await.is_err());
        assert!(repo.load("missing").await.unwrap().is_none());
        assert!(!repo.delete("missing").await.unwrap());
    }
}
