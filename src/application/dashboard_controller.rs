// Dashboard mode controller - Use cases for viewing, editing and saving a dashboard
use crate::application::confirmation_prompt::{ConfirmationPrompt, DISCARD_CHANGES_MESSAGE};
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::dashboard::{DashboardConfig, EmbeddableRef, Filter, Panel, TimeRange};
use crate::domain::dashboard_state::{
    ConfirmResponse, DashboardState, ModeError, PendingTransition, TransitionGate, ViewMode,
};
use crate::domain::saved_dashboard::{DashboardListing, SavedDashboard};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Mode(#[from] ModeError),

    #[error("dashboard {0} not found")]
    NotFound(String),

    #[error("a dashboard titled {0:?} already exists")]
    DuplicateTitle(String),

    #[error("dashboard title must not be empty")]
    InvalidTitle,

    #[error("dashboard persistence failed: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

pub type ControllerResult<T> = Result<T, ControllerError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    pub title: String,
    pub store_time_with_dashboard: bool,
    pub save_as_new: bool,
    /// Allow a title already used by another dashboard
    pub confirm_overwrite: bool,
}

impl SaveOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            store_time_with_dashboard: false,
            save_as_new: false,
            confirm_overwrite: false,
        }
    }

    pub fn store_time_with_dashboard(mut self, store: bool) -> Self {
        self.store_time_with_dashboard = store;
        self
    }

    pub fn save_as_new(mut self) -> Self {
        self.save_as_new = true;
        self
    }

    pub fn confirm_overwrite(mut self) -> Self {
        self.confirm_overwrite = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Completed(ViewMode),
    ConfirmationRequired,
}

/// Result of cancelling edit mode through a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptedCancel {
    pub mode: ViewMode,
    pub prompt_shown: bool,
}

/// Drives one user session's dashboard through view/edit mode,
/// persisting through the repository and gating discards on confirmation.
pub struct DashboardModeController {
    repository: Arc<dyn DashboardRepository>,
    state: DashboardState,
}

impl DashboardModeController {
    pub fn new(repository: Arc<dyn DashboardRepository>, time_range: TimeRange) -> Self {
        Self {
            repository,
            state: DashboardState::landing(time_range),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn mode(&self) -> ViewMode {
        self.state.mode()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    pub fn is_confirmation_open(&self) -> bool {
        self.state.is_awaiting_confirmation()
    }

    /// Text currently shown in the query bar
    pub fn query_text(&self) -> &str {
        self.state.query_draft()
    }

    pub fn working(&self) -> &DashboardConfig {
        self.state.working()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.state.working().filters
    }

    pub fn panels(&self) -> &[Panel] {
        &self.state.working().panels
    }

    pub fn time_range(&self) -> TimeRange {
        self.state.working().time_range
    }

    pub async fn list_dashboards(&self, search: &str) -> ControllerResult<Vec<DashboardListing>> {
        Ok(self
            .repository
            .list()
            .await?
            .iter()
            .filter(|d| d.matches_search(search))
            .map(SavedDashboard::listing)
            .collect())
    }

    pub async fn create_new(&mut self) -> ControllerResult<TransitionOutcome> {
        self.gate(PendingTransition::CreateNew).await
    }

    pub async fn open_dashboard(&mut self, id: &str) -> ControllerResult<TransitionOutcome> {
        let record = self
            .repository
            .load(id)
            .await?
            .ok_or_else(|| ControllerError::NotFound(id.to_string()))?;
        self.open_record(record)
    }

    /// Opens the dashboard with the given title from the listing.
    pub async fn select_dashboard(&mut self, title: &str) -> ControllerResult<TransitionOutcome> {
        let record = self
            .repository
            .find_by_title(title)
            .await?
            .ok_or_else(|| ControllerError::NotFound(title.to_string()))?;
        self.open_record(record)
    }

    /// Reloads a dashboard from its persisted state.
    pub async fn load_saved_dashboard(
        &mut self,
        title: &str,
    ) -> ControllerResult<TransitionOutcome> {
        self.select_dashboard(title).await
    }

    pub fn click_edit(&mut self) -> ControllerResult<()> {
        self.state.enter_edit()?;
        tracing::debug!(id = ?self.state.id(), "entered edit mode");
        Ok(())
    }

    pub fn cancel_edit(&mut self) -> ControllerResult<TransitionOutcome> {
        match self.state.cancel_edit()? {
            TransitionGate::Proceed(_) => Ok(TransitionOutcome::Completed(self.state.mode())),
            TransitionGate::ConfirmationRequired => Ok(TransitionOutcome::ConfirmationRequired),
        }
    }

    pub async fn respond_to_confirmation(
        &mut self,
        response: ConfirmResponse,
    ) -> ControllerResult<TransitionOutcome> {
        match self.state.resolve_confirmation(response)? {
            Some(transition) => {
                tracing::debug!(?transition, "changes discarded");
                self.perform(transition).await
            }
            None => Ok(TransitionOutcome::Completed(self.state.mode())),
        }
    }

    pub async fn cancel_edit_with_prompt(
        &mut self,
        prompt: &dyn ConfirmationPrompt,
    ) -> ControllerResult<PromptedCancel> {
        if let TransitionOutcome::Completed(mode) = self.cancel_edit()? {
            return Ok(PromptedCancel {
                mode,
                prompt_shown: false,
            });
        }

        let response = prompt.show(DISCARD_CHANGES_MESSAGE).await;
        self.respond_to_confirmation(response).await?;
        Ok(PromptedCancel {
            mode: self.state.mode(),
            prompt_shown: true,
        })
    }

    /// Persists the working copy and returns to view mode. On failure the
    /// session stays in edit mode with its changes.
    pub async fn save(&mut self, options: SaveOptions) -> ControllerResult<SavedDashboard> {
        if self.state.is_awaiting_confirmation() {
            return Err(ModeError::ConfirmationPending.into());
        }
        if self.state.mode() != ViewMode::Edit {
            return Err(ModeError::NotEditing.into());
        }

        let title = options.title.trim();
        if title.is_empty() {
            return Err(ControllerError::InvalidTitle);
        }

        let id = match (options.save_as_new, self.state.id()) {
            (false, Some(id)) => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };

        if !options.confirm_overwrite {
            if let Some(existing) = self.repository.find_by_title(title).await? {
                if existing.id != id {
                    return Err(ControllerError::DuplicateTitle(title.to_string()));
                }
            }
        }

        let mut config = self.state.working().clone();
        config.title = title.to_string();
        config.store_time_with_dashboard = options.store_time_with_dashboard;

        let saved = self
            .repository
            .save(SavedDashboard::from_config(id, &config))
            .await?;
        tracing::info!(
            id = %saved.id,
            title = %saved.title,
            version = saved.version,
            time_restore = saved.time_restore,
            "dashboard saved"
        );

        self.state.commit_saved(saved.id.clone(), config);
        Ok(saved)
    }

    pub fn add_panel(&mut self, embeddable: EmbeddableRef) -> ControllerResult<String> {
        Ok(self.state.add_panel(embeddable)?)
    }

    pub fn remove_panel(&mut self, panel_index: &str) -> ControllerResult<Panel> {
        Ok(self.state.remove_panel(panel_index)?)
    }

    pub fn set_query_text(&mut self, text: impl Into<String>) -> ControllerResult<()> {
        Ok(self.state.set_query_draft(text)?)
    }

    pub fn submit_query(&mut self) -> ControllerResult<()> {
        Ok(self.state.submit_query()?)
    }

    pub fn add_filter(&mut self, filter: Filter) -> ControllerResult<()> {
        Ok(self.state.add_filter(filter)?)
    }

    pub fn remove_filter(&mut self, position: usize) -> ControllerResult<Filter> {
        Ok(self.state.remove_filter(position)?)
    }

    pub fn toggle_filter(&mut self, position: usize) -> ControllerResult<bool> {
        Ok(self.state.toggle_filter(position)?)
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> ControllerResult<()> {
        Ok(self.state.set_title(title)?)
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> ControllerResult<()> {
        Ok(self.state.set_description(description)?)
    }

    pub fn set_options(
        &mut self,
        use_margins: bool,
        hide_panel_titles: bool,
    ) -> ControllerResult<()> {
        Ok(self.state.set_options(use_margins, hide_panel_titles)?)
    }

    pub fn set_time_range(&mut self, time_range: TimeRange) -> ControllerResult<()> {
        Ok(self.state.set_time_range(time_range)?)
    }

    async fn gate(&mut self, transition: PendingTransition) -> ControllerResult<TransitionOutcome> {
        match self.state.request_transition(transition)? {
            TransitionGate::Proceed(transition) => self.perform(transition).await,
            TransitionGate::ConfirmationRequired => Ok(TransitionOutcome::ConfirmationRequired),
        }
    }

    // The record is already loaded; only a transition held behind the
    // prompt has to fetch it again.
    fn open_record(&mut self, record: SavedDashboard) -> ControllerResult<TransitionOutcome> {
        let transition = PendingTransition::OpenDashboard {
            id: record.id.clone(),
        };
        match self.state.request_transition(transition)? {
            TransitionGate::Proceed(_) => {
                self.show_saved(&record);
                Ok(TransitionOutcome::Completed(self.state.mode()))
            }
            TransitionGate::ConfirmationRequired => Ok(TransitionOutcome::ConfirmationRequired),
        }
    }

    fn show_saved(&mut self, record: &SavedDashboard) {
        let current_time = self.state.working().time_range;
        self.state = DashboardState::from_saved(record, current_time);
    }

    async fn perform(
        &mut self,
        transition: PendingTransition,
    ) -> ControllerResult<TransitionOutcome> {
        match transition {
            PendingTransition::DiscardEdits => {}
            PendingTransition::CreateNew => {
                let current_time = self.state.working().time_range;
                self.state = DashboardState::new_dashboard(current_time);
            }
            PendingTransition::OpenDashboard { id } => {
                let record = self
                    .repository
                    .load(&id)
                    .await?
                    .ok_or(ControllerError::NotFound(id))?;
                self.show_saved(&record);
            }
        }
        Ok(TransitionOutcome::Completed(self.state.mode()))
    }
}
