// Edit/view mode state machine for a single dashboard
use super::dashboard::{DashboardConfig, DashboardField, EmbeddableRef, Filter, Panel, TimeRange};
use super::saved_dashboard::SavedDashboard;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    View,
    Edit,
}

/// A transition that leaves the current edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingTransition {
    DiscardEdits,
    OpenDashboard { id: String },
    CreateNew,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmResponse {
    Confirmed,
    Cancelled,
}

/// Result of asking to leave the current edit session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionGate {
    Proceed(PendingTransition),
    ConfirmationRequired,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    #[error("dashboard is not in edit mode")]
    NotEditing,
    #[error("dashboard is already in edit mode")]
    AlreadyEditing,
    #[error("a confirmation prompt is open")]
    ConfirmationPending,
    #[error("no confirmation prompt is open")]
    NoConfirmationPending,
    #[error("panel {0} not found")]
    PanelNotFound(String),
    #[error("filter at position {0} not found")]
    FilterNotFound(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ModeState {
    View,
    Edit,
    AwaitingConfirmation(PendingTransition),
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    id: Option<String>,
    saved: DashboardConfig,
    working: DashboardConfig,
    mode: ModeState,
    query_draft: String,
}

impl DashboardState {
    /// Empty, unsaved dashboard in view mode (the landing page).
    pub fn landing(time_range: TimeRange) -> Self {
        let config = DashboardConfig::empty(time_range);
        Self {
            id: None,
            saved: config.clone(),
            working: config,
            mode: ModeState::View,
            query_draft: String::new(),
        }
    }

    pub fn new_dashboard(time_range: TimeRange) -> Self {
        Self {
            mode: ModeState::Edit,
            ..Self::landing(time_range)
        }
    }

    pub fn from_saved(record: &SavedDashboard, current_time: TimeRange) -> Self {
        let config = record.to_config(current_time);
        Self {
            id: Some(record.id.clone()),
            query_draft: config.query.query.clone(),
            saved: config.clone(),
            working: config,
            mode: ModeState::View,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn mode(&self) -> ViewMode {
        match self.mode {
            ModeState::View => ViewMode::View,
            ModeState::Edit | ModeState::AwaitingConfirmation(_) => ViewMode::Edit,
        }
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        matches!(self.mode, ModeState::AwaitingConfirmation(_))
    }

    pub fn pending_transition(&self) -> Option<&PendingTransition> {
        match &self.mode {
            ModeState::AwaitingConfirmation(pending) => Some(pending),
            _ => None,
        }
    }

    pub fn saved(&self) -> &DashboardConfig {
        &self.saved
    }

    pub fn working(&self) -> &DashboardConfig {
        &self.working
    }

    pub fn query_draft(&self) -> &str {
        &self.query_draft
    }

    /// Unsaved changes of the edit session. Viewing has none.
    pub fn changed_fields(&self) -> Vec<DashboardField> {
        match self.mode {
            ModeState::View => Vec::new(),
            ModeState::Edit | ModeState::AwaitingConfirmation(_) => {
                self.working.changed_fields(&self.saved)
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.changed_fields().is_empty()
    }

    pub fn enter_edit(&mut self) -> Result<(), ModeError> {
        match self.mode {
            ModeState::View => {
                // a time picked while viewing carries into the session
                let current_time = self.working.time_range;
                self.reset_working_copy();
                self.working.time_range = current_time;
                self.mode = ModeState::Edit;
                Ok(())
            }
            ModeState::Edit => Err(ModeError::AlreadyEditing),
            ModeState::AwaitingConfirmation(_) => Err(ModeError::ConfirmationPending),
        }
    }

    /// Asks to leave the current edit session. A dirty session parks the
    /// transition behind a confirmation prompt.
    pub fn request_transition(
        &mut self,
        transition: PendingTransition,
    ) -> Result<TransitionGate, ModeError> {
        match self.mode {
            ModeState::AwaitingConfirmation(_) => Err(ModeError::ConfirmationPending),
            ModeState::View if transition == PendingTransition::DiscardEdits => {
                Err(ModeError::NotEditing)
            }
            ModeState::View => Ok(TransitionGate::Proceed(transition)),
            ModeState::Edit if self.is_dirty() => {
                tracing::debug!(
                    changed = ?self.changed_fields(),
                    ?transition,
                    "unsaved changes, confirmation required"
                );
                self.mode = ModeState::AwaitingConfirmation(transition);
                Ok(TransitionGate::ConfirmationRequired)
            }
            ModeState::Edit => {
                if transition == PendingTransition::DiscardEdits {
                    self.reset_working_copy();
                    self.mode = ModeState::View;
                }
                Ok(TransitionGate::Proceed(transition))
            }
        }
    }

    pub fn cancel_edit(&mut self) -> Result<TransitionGate, ModeError> {
        self.request_transition(PendingTransition::DiscardEdits)
    }

    /// Resolves the open prompt. Returns the released transition on confirm.
    pub fn resolve_confirmation(
        &mut self,
        response: ConfirmResponse,
    ) -> Result<Option<PendingTransition>, ModeError> {
        let pending = match &self.mode {
            ModeState::AwaitingConfirmation(pending) => pending.clone(),
            _ => return Err(ModeError::NoConfirmationPending),
        };

        match response {
            ConfirmResponse::Confirmed => {
                self.reset_working_copy();
                self.mode = ModeState::View;
                Ok(Some(pending))
            }
            ConfirmResponse::Cancelled => {
                self.mode = ModeState::Edit;
                Ok(None)
            }
        }
    }

    /// Records a successful save of the working copy.
    pub fn commit_saved(&mut self, id: String, config: DashboardConfig) {
        self.id = Some(id);
        self.query_draft = config.query.query.clone();
        self.saved = config.clone();
        self.working = config;
        self.mode = ModeState::View;
    }

    pub fn add_panel(&mut self, embeddable: EmbeddableRef) -> Result<String, ModeError> {
        Ok(self.editing()?.add_panel(embeddable))
    }

    pub fn remove_panel(&mut self, panel_index: &str) -> Result<Panel, ModeError> {
        self.editing()?
            .remove_panel(panel_index)
            .ok_or_else(|| ModeError::PanelNotFound(panel_index.to_string()))
    }

    /// Edits the query bar text without applying it.
    pub fn set_query_draft(&mut self, text: impl Into<String>) -> Result<(), ModeError> {
        self.editing()?;
        self.query_draft = text.into();
        Ok(())
    }

    pub fn submit_query(&mut self) -> Result<(), ModeError> {
        let draft = self.query_draft.clone();
        self.editing()?.query.query = draft;
        Ok(())
    }

    pub fn add_filter(&mut self, filter: Filter) -> Result<(), ModeError> {
        self.editing()?.filters.push(filter);
        Ok(())
    }

    pub fn remove_filter(&mut self, position: usize) -> Result<Filter, ModeError> {
        let filters = &mut self.editing()?.filters;
        if position >= filters.len() {
            return Err(ModeError::FilterNotFound(position));
        }
        Ok(filters.remove(position))
    }

    pub fn toggle_filter(&mut self, position: usize) -> Result<bool, ModeError> {
        let filter = self
            .editing()?
            .filters
            .get_mut(position)
            .ok_or(ModeError::FilterNotFound(position))?;
        filter.disabled = !filter.disabled;
        Ok(filter.disabled)
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), ModeError> {
        self.editing()?.title = title.into();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), ModeError> {
        self.editing()?.description = description.into();
        Ok(())
    }

    pub fn set_options(
        &mut self,
        use_margins: bool,
        hide_panel_titles: bool,
    ) -> Result<(), ModeError> {
        let options = &mut self.editing()?.options;
        options.use_margins = use_margins;
        options.hide_panel_titles = hide_panel_titles;
        Ok(())
    }

    /// The time picker works in both modes.
    pub fn set_time_range(&mut self, time_range: TimeRange) -> Result<(), ModeError> {
        if self.is_awaiting_confirmation() {
            return Err(ModeError::ConfirmationPending);
        }
        self.working.time_range = time_range;
        Ok(())
    }

    fn editing(&mut self) -> Result<&mut DashboardConfig, ModeError> {
        match self.mode {
            ModeState::Edit => Ok(&mut self.working),
            ModeState::View => Err(ModeError::NotEditing),
            ModeState::AwaitingConfirmation(_) => Err(ModeError::ConfirmationPending),
        }
    }

    // Unstored time is the user's global time and survives a reset.
    fn reset_working_copy(&mut self) {
        let current_time = self.working.time_range;
        self.working = self.saved.clone();
        if !self.saved.store_time_with_dashboard {
            self.working.time_range = current_time;
        }
        self.query_draft = self.working.query.query.clone();
    }
}
