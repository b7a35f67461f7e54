// Modal "discard unsaved changes" prompt
use crate::domain::dashboard_state::ConfirmResponse;
use async_trait::async_trait;

pub const DISCARD_CHANGES_MESSAGE: &str =
    "Discard changes to dashboard? Once you discard your changes, there's no getting them back.";

#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// Blocks until the user answers
    async fn show(&self, message: &str) -> ConfirmResponse;
}

/// Prompt that always gives the same answer and counts how often it was shown.
#[derive(Debug)]
pub struct FixedResponsePrompt {
    response: ConfirmResponse,
    shown: std::sync::atomic::AtomicUsize,
}

impl FixedResponsePrompt {
    pub fn new(response: ConfirmResponse) -> Self {
        Self {
            response,
            shown: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn times_shown(&self) -> usize {
        self.shown.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfirmationPrompt for FixedResponsePrompt {
    async fn show(&self, message: &str) -> ConfirmResponse {
        tracing::debug!(message, response = ?self.response, "confirmation prompt");
        self.shown.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.response
    }
}
