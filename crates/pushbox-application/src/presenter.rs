//! Presentation seam.

use pushbox_core::InboxSnapshot;
use serde::Serialize;

/// A displayable status line for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum StatusMessage {
    /// Confirmation of a completed remote operation.
    Info(String),
    /// A gateway failure.
    Error(String),
}

impl StatusMessage {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Info(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Info(message) | Self::Error(message) => message,
        }
    }
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// The user-facing view of the inbox.
///
/// Called synchronously by the controller: `render` runs while the store is
/// locked, so renders are delivered in the same order as the mutations.
/// Implementations must not call back into the controller.
pub trait InboxPresenter: Send + Sync {
    /// Redraw from `snapshot`. Called once per store mutation.
    fn render(&self, snapshot: &InboxSnapshot);

    /// Show a status line.
    fn report(&self, status: &StatusMessage);
}
