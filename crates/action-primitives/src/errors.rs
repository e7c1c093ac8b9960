//! Error types for locator capability operations

use thiserror::Error;

/// Errors raised by a [`Locatable`](crate::Locatable) backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Wait or probe exceeded its time budget
    #[error("Wait timeout: {0}")]
    WaitTimeout(String),

    /// Element anchor could not be resolved
    #[error("Anchor not found: {0}")]
    AnchorNotFound(String),

    /// Element is not clickable (hidden, obscured, or not interactable)
    #[error("Element not clickable: {0}")]
    NotClickable(String),

    /// Element is not enabled for interaction
    #[error("Element not enabled: {0}")]
    NotEnabled(String),

    /// Element does not accept text input
    #[error("Element not editable: {0}")]
    NotEditable(String),

    /// Handle refers to a node that is no longer attached
    #[error("Stale node: {0}")]
    StaleNode(String),

    /// Transport or protocol error in the automation backend
    #[error("Backend I/O error: {0}")]
    BackendIo(String),
}

impl ActionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ActionError::WaitTimeout(_))
    }
}
