//! Error types for discovery

use selfheal_primitives::ActionError;
use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// No strategy produced a visible candidate
    #[error("could not find interactive element matching intent: \"{0}\"")]
    NoCandidate(String),

    /// Intent is blank or not a valid pattern
    #[error("invalid intent: {0}")]
    InvalidIntent(String),

    /// A strategy's backend query or probe failed
    #[error("strategy '{strategy}' failed: {source}")]
    StrategyFailed {
        strategy: String,
        #[source]
        source: ActionError,
    },

    /// Backend failure outside any strategy
    #[error(transparent)]
    Backend(#[from] ActionError),

    /// Discovery is switched off; carries the primary failure
    #[error("self-healing disabled, primary action failed: {0}")]
    HealingDisabled(#[source] ActionError),
}

impl LocatorError {
    pub fn strategy(strategy: &str, source: ActionError) -> Self {
        LocatorError::StrategyFailed {
            strategy: strategy.to_string(),
            source,
        }
    }

    /// Underlying backend error, if any
    pub fn action_error(&self) -> Option<&ActionError> {
        match self {
            LocatorError::StrategyFailed { source, .. } => Some(source),
            LocatorError::Backend(source) => Some(source),
            LocatorError::HealingDisabled(source) => Some(source),
            _ => None,
        }
    }

    /// Check if another iteration could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            LocatorError::InvalidIntent(_) | LocatorError::HealingDisabled(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_candidate_message_names_intent() {
        let err = LocatorError::NoCandidate("Delete Row 3".into());
        assert_eq!(
            err.to_string(),
            "could not find interactive element matching intent: \"Delete Row 3\""
        );
    }

    #[test]
    fn strategy_failure_keeps_source() {
        let err = LocatorError::strategy("role", ActionError::WaitTimeout("probe".into()));
        assert!(err.to_string().contains("Wait timeout: probe"));
        assert!(err.action_error().is_some_and(ActionError::is_timeout));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.is_retryable());
        assert!(!LocatorError::InvalidIntent("".into()).is_retryable());
    }
}
