//! Terminal failure classification

use std::error::Error;

use selfheal_core_types::FailureCategory;

const TIMEOUT_SIGNATURES: &[&str] = &["timeout", "timed out"];

/// Classify a terminal failure by the text of the error and its sources.
///
/// Only selects reporting category and severity; callers must not branch
/// control flow on the result.
pub fn classify(error: &(dyn Error + 'static)) -> FailureCategory {
    let mut current = Some(error);
    while let Some(err) = current {
        if is_timeout_message(&err.to_string()) {
            return FailureCategory::Timeout;
        }
        current = err.source();
    }
    FailureCategory::Unknown
}

/// Case-insensitive timeout signature check on a bare message
pub fn is_timeout_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    TIMEOUT_SIGNATURES.iter().any(|sig| lowered.contains(sig))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LocatorError;
    use selfheal_primitives::ActionError;

    #[test]
    fn timeout_signatures() {
        assert!(is_timeout_message("Timeout 1000ms exceeded"));
        assert!(is_timeout_message("navigation timed out"));
        assert!(is_timeout_message("Wait timeout: probe"));
        assert!(!is_timeout_message("element detached"));
    }

    #[test]
    fn classifies_through_source_chain() {
        let timeout = LocatorError::strategy("text", ActionError::WaitTimeout("probe".into()));
        assert_eq!(classify(&timeout), FailureCategory::Timeout);

        let unknown = LocatorError::NoCandidate("Nonexistent Action".into());
        assert_eq!(classify(&unknown), FailureCategory::Unknown);

        let io = LocatorError::strategy(
            "role",
            ActionError::BackendIo("execution context was destroyed".into()),
        );
        assert_eq!(classify(&io), FailureCategory::Unknown);
    }
}
