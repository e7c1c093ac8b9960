use thiserror::Error;

use selfheal_core_types::FailureCategory;
use selfheal_locator::LocatorError;

/// Terminal failure of a self-healing action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to resolve \"{intent}\" after {attempts} attempt(s): {cause}")]
pub struct ResolutionError {
    pub intent: String,
    pub attempts: u32,
    pub category: FailureCategory,
    #[source]
    pub cause: LocatorError,
}

impl ResolutionError {
    pub fn is_timeout(&self) -> bool {
        self.category == FailureCategory::Timeout
    }
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("executor requires a page")]
    MissingPage,
}
