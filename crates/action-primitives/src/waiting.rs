//! Time-boxed probes around a [`Locatable`] backend

use crate::{errors::ActionError, locator::Locatable, types::AnchorDescriptor};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Visibility probe that never outlives `timeout`, even if the backend
/// ignores the budget it was handed.
pub async fn probe_visible(
    page: &dyn Locatable,
    target: &AnchorDescriptor,
    timeout: Duration,
) -> Result<bool, ActionError> {
    within(timeout, "visibility probe", page.is_visible(target, timeout)).await
}

/// Run `fut` under a deadline, mapping expiry to [`ActionError::WaitTimeout`].
pub async fn within<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T, ActionError>
where
    F: Future<Output = Result<T, ActionError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            debug!("{} exceeded {}ms", what, timeout.as_millis());
            Err(ActionError::WaitTimeout(format!(
                "{} exceeded {}ms",
                what,
                timeout.as_millis()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn within_maps_expiry_to_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, ActionError>(())
        };
        let err = within(Duration::from_millis(100), "slow op", slow)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("slow op exceeded 100ms"));
    }

    #[tokio::test]
    async fn within_passes_through_results() {
        let value = within(Duration::from_secs(1), "fast op", async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
