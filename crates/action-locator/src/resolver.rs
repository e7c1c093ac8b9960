//! Recovery engine: strategy chain under a bounded retry loop

use std::sync::Arc;

use selfheal_primitives::{probe_visible, AnchorDescriptor, Locatable, SearchScope, TextMatcher};
use selfheal_telemetry::{AttemptReport, NoopTelemetry, TelemetryEvent, TelemetryPort};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    errors::LocatorError,
    policy::{DiscoveryOptions, RetryPolicy},
    strategies::{default_strategies, DiscoveryContext, DiscoveryStrategy},
    types::{Candidate, RecoveryOutcome, RecoveryRequest, Resolution, ResolutionAttempt},
};

/// Resolves an intent to a visible element, retrying the whole strategy chain
/// up to the policy's iteration bound.
///
/// The engine keeps no state between calls; two calls against an unchanged
/// document resolve to the same node through the same strategy.
pub struct RecoveryEngine {
    page: Arc<dyn Locatable>,
    strategies: Vec<Arc<dyn DiscoveryStrategy>>,
    retry: RetryPolicy,
    discovery: DiscoveryOptions,
    telemetry: Arc<dyn TelemetryPort>,
}

impl RecoveryEngine {
    pub fn new(page: Arc<dyn Locatable>) -> Self {
        Self {
            page,
            strategies: default_strategies(),
            retry: RetryPolicy::default(),
            discovery: DiscoveryOptions::default(),
            telemetry: Arc::new(NoopTelemetry),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryOptions) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetryPort>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Replace the strategy chain. Order is priority order.
    pub fn with_strategies(mut self, strategies: Vec<Arc<dyn DiscoveryStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn page(&self) -> &Arc<dyn Locatable> {
        &self.page
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn discovery(&self) -> &DiscoveryOptions {
        &self.discovery
    }

    /// Search scope for a failed primary anchor. Backend errors widen the
    /// scope to the whole document.
    pub async fn scope_for(&self, primary: &AnchorDescriptor) -> SearchScope {
        match self.page.scope_of(primary).await {
            Ok(scope) => scope,
            Err(err) => {
                debug!(%primary, %err, "scope lookup failed, searching the whole document");
                SearchScope::Document
            }
        }
    }

    pub async fn resolve(&self, request: &RecoveryRequest) -> RecoveryOutcome {
        let intent = request.intent.as_str();
        if request.intent.is_blank() {
            return RecoveryOutcome::Exhausted {
                iterations: 0,
                last_error: LocatorError::InvalidIntent("intent is blank".to_string()),
            };
        }
        let matcher = match TextMatcher::new(intent, self.discovery.match_mode) {
            Ok(matcher) => matcher,
            Err(err) => {
                return RecoveryOutcome::Exhausted {
                    iterations: 0,
                    last_error: LocatorError::InvalidIntent(err.to_string()),
                }
            }
        };

        let limit = self.retry.iterations(request.retry_limit);
        info!(intent, limit, scope = ?request.scope, "recovery started");

        let mut last_error = LocatorError::NoCandidate(intent.to_string());
        for iteration in 1..=limit {
            match self.run_iteration(request, &matcher, iteration).await {
                Ok(resolution) => {
                    info!(
                        intent,
                        iteration,
                        strategy = %resolution.strategy,
                        node = %resolution.node,
                        "recovery resolved intent"
                    );
                    return RecoveryOutcome::Healed(resolution);
                }
                Err(err) => {
                    warn!(intent, iteration, limit, %err, "healing attempt failed");
                    self.telemetry
                        .emit(TelemetryEvent::iteration_failed(
                            &request.action_id,
                            intent,
                            iteration,
                            limit,
                            &err.to_string(),
                        ))
                        .await;
                    if !err.is_retryable() {
                        warn!(intent, iteration, "error is not retryable, stopping recovery");
                        return RecoveryOutcome::Exhausted {
                            iterations: iteration,
                            last_error: err,
                        };
                    }
                    last_error = err;
                }
            }
            if iteration < limit {
                tokio::time::sleep(self.retry.pause()).await;
            }
        }

        RecoveryOutcome::Exhausted {
            iterations: limit,
            last_error,
        }
    }

    async fn run_iteration(
        &self,
        request: &RecoveryRequest,
        matcher: &TextMatcher,
        iteration: u32,
    ) -> Result<Resolution, LocatorError> {
        let ctx = DiscoveryContext {
            page: self.page.as_ref(),
            intent: &request.intent,
            matcher,
            scope: request.scope,
            probe_timeout: self.retry.probe_timeout(),
            options: &self.discovery,
        };

        let mut first_failure = None;
        for strategy in &self.strategies {
            let kind = strategy.kind();
            let started = Instant::now();
            let result = strategy.discover(&ctx).await;
            let attempt = ResolutionAttempt {
                strategy: kind,
                iteration,
                success: matches!(result, Ok(Some(_))),
                duration: started.elapsed(),
                error: result.as_ref().err().map(ToString::to_string),
            };
            self.record(request, attempt).await;

            match result {
                Ok(Some(candidate)) => return self.confirm(request, candidate, iteration).await,
                Ok(None) => {}
                Err(err) => {
                    first_failure.get_or_insert(err);
                }
            }
        }

        Err(first_failure
            .unwrap_or_else(|| LocatorError::NoCandidate(request.intent.as_str().to_string())))
    }

    async fn confirm(
        &self,
        request: &RecoveryRequest,
        candidate: Candidate,
        iteration: u32,
    ) -> Result<Resolution, LocatorError> {
        let visible = probe_visible(
            self.page.as_ref(),
            &candidate.anchor(),
            self.retry.confirm_timeout(),
        )
        .await
        .map_err(|err| LocatorError::strategy(candidate.strategy.name(), err))?;
        if !visible {
            debug!(node = %candidate.node, "candidate failed confirmation");
            return Err(LocatorError::NoCandidate(
                request.intent.as_str().to_string(),
            ));
        }
        Ok(Resolution::from_candidate(candidate, iteration))
    }

    async fn record(&self, request: &RecoveryRequest, attempt: ResolutionAttempt) {
        debug!(
            strategy = %attempt.strategy,
            iteration = attempt.iteration,
            success = attempt.success,
            duration_ms = attempt.duration.as_millis() as u64,
            error = attempt.error.as_deref().unwrap_or(""),
            "strategy attempt"
        );
        self.telemetry
            .emit(TelemetryEvent::strategy_attempt(
                &request.action_id,
                request.intent.as_str(),
                AttemptReport {
                    strategy: attempt.strategy.name(),
                    iteration: attempt.iteration,
                    success: attempt.success,
                    duration: attempt.duration,
                    error: attempt.error,
                },
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfheal_primitives::MemoryPage;

    #[tokio::test]
    async fn blank_intent_is_rejected_without_probing() {
        let page = Arc::new(MemoryPage::from_markup("<button>Go</button>"));
        let engine = RecoveryEngine::new(page.clone());

        let outcome = engine.resolve(&RecoveryRequest::new("   ")).await;
        match outcome {
            RecoveryOutcome::Exhausted {
                iterations,
                last_error,
            } => {
                assert_eq!(iterations, 0);
                assert!(matches!(last_error, LocatorError::InvalidIntent(_)));
            }
            RecoveryOutcome::Healed(_) => panic!("blank intent must not heal"),
        }
        assert_eq!(page.probe_count(), 0);
    }

    #[tokio::test]
    async fn scope_falls_back_to_document() {
        let page = Arc::new(MemoryPage::from_markup(
            r#"<form id="f"><button id="b">Go</button></form>"#,
        ));
        let engine = RecoveryEngine::new(page.clone());
        assert_eq!(
            engine.scope_for(&AnchorDescriptor::css("#b")).await,
            SearchScope::Within(page.element_by_id("f").unwrap())
        );
        assert_eq!(
            engine.scope_for(&AnchorDescriptor::css("#missingId")).await,
            SearchScope::Document
        );
    }
}
