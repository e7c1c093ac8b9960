use std::time::Instant;

use selfheal_core_types::FailureCategory;
use selfheal_locator::{classify, LocatorError, RecoveryEngine, RecoveryOutcome, RecoveryRequest};
use selfheal_primitives::{within, ActionError, AnchorDescriptor, Locatable};
use selfheal_telemetry::{TelemetryEvent, TelemetryPort};
use tracing::{debug, error, info, instrument, warn};

use crate::errors::ResolutionError;
use crate::model::{ActionRequest, ElementAction, ExecutionReport, SelfHeal};
use crate::policy::ExecutorPolicy;

pub struct RuntimeDeps<'a> {
    pub page: &'a dyn Locatable,
    pub engine: &'a RecoveryEngine,
    pub telemetry: &'a dyn TelemetryPort,
    pub policy: &'a ExecutorPolicy,
}

/// Primary anchor once, then recovery, then the action on the resolved node.
#[instrument(skip_all, fields(action = %request.action_id, intent = %request.intent, kind = action.name()))]
pub async fn execute(
    request: &ActionRequest,
    action: &dyn ElementAction,
    deps: RuntimeDeps<'_>,
) -> Result<ExecutionReport, ResolutionError> {
    let intent = request.intent.as_str();
    deps.telemetry
        .emit(TelemetryEvent::intent_declared(&request.action_id, intent))
        .await;
    let mut report = ExecutionReport::new(request, Instant::now());

    let primary_error = match perform(&deps, action, &request.primary).await {
        Ok(()) => {
            debug!(primary = %request.primary, "primary anchor succeeded");
            return Ok(report.finish(Instant::now()));
        }
        Err(err) => err,
    };
    warn!(primary = %request.primary, error = %primary_error, "primary anchor failed");
    deps.telemetry
        .emit(TelemetryEvent::primary_failed(
            &request.action_id,
            intent,
            &request.primary.to_string(),
            &primary_error.to_string(),
        ))
        .await;
    report.primary_error = Some(primary_error.clone());

    if !deps.policy.allow_self_heal {
        return Err(fail(&deps, request, 0, LocatorError::HealingDisabled(primary_error)).await);
    }

    let recovery = RecoveryRequest {
        action_id: request.action_id.clone(),
        intent: request.intent.clone(),
        scope: deps.engine.scope_for(&request.primary).await,
        retry_limit: request.retry_limit,
    };
    match deps.engine.resolve(&recovery).await {
        RecoveryOutcome::Healed(resolution) => {
            let target = resolution.anchor();
            if let Err(err) = perform(&deps, action, &target).await {
                warn!(%target, error = %err, "healed action failed");
                return Err(fail(
                    &deps,
                    request,
                    resolution.iteration,
                    LocatorError::Backend(err),
                )
                .await);
            }
            info!(
                strategy = %resolution.strategy,
                %target,
                suggestion = %resolution.suggestion,
                "action healed"
            );
            deps.telemetry
                .emit(TelemetryEvent::healed(
                    &request.action_id,
                    intent,
                    resolution.strategy.name(),
                    &target.to_string(),
                    &resolution.suggestion,
                ))
                .await;
            report.self_heal = Some(SelfHeal::from(resolution));
            Ok(report.finish(Instant::now()))
        }
        RecoveryOutcome::Exhausted {
            iterations,
            last_error,
        } => Err(fail(&deps, request, iterations, last_error).await),
    }
}

async fn perform(
    deps: &RuntimeDeps<'_>,
    action: &dyn ElementAction,
    target: &AnchorDescriptor,
) -> Result<(), ActionError> {
    within(
        deps.policy.action_timeout(),
        action.name(),
        action.perform(deps.page, target),
    )
    .await
}

async fn fail(
    deps: &RuntimeDeps<'_>,
    request: &ActionRequest,
    attempts: u32,
    cause: LocatorError,
) -> ResolutionError {
    let category = classify(&cause);
    match category {
        FailureCategory::Timeout => {
            error!(attempts, error = %cause, "healing failed due to timeout")
        }
        FailureCategory::Unknown => error!(attempts, error = %cause, "healing failed"),
    }
    deps.telemetry
        .emit(TelemetryEvent::exhausted(
            &request.action_id,
            request.intent.as_str(),
            category,
            attempts,
            &cause.to_string(),
        ))
        .await;
    ResolutionError {
        intent: request.intent.as_str().to_string(),
        attempts,
        category,
        cause,
    }
}
