use std::sync::Arc;

use selfheal_core_types::Intent;
use selfheal_locator::{
    DiscoveryOptions, DiscoveryStrategy, RecoveryEngine, RetryPolicy,
};
use selfheal_primitives::{AnchorDescriptor, Locatable};
use selfheal_telemetry::{NoopTelemetry, TelemetryPort};

use crate::errors::{ExecutorError, ResolutionError};
use crate::model::{ActionRequest, ClickAction, ElementAction, ExecutionReport, FillAction};
use crate::policy::ExecutorPolicy;
use crate::runner::{execute, RuntimeDeps};

pub struct ActionExecutorBuilder {
    policy: ExecutorPolicy,
    retry: RetryPolicy,
    discovery: DiscoveryOptions,
    page: Option<Arc<dyn Locatable>>,
    telemetry: Option<Arc<dyn TelemetryPort>>,
    strategies: Option<Vec<Arc<dyn DiscoveryStrategy>>>,
}

impl ActionExecutorBuilder {
    pub fn new(policy: ExecutorPolicy) -> Self {
        Self {
            policy,
            retry: RetryPolicy::default(),
            discovery: DiscoveryOptions::default(),
            page: None,
            telemetry: None,
            strategies: None,
        }
    }

    pub fn with_page(mut self, page: Arc<dyn Locatable>) -> Self {
        self.page = Some(page);
        self
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
        self.telemetry = Some(telemetry);
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<Arc<dyn DiscoveryStrategy>>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    pub fn build(self) -> Result<ActionExecutor, ExecutorError> {
        let page = self.page.ok_or(ExecutorError::MissingPage)?;
        let telemetry = self
            .telemetry
            .unwrap_or_else(|| Arc::new(NoopTelemetry) as Arc<dyn TelemetryPort>);
        let mut engine = RecoveryEngine::new(page.clone())
            .with_retry_policy(self.retry)
            .with_discovery(self.discovery)
            .with_telemetry(telemetry.clone());
        if let Some(strategies) = self.strategies {
            engine = engine.with_strategies(strategies);
        }
        Ok(ActionExecutor {
            policy: self.policy,
            page,
            engine,
            telemetry,
        })
    }
}

/// Entry point for self-healing interactions against one page.
pub struct ActionExecutor {
    policy: ExecutorPolicy,
    page: Arc<dyn Locatable>,
    engine: RecoveryEngine,
    telemetry: Arc<dyn TelemetryPort>,
}

impl ActionExecutor {
    pub fn builder() -> ActionExecutorBuilder {
        ActionExecutorBuilder::new(ExecutorPolicy::default())
    }

    pub fn policy(&self) -> &ExecutorPolicy {
        &self.policy
    }

    pub fn engine(&self) -> &RecoveryEngine {
        &self.engine
    }

    pub async fn execute(
        &self,
        request: &ActionRequest,
        action: &dyn ElementAction,
    ) -> Result<ExecutionReport, ResolutionError> {
        let runtime = RuntimeDeps {
            page: self.page.as_ref(),
            engine: &self.engine,
            telemetry: self.telemetry.as_ref(),
            policy: &self.policy,
        };
        execute(request, action, runtime).await
    }

    pub async fn safe_click(
        &self,
        intent: impl Into<Intent>,
        primary: AnchorDescriptor,
    ) -> Result<ExecutionReport, ResolutionError> {
        self.execute(&ActionRequest::new(intent, primary), &ClickAction)
            .await
    }

    pub async fn safe_fill(
        &self,
        intent: impl Into<Intent>,
        primary: AnchorDescriptor,
        value: &str,
    ) -> Result<ExecutionReport, ResolutionError> {
        self.execute(&ActionRequest::new(intent, primary), &FillAction::new(value))
            .await
    }
}
