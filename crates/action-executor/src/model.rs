use std::time::Instant;

use async_trait::async_trait;
use selfheal_core_types::{ActionId, Intent};
use selfheal_locator::{MatchRoute, Resolution, StrategyKind};
use selfheal_primitives::{ActionError, AnchorDescriptor, Locatable};

/// Interaction applied to whichever anchor the executor settles on.
#[async_trait]
pub trait ElementAction: Send + Sync {
    fn name(&self) -> &'static str;

    async fn perform(
        &self,
        page: &dyn Locatable,
        target: &AnchorDescriptor,
    ) -> Result<(), ActionError>;
}

/// Scroll into view, then click.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClickAction;

#[async_trait]
impl ElementAction for ClickAction {
    fn name(&self) -> &'static str {
        "click"
    }

    async fn perform(
        &self,
        page: &dyn Locatable,
        target: &AnchorDescriptor,
    ) -> Result<(), ActionError> {
        page.scroll_into_view(target).await?;
        page.click(target).await
    }
}

/// Scroll into view, then replace the element's value.
#[derive(Clone, Debug)]
pub struct FillAction {
    pub value: String,
}

impl FillAction {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[async_trait]
impl ElementAction for FillAction {
    fn name(&self) -> &'static str {
        "fill"
    }

    async fn perform(
        &self,
        page: &dyn Locatable,
        target: &AnchorDescriptor,
    ) -> Result<(), ActionError> {
        page.scroll_into_view(target).await?;
        page.fill(target, &self.value).await
    }
}

/// One step as submitted by the caller.
#[derive(Clone, Debug)]
pub struct ActionRequest {
    pub action_id: ActionId,
    pub intent: Intent,
    pub primary: AnchorDescriptor,
    /// Overrides the configured iteration bound when non-zero
    pub retry_limit: Option<u32>,
}

impl ActionRequest {
    pub fn new(intent: impl Into<Intent>, primary: AnchorDescriptor) -> Self {
        Self {
            action_id: ActionId::new(),
            intent: intent.into(),
            primary,
            retry_limit: None,
        }
    }

    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = Some(limit);
        self
    }
}

/// Outcome of a successful step.
#[derive(Clone, Debug)]
pub struct ExecutionReport {
    pub action_id: ActionId,
    pub intent: Intent,
    pub ok: bool,
    pub started_at: Instant,
    pub finished_at: Instant,
    pub latency_ms: u128,
    pub primary_error: Option<ActionError>,
    pub self_heal: Option<SelfHeal>,
}

impl ExecutionReport {
    pub fn new(request: &ActionRequest, started_at: Instant) -> Self {
        Self {
            action_id: request.action_id.clone(),
            intent: request.intent.clone(),
            ok: false,
            started_at,
            finished_at: started_at,
            latency_ms: 0,
            primary_error: None,
            self_heal: None,
        }
    }

    pub fn finish(mut self, finished_at: Instant) -> Self {
        self.ok = true;
        self.finished_at = finished_at;
        self.latency_ms = finished_at
            .saturating_duration_since(self.started_at)
            .as_millis();
        self
    }

    pub fn healed(&self) -> bool {
        self.self_heal.is_some()
    }
}

/// What recovery substituted for the primary anchor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelfHeal {
    pub strategy: StrategyKind,
    pub route: MatchRoute,
    pub used_anchor: AnchorDescriptor,
    pub suggestion: String,
    pub iteration: u32,
}

impl From<Resolution> for SelfHeal {
    fn from(resolution: Resolution) -> Self {
        Self {
            used_anchor: resolution.anchor(),
            strategy: resolution.strategy,
            route: resolution.route,
            suggestion: resolution.suggestion,
            iteration: resolution.iteration,
        }
    }
}
