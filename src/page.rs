//! Base for page objects
//!
//! Concrete page objects hold a [`BasePage`] and call [`BasePage::safe_click`]
//! / [`BasePage::safe_fill`] with a human-readable intent next to their
//! usual anchor.

use std::sync::Arc;

use selfheal_core_types::Intent;
use selfheal_executor::{ActionExecutor, ExecutionReport, ExecutorError, ResolutionError};
use selfheal_primitives::{AnchorDescriptor, Locatable};
use selfheal_telemetry::{TelemetryPort, TracingTelemetry};

use crate::config::HealConfig;

pub struct BasePage {
    page: Arc<dyn Locatable>,
    executor: ActionExecutor,
}

impl BasePage {
    /// Report through `tracing`.
    pub fn new(page: Arc<dyn Locatable>, config: &HealConfig) -> Result<Self, ExecutorError> {
        Self::with_telemetry(page, config, Arc::new(TracingTelemetry))
    }

    pub fn with_telemetry(
        page: Arc<dyn Locatable>,
        config: &HealConfig,
        telemetry: Arc<dyn TelemetryPort>,
    ) -> Result<Self, ExecutorError> {
        let executor = config
            .executor_builder(page.clone())
            .with_telemetry(telemetry)
            .build()?;
        Ok(Self { page, executor })
    }

    pub fn page(&self) -> &Arc<dyn Locatable> {
        &self.page
    }

    pub fn executor(&self) -> &ActionExecutor {
        &self.executor
    }

    pub async fn safe_click(
        &self,
        intent: impl Into<Intent>,
        fallback: AnchorDescriptor,
    ) -> Result<ExecutionReport, ResolutionError> {
        self.executor.safe_click(intent, fallback).await
    }

    pub async fn safe_fill(
        &self,
        intent: impl Into<Intent>,
        fallback: AnchorDescriptor,
        value: &str,
    ) -> Result<ExecutionReport, ResolutionError> {
        self.executor.safe_fill(intent, fallback, value).await
    }
}
