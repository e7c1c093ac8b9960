//! selfheal
//!
//! Runs UI actions against a pre-bound anchor and, when the anchor no longer
//! works, finds the element again by its human-readable intent.
//!
//! The workspace crates are re-exported here together with layered
//! configuration, logging setup and a page-object base.

pub mod config;
pub mod logging;
pub mod page;

pub use config::{ConfigError, HealConfig, LogFormat, LoggingConfig};
pub use logging::init_logging;
pub use page::BasePage;

pub use selfheal_core_types::{ActionId, FailureCategory, Intent};
pub use selfheal_executor::{
    ActionExecutor, ActionExecutorBuilder, ActionRequest, ClickAction, ElementAction,
    ExecutionReport, ExecutorError, ExecutorPolicy, FillAction, ResolutionError, SelfHeal,
};
pub use selfheal_locator::{
    classify, DiscoveryOptions, DiscoveryStrategy, LocatorError, RecoveryEngine, RecoveryOutcome,
    RecoveryRequest, RetryPolicy, StrategyKind,
};
pub use selfheal_primitives::{
    ActionError, AnchorDescriptor, ContainerPattern, Locatable, MatchMode, MemoryPage, NodeId,
    SearchScope,
};
pub use selfheal_telemetry::{
    EventCategory, FanoutTelemetry, NoopTelemetry, RecordingTelemetry, TelemetryBus,
    TelemetryEvent, TelemetryPort, TracingTelemetry,
};
