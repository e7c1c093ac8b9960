//! Self-healing action execution
//!
//! [`ActionExecutor`] runs an action against the caller's primary anchor
//! once. If that fails it asks the recovery engine for a semantically
//! matching element, runs the same action there and reports the heal. When
//! recovery is exhausted the call fails with a classified [`ResolutionError`].

pub mod api;
pub mod errors;
pub mod model;
pub mod policy;

mod runner;

pub use api::{ActionExecutor, ActionExecutorBuilder};
pub use errors::{ExecutorError, ResolutionError};
pub use model::{
    ActionRequest, ClickAction, ElementAction, ExecutionReport, FillAction, SelfHeal,
};
pub use policy::ExecutorPolicy;
