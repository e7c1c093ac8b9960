//! Intent-driven element discovery with bounded retries
//!
//! This crate implements the recovery half of self-healing:
//! - role-based discovery (accessible name match on interactive controls)
//! - text-based discovery with a climb to the label's structural container
//! - a fixed-iteration, fixed-pause retry policy with short elimination
//!   probes and a longer confirmation probe
//! - classification of terminal failures for reporting

pub mod classify;
pub mod errors;
pub mod policy;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use classify::*;
pub use errors::*;
pub use policy::*;
pub use resolver::*;
pub use strategies::*;
pub use types::*;
