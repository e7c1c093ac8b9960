//! Locator capability consumed by the selfheal recovery engine
//!
//! This crate provides:
//! - the [`Locatable`] trait an automation backend implements
//! - element anchors, search scopes and container patterns
//! - text matching (substring / exact / pattern)
//! - time-boxed probe helpers
//! - an in-memory backend ([`MemoryPage`]) over HTML parsed with `scraper`,
//!   for tests and dry runs

mod dom;
pub mod errors;
mod locator;
pub mod matching;
mod memory;
pub mod types;
mod waiting;

pub use dom::{Document, Dom};
pub use errors::*;
pub use locator::*;
pub use matching::{normalize_whitespace, MatchMode, TextMatcher};
pub use memory::*;
pub use types::*;
pub use waiting::*;
