//! Core types for intent-driven discovery

use std::fmt;
use std::time::Duration;

use selfheal_core_types::{ActionId, Intent};
use selfheal_primitives::{AnchorDescriptor, NodeId, SearchScope};
use serde::{Deserialize, Serialize};

use crate::errors::LocatorError;

/// Discovery strategy identifier
///
/// The built-in chain runs:
/// - Role: interactive control whose accessible name matches the intent
/// - Text: element whose text matches, or the control sharing its container
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Role + accessible name strategy
    Role,

    /// Text content strategy with container climb
    Text,

    /// Caller-supplied strategy
    Custom(String),
}

impl StrategyKind {
    /// Get strategy name as string
    pub fn name(&self) -> &str {
        match self {
            StrategyKind::Role => "role",
            StrategyKind::Text => "text",
            StrategyKind::Custom(name) => name.as_str(),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a candidate was reached from the matched element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRoute {
    /// The matched element is the target itself
    Direct,

    /// The matched element is a label; the target is the first control inside
    /// its nearest structural container
    Container { label: NodeId, container: NodeId },
}

/// Element proposed by a strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Node to act on
    pub node: NodeId,

    /// Strategy that produced it
    pub strategy: StrategyKind,

    /// Path from matched element to target
    pub route: MatchRoute,

    /// Semantic selector the caller should adopt instead of the broken one
    pub suggestion: String,
}

impl Candidate {
    pub fn direct(node: NodeId, strategy: StrategyKind, suggestion: impl Into<String>) -> Self {
        Self {
            node,
            strategy,
            route: MatchRoute::Direct,
            suggestion: suggestion.into(),
        }
    }

    /// Anchor addressing the candidate node
    pub fn anchor(&self) -> AnchorDescriptor {
        AnchorDescriptor::Node(self.node)
    }
}

/// One strategy evaluation inside one iteration. Lives only for the
/// duration of a resolve call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionAttempt {
    pub strategy: StrategyKind,
    pub iteration: u32,
    pub success: bool,
    pub duration: Duration,
    pub error: Option<String>,
}

/// Input to [`crate::RecoveryEngine::resolve`]
#[derive(Debug, Clone)]
pub struct RecoveryRequest {
    /// Correlates telemetry with the action being healed
    pub action_id: ActionId,

    /// Search key
    pub intent: Intent,

    /// Structural boundary for every query
    pub scope: SearchScope,

    /// Per-call iteration bound; `None` or `Some(0)` uses the policy default
    pub retry_limit: Option<u32>,
}

impl RecoveryRequest {
    pub fn new(intent: impl Into<Intent>) -> Self {
        Self {
            action_id: ActionId::new(),
            intent: intent.into(),
            scope: SearchScope::Document,
            retry_limit: None,
        }
    }

    pub fn with_action_id(mut self, action_id: ActionId) -> Self {
        self.action_id = action_id;
        self
    }

    pub fn within(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = Some(limit);
        self
    }
}

/// Successful discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub node: NodeId,
    pub strategy: StrategyKind,
    pub route: MatchRoute,
    /// 1-based iteration that produced the match
    pub iteration: u32,
    pub suggestion: String,
}

impl Resolution {
    pub fn from_candidate(candidate: Candidate, iteration: u32) -> Self {
        Self {
            node: candidate.node,
            strategy: candidate.strategy,
            route: candidate.route,
            iteration,
            suggestion: candidate.suggestion,
        }
    }

    pub fn anchor(&self) -> AnchorDescriptor {
        AnchorDescriptor::Node(self.node)
    }
}

/// Result of a resolve call. Exhaustion is a value, not an error.
#[derive(Debug, Clone)]
pub enum RecoveryOutcome {
    /// A visible candidate was confirmed
    Healed(Resolution),

    /// No candidate after `iterations` attempts
    Exhausted {
        iterations: u32,
        last_error: LocatorError,
    },
}

impl RecoveryOutcome {
    /// Check if discovery succeeded
    pub fn is_healed(&self) -> bool {
        matches!(self, RecoveryOutcome::Healed(_))
    }

    /// Get the resolution if discovery succeeded
    pub fn resolution(&self) -> Option<&Resolution> {
        match self {
            RecoveryOutcome::Healed(resolution) => Some(resolution),
            RecoveryOutcome::Exhausted { .. } => None,
        }
    }

    /// Iterations consumed
    pub fn iterations(&self) -> u32 {
        match self {
            RecoveryOutcome::Healed(resolution) => resolution.iteration,
            RecoveryOutcome::Exhausted { iterations, .. } => *iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names() {
        assert_eq!(StrategyKind::Role.to_string(), "role");
        assert_eq!(StrategyKind::Custom("testid".into()).to_string(), "testid");
    }

    #[test]
    fn outcome_accessors() {
        let healed = RecoveryOutcome::Healed(Resolution::from_candidate(
            Candidate::direct(NodeId(3), StrategyKind::Role, "aria:button[name='Go']"),
            2,
        ));
        assert!(healed.is_healed());
        assert_eq!(healed.iterations(), 2);
        assert_eq!(
            healed.resolution().map(|r| r.anchor()),
            Some(AnchorDescriptor::Node(NodeId(3)))
        );

        let exhausted = RecoveryOutcome::Exhausted {
            iterations: 3,
            last_error: LocatorError::NoCandidate("Go".into()),
        };
        assert!(!exhausted.is_healed());
        assert_eq!(exhausted.iterations(), 3);
        assert!(exhausted.resolution().is_none());
    }

    #[test]
    fn request_builder() {
        let request = RecoveryRequest::new("Submit")
            .within(SearchScope::Within(NodeId(1)))
            .with_retry_limit(5);
        assert_eq!(request.intent.as_str(), "Submit");
        assert_eq!(request.scope, SearchScope::Within(NodeId(1)));
        assert_eq!(request.retry_limit, Some(5));
    }
}
