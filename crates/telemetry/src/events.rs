//! Telemetry events emitted while executing and healing an action

use std::time::Duration;

use chrono::{DateTime, Utc};
use selfheal_core_types::{ActionId, FailureCategory};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Intent,
    Recovery,
    Strategy,
    Healed,
    Failure,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Intent => "intent",
            EventCategory::Recovery => "recovery",
            EventCategory::Strategy => "strategy",
            EventCategory::Healed => "healed",
            EventCategory::Failure => "failure",
        }
    }
}

/// Structured payload carried next to the human readable message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventDetail {
    IntentDeclared,
    PrimaryFailed {
        anchor: String,
        error: String,
    },
    StrategyAttempt {
        strategy: String,
        iteration: u32,
        success: bool,
        duration_ms: u64,
        error: Option<String>,
    },
    IterationFailed {
        iteration: u32,
        limit: u32,
        error: String,
    },
    Healed {
        strategy: String,
        target: String,
        suggestion: String,
    },
    Exhausted {
        classification: FailureCategory,
        attempts: u32,
        error: String,
    },
}

/// Outcome of one strategy evaluation, as reported to telemetry.
#[derive(Clone, Debug)]
pub struct AttemptReport<'a> {
    pub strategy: &'a str,
    pub iteration: u32,
    pub success: bool,
    pub duration: Duration,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    pub category: EventCategory,
    pub action_id: ActionId,
    pub intent: String,
    pub message: String,
    pub detail: EventDetail,
}

impl TelemetryEvent {
    fn new(
        level: EventLevel,
        category: EventCategory,
        action_id: &ActionId,
        intent: &str,
        message: String,
        detail: EventDetail,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            category,
            action_id: action_id.clone(),
            intent: intent.to_string(),
            message,
            detail,
        }
    }

    pub fn intent_declared(action_id: &ActionId, intent: &str) -> Self {
        Self::new(
            EventLevel::Info,
            EventCategory::Intent,
            action_id,
            intent,
            format!("Action intent: \"{}\"", intent),
            EventDetail::IntentDeclared,
        )
    }

    pub fn primary_failed(action_id: &ActionId, intent: &str, anchor: &str, error: &str) -> Self {
        Self::new(
            EventLevel::Warn,
            EventCategory::Recovery,
            action_id,
            intent,
            format!(
                "Primary locator {} failed: {}. Entering recovery for \"{}\"",
                anchor, error, intent
            ),
            EventDetail::PrimaryFailed {
                anchor: anchor.to_string(),
                error: error.to_string(),
            },
        )
    }

    pub fn strategy_attempt(action_id: &ActionId, intent: &str, attempt: AttemptReport<'_>) -> Self {
        let message = if attempt.success {
            format!(
                "Strategy '{}' found a candidate for \"{}\" (iteration {})",
                attempt.strategy, intent, attempt.iteration
            )
        } else {
            match &attempt.error {
                Some(error) => format!(
                    "Strategy '{}' failed for \"{}\" (iteration {}): {}",
                    attempt.strategy, intent, attempt.iteration, error
                ),
                None => format!(
                    "Strategy '{}' found nothing for \"{}\" (iteration {})",
                    attempt.strategy, intent, attempt.iteration
                ),
            }
        };
        let level = if attempt.success {
            EventLevel::Info
        } else {
            EventLevel::Debug
        };
        Self::new(
            level,
            EventCategory::Strategy,
            action_id,
            intent,
            message,
            EventDetail::StrategyAttempt {
                strategy: attempt.strategy.to_string(),
                iteration: attempt.iteration,
                success: attempt.success,
                duration_ms: u64::try_from(attempt.duration.as_millis()).unwrap_or(u64::MAX),
                error: attempt.error,
            },
        )
    }

    pub fn iteration_failed(
        action_id: &ActionId,
        intent: &str,
        iteration: u32,
        limit: u32,
        error: &str,
    ) -> Self {
        Self::new(
            EventLevel::Warn,
            EventCategory::Recovery,
            action_id,
            intent,
            format!("Healing attempt {}/{} failed: {}", iteration, limit, error),
            EventDetail::IterationFailed {
                iteration,
                limit,
                error: error.to_string(),
            },
        )
    }

    pub fn healed(
        action_id: &ActionId,
        intent: &str,
        strategy: &str,
        target: &str,
        suggestion: &str,
    ) -> Self {
        Self::new(
            EventLevel::Warn,
            EventCategory::Healed,
            action_id,
            intent,
            format!(
                "HEALED: used {} match {} for \"{}\". Suggested update: {}",
                strategy, target, intent, suggestion
            ),
            EventDetail::Healed {
                strategy: strategy.to_string(),
                target: target.to_string(),
                suggestion: suggestion.to_string(),
            },
        )
    }

    pub fn exhausted(
        action_id: &ActionId,
        intent: &str,
        classification: FailureCategory,
        attempts: u32,
        error: &str,
    ) -> Self {
        let message = match classification {
            FailureCategory::Timeout => format!(
                "CRITICAL: healing failed due to TIMEOUT for \"{}\" after {} attempt(s)",
                intent, attempts
            ),
            FailureCategory::Unknown => format!(
                "CRITICAL: healing failed for \"{}\" after {} attempt(s): {}",
                intent, attempts, error
            ),
        };
        Self::new(
            EventLevel::Error,
            EventCategory::Failure,
            action_id,
            intent,
            message,
            EventDetail::Exhausted {
                classification,
                attempts,
                error: error.to_string(),
            },
        )
    }

    /// Everything except the intent declaration belongs to the recovery path.
    pub fn is_recovery(&self) -> bool {
        self.category != EventCategory::Intent
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_declaration_is_not_recovery() {
        let id = ActionId::new();
        let event = TelemetryEvent::intent_declared(&id, "Submit");
        assert!(!event.is_recovery());
        assert_eq!(event.level, EventLevel::Info);
        assert_eq!(event.message, "Action intent: \"Submit\"");
        assert!(TelemetryEvent::primary_failed(&id, "Submit", "css:#x", "gone").is_recovery());
    }

    #[test]
    fn exhausted_message_depends_on_classification() {
        let id = ActionId::new();
        let timeout =
            TelemetryEvent::exhausted(&id, "Pay", FailureCategory::Timeout, 3, "Wait timeout: x");
        assert!(timeout.message.contains("TIMEOUT"));
        assert_eq!(timeout.level, EventLevel::Error);

        let unknown = TelemetryEvent::exhausted(&id, "Pay", FailureCategory::Unknown, 3, "boom");
        assert!(unknown.message.contains("boom"));
        assert!(unknown.message.contains("3 attempt(s)"));
    }

    #[test]
    fn strategy_attempt_levels() {
        let id = ActionId::new();
        let hit = TelemetryEvent::strategy_attempt(
            &id,
            "Submit",
            AttemptReport {
                strategy: "role",
                iteration: 1,
                success: true,
                duration: Duration::from_millis(12),
                error: None,
            },
        );
        assert_eq!(hit.level, EventLevel::Info);
        assert_eq!(hit.category, EventCategory::Strategy);
        match hit.detail {
            EventDetail::StrategyAttempt { duration_ms, .. } => assert_eq!(duration_ms, 12),
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn serializes_to_json() {
        let event = TelemetryEvent::healed(
            &ActionId::new(),
            "Submit",
            "role",
            "node:#4",
            "aria:button[name='Submit']",
        );
        let json = event.to_json().unwrap();
        assert!(json.contains("\"category\":\"healed\""));
        assert!(json.contains("\"type\":\"healed\""));
        assert!(json.contains("\"level\":\"warn\""));
    }
}
