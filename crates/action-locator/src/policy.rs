//! Retry bounds and discovery vocabulary

use std::time::Duration;

use selfheal_primitives::{ContainerPattern, MatchMode};
use serde::{Deserialize, Serialize};

/// Fixed-iteration, fixed-pause retry policy. No backoff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub retry_limit: u32,
    pub pause_ms: u64,
    /// Short budget for eliminating a candidate before the next strategy
    pub probe_timeout_ms: u64,
    /// Longer budget for confirming the chosen candidate before acting
    pub confirm_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_limit: 3,
            pause_ms: 1_000,
            probe_timeout_ms: 1_000,
            confirm_timeout_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    /// Iteration bound for one call. Zero means "not set" at both levels.
    pub fn iterations(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(limit) if limit > 0 => limit,
            _ => self.retry_limit.max(1),
        }
    }
}

/// What strategies look for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryOptions {
    pub match_mode: MatchMode,
    /// Roles the role strategy accepts, e.g. `button`, `link`
    pub control_roles: Vec<String>,
    /// Structural container the text strategy climbs to
    pub container: ContainerPattern,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::Substring,
            control_roles: vec!["button".to_string()],
            container: ContainerPattern::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retry_limit, 3);
        assert_eq!(policy.pause(), Duration::from_secs(1));
        assert_eq!(policy.probe_timeout(), Duration::from_secs(1));
        assert_eq!(policy.confirm_timeout(), Duration::from_secs(2));

        let discovery = DiscoveryOptions::default();
        assert_eq!(discovery.control_roles, vec!["button".to_string()]);
        assert_eq!(discovery.match_mode, MatchMode::Substring);
    }

    #[test]
    fn per_call_override() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.iterations(None), 3);
        assert_eq!(policy.iterations(Some(0)), 3);
        assert_eq!(policy.iterations(Some(5)), 5);

        let zero = RetryPolicy {
            retry_limit: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(zero.iterations(None), 1);
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"retry_limit": 5}"#).unwrap();
        assert_eq!(policy.retry_limit, 5);
        assert_eq!(policy.pause_ms, 1_000);
    }
}
