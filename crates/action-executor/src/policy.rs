use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorPolicy {
    pub allow_self_heal: bool,
    pub action_timeout_ms: u64,
}

impl Default for ExecutorPolicy {
    fn default() -> Self {
        Self {
            allow_self_heal: true,
            action_timeout_ms: 5_000,
        }
    }
}

impl ExecutorPolicy {
    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }
}
