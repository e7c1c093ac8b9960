//! Layered configuration
//!
//! Built-in defaults, then an optional YAML file, then `SELFHEAL_*`
//! environment variables (`SELFHEAL_RETRY__RETRY_LIMIT=5`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{Config, Environment, File, FileFormat};
use selfheal_executor::{ActionExecutorBuilder, ExecutorPolicy};
use selfheal_locator::{DiscoveryOptions, RetryPolicy};
use selfheal_primitives::Locatable;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const ENV_PREFIX: &str = "SELFHEAL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to render configuration: {0}")]
    Render(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealConfig {
    pub retry: RetryPolicy,
    pub discovery: DiscoveryOptions,
    pub executor: ExecutorPolicy,
    pub logging: LoggingConfig,
}

impl HealConfig {
    /// `<config dir>/selfheal/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("selfheal").join("config.yaml"))
    }

    /// Load from the default path if it exists, overlaid with the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = Self::default_path() {
            debug!(path = %path.display(), "looking for configuration file");
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(false));
        }
        Self::finish(builder.add_source(env_source()))
    }

    /// Load from an explicit file, which must exist, overlaid with the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml).required(true))
            .add_source(env_source());
        let config = Self::finish(builder)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse a YAML document without consulting the environment.
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        Self::finish(Config::builder().add_source(File::from_str(source, FileFormat::Yaml)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.probe_timeout_ms == 0 || self.retry.confirm_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "probe timeouts must be greater than zero".to_string(),
            ));
        }
        if self.executor.action_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "executor.action_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.discovery.control_roles.is_empty() {
            return Err(ConfigError::Invalid(
                "discovery.control_roles must name at least one role".to_string(),
            ));
        }
        Ok(())
    }

    /// Executor builder carrying this configuration's policies.
    pub fn executor_builder(&self, page: Arc<dyn Locatable>) -> ActionExecutorBuilder {
        ActionExecutorBuilder::new(self.executor.clone())
            .with_retry_policy(self.retry.clone())
            .with_discovery(self.discovery.clone())
            .with_page(page)
    }

    fn finish(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        let config: HealConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("discovery.control_roles")
        .with_list_parse_key("discovery.container.classes")
        .with_list_parse_key("discovery.container.tags")
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfheal_primitives::MatchMode;

    #[test]
    fn defaults_match_documented_values() {
        let config = HealConfig::default();
        assert_eq!(config.retry.retry_limit, 3);
        assert_eq!(config.retry.pause_ms, 1_000);
        assert_eq!(config.retry.probe_timeout_ms, 1_000);
        assert_eq!(config.retry.confirm_timeout_ms, 2_000);
        assert_eq!(config.discovery.control_roles, vec!["button".to_string()]);
        assert!(config.executor.allow_self_heal);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = HealConfig::from_yaml(
            "retry:\n  retry_limit: 5\ndiscovery:\n  match_mode: exact\n  control_roles: [button, link]\n",
        )
        .unwrap();
        assert_eq!(config.retry.retry_limit, 5);
        assert_eq!(config.retry.pause_ms, 1_000);
        assert_eq!(config.discovery.match_mode, MatchMode::Exact);
        assert_eq!(config.discovery.control_roles, vec!["button", "link"]);
        assert_eq!(config.executor, ExecutorPolicy::default());
    }

    #[test]
    fn yaml_round_trip() {
        let mut config = HealConfig::default();
        config.logging.format = LogFormat::Json;
        let rendered = config.to_yaml().unwrap();
        assert!(rendered.contains("format: json"));
        assert_eq!(HealConfig::from_yaml(&rendered).unwrap(), config);
    }

    #[test]
    fn rejects_unusable_values() {
        let err = HealConfig::from_yaml("discovery:\n  control_roles: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = HealConfig::from_yaml("executor:\n  action_timeout_ms: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
