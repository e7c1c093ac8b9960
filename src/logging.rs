use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

static INIT: OnceCell<()> = OnceCell::new();

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Only the first successful call installs anything; later calls are no-ops,
/// as is a call made after some other subscriber was installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level '{}'", config.level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(false)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };
    if let Err(err) = installed {
        tracing::debug!(%err, "global subscriber already installed");
    }
    let _ = INIT.set(());
    Ok(())
}

pub fn is_initialized() -> bool {
    INIT.get().is_some()
}
