use ferrous_router_domain::{DomainError, LoggingConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Fails when a global
/// subscriber is already set or the level does not parse.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), DomainError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            DomainError::ConfigError(format!("Invalid log level '{}': {}", config.level, e))
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.with_ansi(true).try_init()
    };
    installed.map_err(|e| DomainError::ConfigError(format!("Logging already initialized: {}", e)))?;

    info!(level = %config.level, json = config.json, "Logging initialized");
    Ok(())
}
