use crate::config::EngineConfig;
use crate::error::AppError;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "info";

/// Installs a stderr fmt subscriber. `RUST_LOG` wins over `default_directive`.
/// Fails instead of panicking when a global subscriber is already set.
pub fn init(default_directive: Option<&str>) -> Result<(), AppError> {
    let directive = default_directive.unwrap_or(DEFAULT_DIRECTIVE);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .map_err(|err| AppError::validation(format!("invalid log directive {directive:?}: {err}")))?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| AppError::validation(format!("logging already initialised: {err}")))
}

/// [`init`] with the `log` directive from the engine config.
pub fn init_from_config(config: &EngineConfig) -> Result<(), AppError> {
    init(config.log.as_deref())
}
