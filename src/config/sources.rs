use super::models::Settings;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "FETCHBATCH_CONFIG";
const PROXY_ENV_VAR: &str = "FETCHBATCH_PROXY";
const DEFAULT_CONFIG_PATH: &str = "fetchbatch.toml";
const ENV_PREFIX: &str = "FETCHBATCH";
const ENV_SEPARATOR: &str = "__";

/// Load settings from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (explicit path, `FETCHBATCH_CONFIG`, or `fetchbatch.toml`)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(explicit_path: Option<PathBuf>) -> Result<Settings, ConfigError> {
    // A missing .env is the normal case
    let _ = dotenvy::dotenv();

    let config_path = explicit_path
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut settings = load_from_sources(config_path)?;
    load_secrets(&mut settings);

    Ok(settings)
}

/// Proxy URLs can embed credentials, so they may come from the environment only
fn load_secrets(settings: &mut Settings) {
    if settings.http.proxy.is_none() {
        if let Ok(proxy) = env::var(PROXY_ENV_VAR) {
            settings.http.proxy = Some(proxy);
        }
    }
}

/// Load settings from a specific path and the environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // FETCHBATCH__DOWNLOAD__RETRY_ATTEMPT -> download.retry_attempt
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
