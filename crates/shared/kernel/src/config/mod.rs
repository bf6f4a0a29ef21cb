use arbor_domain::config::TreeConfig;
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix of environment overrides, e.g. `ARBOR__SNAPSHOT__UNKNOWN_KEYS=ignore`.
pub const ENV_PREFIX: &str = "ARBOR";

/// Config file used when no path is given.
pub const DEFAULT_CONFIG: &str = "arbor";

/// Custom error type for config loading.
#[arbor_derive::arbor_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads `T` from a file layered with environment overrides.
///
/// 1. **Base file**: `path`, or `arbor` (any supported extension) in the working directory.
/// 2. **Environment**: variables prefixed with `ARBOR__`; nesting uses double underscores
///    (`ARBOR__STORE__FEED_CAPACITY` maps to `store.feed_capacity`).
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing or does not match `T`.
///
/// # Example
/// ```rust
/// use arbor_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct ShellConfig {
///     verbose: bool,
/// }
///
/// let cfg: ShellConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(env_source());

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// Loads `T` from `ARBOR__` environment variables alone. Unset fields keep their serde
/// defaults.
///
/// # Errors
/// Returns [`ConfigError::Config`] if a variable does not match `T`.
pub fn load_env_config<T>() -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    debug!("Loading config from {ENV_PREFIX}__* environment variables");

    let config = Config::builder()
        .add_source(env_source())
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__").convert_case(config::Case::Snake)
}

/// Loads a [`TreeConfig`] with [`load_config`].
///
/// # Errors
/// See [`load_config`].
pub fn load_tree_config(path: Option<impl AsRef<Path>>) -> Result<TreeConfig, ConfigError> {
    load_config(path)
}

/// Loads a [`TreeConfig`] with [`load_env_config`].
///
/// # Errors
/// See [`load_env_config`].
pub fn load_tree_config_from_env() -> Result<TreeConfig, ConfigError> {
    load_env_config()
}
