//! Layered runtime configuration.
//!
//! # Responsibility
//! - Resolve store, pool, listing and logging settings for callers.
//!
//! # Invariants
//! - Precedence, highest first: `ROLLCALL_*` environment variables, the TOML
//!   file, built-in defaults.
//! - A loaded config has passed `validate()`.

use crate::db::PoolOptions;
use crate::logging::default_log_level;
use crate::service::query_service::{DEFAULT_RECENT_LIMIT, RECENT_LIMIT_MAX};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "rollcall.toml";
pub const ENV_PREFIX: &str = "ROLLCALL_";

#[derive(Debug)]
pub enum ConfigError {
    /// A provider failed or a value had the wrong type.
    Load(Box<figment::Error>),
    /// A value parsed but is out of range.
    Invalid {
        key: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(err) => write!(f, "failed to load configuration: {err}"),
            Self::Invalid { key, message } => write!(f, "invalid `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(err) => Some(err.as_ref()),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Load(Box::new(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollcallConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    pub pool_size: usize,
    pub checkout_timeout_ms: u64,
    /// Size of the undated attendance listing.
    pub recent_limit: u32,
    pub log_level: String,
    /// Absolute directory for rolling log files; unset disables file logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for RollcallConfig {
    fn default() -> Self {
        let pool = PoolOptions::default();
        Self {
            db_path: PathBuf::from("db/school.db"),
            pool_size: pool.max_size,
            checkout_timeout_ms: pool.checkout_timeout.as_millis() as u64,
            recent_limit: DEFAULT_RECENT_LIMIT,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl RollcallConfig {
    /// Loads defaults, `rollcall.toml` (if present) and environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads with an explicit TOML file instead of the working-directory one.
    ///
    /// An explicit file must exist; the implicit one is optional.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the provider chain.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match config_file {
            Some(path) => figment = figment.merge(Toml::file_exact(path)),
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    figment = figment.merge(Toml::file(local));
                }
            }
        }

        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "db_path",
                message: "must not be empty".to_string(),
            });
        }
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "pool_size",
                message: "must be at least 1".to_string(),
            });
        }
        if self.recent_limit == 0 || self.recent_limit > RECENT_LIMIT_MAX {
            return Err(ConfigError::Invalid {
                key: "recent_limit",
                message: format!("must be within 1..={RECENT_LIMIT_MAX}"),
            });
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid {
                    key: "log_dir",
                    message: format!("must be an absolute path, got `{}`", dir.display()),
                });
            }
        }
        Ok(())
    }

    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            max_size: self.pool_size,
            checkout_timeout: Duration::from_millis(self.checkout_timeout_ms),
        }
    }
}
