//! # configs
//!
//! Runtime settings, read from the environment (and a `.env` file when one
//! is present).
//!
//! | key                   | variable                       | default  |
//! |-----------------------|--------------------------------|----------|
//! | `port`                | `PORT`                         | 5000     |
//! | `static_dir`          | `ULTRAGOL_STATIC_DIR`          | `public` |
//! | `database_url`        | `ULTRAGOL_DATABASE_URL`        | none     |
//! | `sweep_grace_secs`    | `ULTRAGOL_SWEEP_GRACE_SECS`    | 5        |
//! | `sweep_interval_secs` | `ULTRAGOL_SWEEP_INTERVAL_SECS` | 3600     |
//! | `log_json`            | `ULTRAGOL_LOG_JSON`            | false    |

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "ULTRAGOL";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Source(#[from] ConfigError),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub port: u16,
    pub static_dir: PathBuf,
    #[serde(default)]
    pub database_url: Option<String>,
    pub sweep_grace_secs: u64,
    pub sweep_interval_secs: u64,
    pub log_json: bool,
}

impl Settings {
    /// Loads `.env` if present, then reads the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
        }
        Self::from_vars(std::env::vars().collect())
    }

    /// Builds settings from an explicit variable map.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, SettingsError> {
        let port = vars.get("PORT").cloned();
        let settings: Settings = Config::builder()
            .set_default("port", 5000)?
            .set_default("static_dir", "public")?
            .set_default("sweep_grace_secs", 5)?
            .set_default("sweep_interval_secs", 3600)?
            .set_default("log_json", false)?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .source(Some(vars.into_iter().collect()))
                    .try_parsing(true),
            )
            .set_override_option("port", port)?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.port == 0 {
            return Err(SettingsError::Invalid("port must be greater than 0".into()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(SettingsError::Invalid(
                "sweep_interval_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Always binds every interface.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    /// Database URL, `None` for the in-memory store.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn sweep_grace(&self) -> Duration {
        Duration::from_secs(self.sweep_grace_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
