//! Configuration loading and dot-path access.
//!
//! Layered config: defaults -> config file -> CLI config file -> env vars.
//! The default config file lives at `~/.config/serp/config.{toml,yaml,json}`.
//! Environment overrides use the `SERP_` prefix with `__` between path
//! segments, e.g. `SERP_CLUSTER__HOST`.

use std::path::PathBuf;
use std::sync::Arc;

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::SerpError;
use crate::settings::{default_log_level, default_results_per_page, Settings};

/// Read-only, process-wide configuration tree.
///
/// Cloning is cheap; all clones share the same immutable tree.
#[derive(Debug, Clone)]
pub struct ConfigProvider {
    inner: Arc<Config>,
}

impl ConfigProvider {
    /// Load configuration with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/serp/config.*)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (SERP_*)
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, SerpError> {
        let config_dir = ProjectDirs::from("", "", "serp")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Self::with_defaults(Config::builder())?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SERP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let provider = Self::from_config(builder.build()?);
        debug!(cli_config = ?cli_config_path, "Loaded configuration");
        Ok(provider)
    }

    /// Build a provider from an in-memory TOML document on top of the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, SerpError> {
        let config = Self::with_defaults(Config::builder())?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            inner: Arc::new(config),
        }
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("log_level", default_log_level())?
            .set_default(
                "serp.pagination.results_per_page",
                default_results_per_page() as i64,
            )
    }

    /// Look up a value by dot path (`a.b[0].c`).
    ///
    /// Returns `Ok(None)` when the path is absent and an error when the value
    /// exists but cannot be converted to `T`.
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SerpError> {
        match self.inner.get::<T>(path) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a value, falling back to `default` when absent or malformed.
    pub fn get_or<T: DeserializeOwned>(&self, path: &str, default: T) -> T {
        match self.get(path) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                warn!(path, error = %e, "Malformed config value, using default");
                default
            }
        }
    }

    pub fn get_str(&self, path: &str, default: &str) -> String {
        self.get_or(path, default.to_string())
    }

    pub fn get_int(&self, path: &str, default: i64) -> i64 {
        self.get_or(path, default)
    }

    pub fn get_float(&self, path: &str, default: f64) -> f64 {
        self.get_or(path, default)
    }

    pub fn get_bool(&self, path: &str, default: bool) -> bool {
        self.get_or(path, default)
    }

    /// Look up a list, empty when absent.
    pub fn get_list<T: DeserializeOwned>(&self, path: &str) -> Vec<T> {
        self.get_or(path, Vec::new())
    }

    /// Check whether a path is present.
    pub fn contains(&self, path: &str) -> bool {
        self.inner.get::<config::Value>(path).is_ok()
    }

    /// Deserialize a whole subtree into a typed section.
    ///
    /// An absent subtree yields `T::default()`; a subtree with the wrong shape
    /// is a configuration error.
    pub fn section<T: DeserializeOwned + Default>(&self, path: &str) -> Result<T, SerpError> {
        Ok(self.get::<T>(path)?.unwrap_or_default())
    }

    /// Deserialize the complete settings tree.
    pub fn settings(&self) -> Result<Settings, SerpError> {
        let settings = self.inner.as_ref().clone().try_deserialize::<Settings>()?;
        Ok(settings)
    }
}
