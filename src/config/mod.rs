//! Configuration management for the etcd client.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation
mod network;
mod retry;
mod tls;
pub use network::*;
pub use retry::*;
pub use tls::*;

use std::env;
use std::fmt::Debug;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_KEYS_SPACE;
use crate::constants::DEFAULT_MEMBER_SPACE;
use crate::constants::DEFAULT_STATS_SPACE;
use crate::Error;
use crate::Result;

/// Username/password attached to every request as HTTP basic auth
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub user: String,
    pub password: String,
}

impl Debug for AuthConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("AuthConfig").field("user", &self.user).finish_non_exhaustive()
    }
}

/// Main configuration container of a [`crate::Client`]
///
/// Combines all settings with hierarchical override support:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables prefixed with `ETCD_CLIENT__` (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientConfig {
    /// Bootstrap member addresses, e.g. `http://127.0.0.1:2379`
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Path prefix of the key space
    #[serde(default = "default_keys_space")]
    pub keys_space: String,

    /// Path prefix of the statistics space
    #[serde(default = "default_stats_space")]
    pub stats_space: String,

    /// Path prefix of the member listing
    #[serde(default = "default_member_space")]
    pub member_space: String,

    /// TTL in seconds applied when an operation is given a ttl of 0.
    /// 0 keeps keys from expiring.
    #[serde(default)]
    pub default_ttl: u64,

    /// Timeouts and wire-level diagnostics
    #[serde(default)]
    pub network: NetworkConfig,

    /// Optional basic-auth credentials
    #[serde(default)]
    pub auth: Option<AuthConfig>,

    /// TLS/SSL security configuration
    #[serde(default)]
    pub tls: TlsConfig,

    /// Retry behaviour of long-poll watchers
    #[serde(default)]
    pub watch: WatchPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![],
            keys_space: default_keys_space(),
            stats_space: default_stats_space(),
            member_space: default_member_space(),
            default_ttl: 0,
            network: NetworkConfig::default(),
            auth: None,
            tls: TlsConfig::default(),
            watch: WatchPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Configuration sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults (lowest priority)
    /// 2. Configuration file from `CONFIG_PATH` environment variable (if set)
    /// 3. Environment variables with `ETCD_CLIENT__` prefix (highest priority)
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("ETCD_CLIENT__NETWORK__READ_TIMEOUT_IN_MS", "2000");
    /// let cfg = ClientConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        let config: Self = builder.add_source(env_source()).build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional configuration overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables (highest priority)
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates configuration and returns validated instance.
    pub fn validate(self) -> Result<Self> {
        if self.endpoints.is_empty() {
            return Err(invalid("at least one endpoint is required".into()));
        }
        for endpoint in &self.endpoints {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(invalid(format!("endpoint {endpoint} must start with http:// or https://")));
            }
        }
        for (name, space) in [
            ("keys_space", &self.keys_space),
            ("stats_space", &self.stats_space),
            ("member_space", &self.member_space),
        ] {
            if !space.starts_with('/') {
                return Err(invalid(format!("{name} {space} must start with '/'")));
            }
        }
        self.network.validate()?;
        self.tls.validate()?;
        self.watch.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("ETCD_CLIENT")
        .prefix_separator("__")
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("endpoints")
}

pub(crate) fn invalid(message: String) -> Error {
    Error::from(ConfigError::Message(message))
}

fn default_keys_space() -> String {
    DEFAULT_KEYS_SPACE.into()
}
fn default_stats_space() -> String {
    DEFAULT_STATS_SPACE.into()
}
fn default_member_space() -> String {
    DEFAULT_MEMBER_SPACE.into()
}
