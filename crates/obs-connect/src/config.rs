//! Configuration file for the host CLI
//!
//! ```yaml
//! version: "1.0"
//! connections:
//!   lake:
//!     connector: obs
//!     config:
//!       accessKey: ${OBS_ACCESS_KEY}
//!       secretKey: ${secure(obs-secret)}
//!       endPoint: obs.cn-north-4.myhuaweicloud.com
//! sources:
//!   orders:
//!     plugin: obs
//!     connection: lake
//!     config:
//!       referenceName: orders
//!       path: obs://sales/orders/
//!       format: csv
//! settings:
//!   log_level: info
//! ```
//!
//! Environment placeholders are expanded at load time. Anything the
//! environment cannot resolve is kept verbatim and reaches the plugins as a
//! deferred value.

use crate::error::{ConnectError, Result};
use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

/// Pre-compiled regex for environment variable expansion
/// Pattern: ${VAR} or ${VAR:-default}
static ENV_VAR_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("env var regex pattern is invalid - this is a bug")
});

/// Plugin property that switches a source to a shared connection
pub const NAME_USE_CONNECTION: &str = "useConnection";
/// Plugin property holding the shared connection
pub const NAME_CONNECTION: &str = "connection";

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectConfig {
    /// Configuration version
    #[serde(default = "default_version")]
    pub version: String,

    /// Named connections
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,

    /// Batch sources
    #[serde(default)]
    pub sources: BTreeMap<String, PluginConfig>,

    /// Batch sinks
    #[serde(default)]
    pub sinks: BTreeMap<String, PluginConfig>,

    /// Global settings
    #[serde(default)]
    pub settings: GlobalSettings,
}

/// A named connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    /// Connector type (e.g., "obs")
    pub connector: String,

    /// Connector-specific configuration
    #[serde(default)]
    pub config: serde_yaml::Value,
}

/// A batch source or sink
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginConfig {
    /// Plugin type (e.g., "obs")
    pub plugin: String,

    /// Name of a connection whose config is injected as `connection`
    #[serde(default)]
    pub connection: Option<String>,

    /// Plugin-specific configuration
    #[serde(default)]
    pub config: serde_yaml::Value,

    /// Whether this plugin is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Global settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalSettings {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ConnectConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConnectError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = Self::expand_env_vars(content);

        let config: Self = serde_yaml::from_str(&expanded)
            .map_err(|e| ConnectError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Expand environment variables in the format ${VAR} or ${VAR:-default}.
    /// Unset variables without a default are left untouched.
    pub fn expand_env_vars(content: &str) -> String {
        ENV_VAR_REGEX
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                match (std::env::var(var_name), caps.get(2)) {
                    (Ok(value), _) => value,
                    (Err(_), Some(default)) => default.as_str().to_string(),
                    (Err(_), None) => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Validate cross references
    pub fn validate(&self) -> Result<()> {
        for (name, connection) in &self.connections {
            if connection.connector.is_empty() {
                return Err(ConnectError::plugin(name, "connection must name a connector"));
            }
        }

        for (name, plugin) in self.sources.iter().chain(self.sinks.iter()) {
            if plugin.plugin.is_empty() {
                return Err(ConnectError::plugin(name, "plugin type must be specified"));
            }
            if let Some(ref connection) = plugin.connection {
                if !self.connections.contains_key(connection) {
                    return Err(ConnectError::plugin(
                        name,
                        format!("unknown connection '{}'", connection),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Get enabled sources
    pub fn enabled_sources(&self) -> impl Iterator<Item = (&String, &PluginConfig)> {
        self.sources.iter().filter(|(_, s)| s.enabled)
    }

    /// Get enabled sinks
    pub fn enabled_sinks(&self) -> impl Iterator<Item = (&String, &PluginConfig)> {
        self.sinks.iter().filter(|(_, s)| s.enabled)
    }

    /// The plugin's config with its named connection injected
    pub fn resolved_plugin_config(&self, plugin: &PluginConfig) -> Result<serde_yaml::Value> {
        let mut config = match &plugin.config {
            serde_yaml::Value::Null => serde_yaml::Value::Mapping(Default::default()),
            other => other.clone(),
        };

        let Some(ref name) = plugin.connection else {
            return Ok(config);
        };
        let connection = self
            .connections
            .get(name)
            .ok_or_else(|| ConnectError::config(format!("unknown connection '{}'", name)))?;

        let mapping = config.as_mapping_mut().ok_or_else(|| {
            ConnectError::config(format!("config of plugin '{}' must be a mapping", plugin.plugin))
        })?;
        mapping.insert(NAME_USE_CONNECTION.into(), serde_yaml::Value::Bool(true));
        mapping.insert(NAME_CONNECTION.into(), connection.config.clone());
        tracing::debug!("Injected connection '{}' into {} plugin", name, plugin.plugin);
        Ok(config)
    }
}
