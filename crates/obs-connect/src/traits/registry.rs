//! Plugin registry for runtime lookup
//!
//! Plugin crates expose factories; the host registers the ones it needs and
//! resolves them by name when it loads a configuration file.
//!
//! ```rust,ignore
//! use obs_connect::PluginRegistry;
//!
//! let mut registry = PluginRegistry::new();
//! obs_storage::register_all(&mut registry);
//!
//! let factory = registry.connectors.get("obs").unwrap();
//! let connector = factory.create(&config).await?;
//! ```

use super::connector::Connector;
use super::plugin::BatchPlugin;
use super::spec::ConnectorSpec;
use crate::error::ConnectorResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Deserialize a plugin config from raw YAML. `null` yields the default config.
pub fn parse_plugin_config<T>(config: &serde_yaml::Value) -> ConnectorResult<T>
where
    T: DeserializeOwned + Default,
{
    if config.is_null() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_value(config.clone())?)
}

/// Factory for connectors
///
/// Creation is async because building a storage client may resolve
/// credentials from the environment.
#[async_trait]
pub trait ConnectorFactory: Send + Sync {
    /// Get the connector specification
    fn spec(&self) -> ConnectorSpec;

    /// Create a connector from raw YAML config
    async fn create(&self, config: &serde_yaml::Value) -> ConnectorResult<Box<dyn Connector>>;
}

/// Factory for batch sources and sinks
pub trait BatchPluginFactory: Send + Sync {
    /// Get the plugin specification
    fn spec(&self) -> ConnectorSpec;

    /// Create a configured plugin from raw YAML config
    fn create(&self, config: &serde_yaml::Value) -> ConnectorResult<Box<dyn BatchPlugin>>;
}

/// Name-keyed factories of one kind
pub struct FactoryRegistry<F: ?Sized> {
    factories: BTreeMap<String, Arc<F>>,
}

impl<F: ?Sized> FactoryRegistry<F> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a factory, replacing any previous one with the same name
    pub fn register(&mut self, name: &str, factory: Arc<F>) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Get a factory by name
    pub fn get(&self, name: &str) -> Option<&Arc<F>> {
        self.factories.get(name)
    }

    /// Check if a factory is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Number of registered factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<F: ?Sized> Default for FactoryRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

pub type ConnectorRegistry = FactoryRegistry<dyn ConnectorFactory>;
pub type SourceRegistry = FactoryRegistry<dyn BatchPluginFactory>;
pub type SinkRegistry = FactoryRegistry<dyn BatchPluginFactory>;

impl ConnectorRegistry {
    /// List connector types with their specs
    pub fn list(&self) -> Vec<(&str, ConnectorSpec)> {
        self.factories
            .iter()
            .map(|(name, factory)| (name.as_str(), factory.spec()))
            .collect()
    }
}

impl FactoryRegistry<dyn BatchPluginFactory> {
    /// List plugin types with their specs
    pub fn list(&self) -> Vec<(&str, ConnectorSpec)> {
        self.factories
            .iter()
            .map(|(name, factory)| (name.as_str(), factory.spec()))
            .collect()
    }
}

/// All plugin factories known to a host
#[derive(Default)]
pub struct PluginRegistry {
    pub connectors: ConnectorRegistry,
    pub sources: SourceRegistry,
    pub sinks: SinkRegistry,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every registered spec, connectors first
    pub fn specs(&self) -> Vec<ConnectorSpec> {
        self.connectors
            .list()
            .into_iter()
            .chain(self.sources.list())
            .chain(self.sinks.list())
            .map(|(_, spec)| spec)
            .collect()
    }
}
