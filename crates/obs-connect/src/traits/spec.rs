//! Connector and plugin specification types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Plugin specification describing a connector or batch plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorSpec {
    /// Unique plugin type identifier (e.g., "obs")
    pub connector_type: String,

    /// Semantic version
    pub version: String,

    /// Human-readable description
    pub description: Option<String>,

    /// Category shown by the host (e.g., "Huawei Web Services")
    pub category: Option<String>,

    /// What kind of plugin this is
    pub plugin_type: PluginType,

    /// JSON Schema for the plugin's configuration
    pub config_schema: Option<serde_json::Value>,

    /// Custom metadata
    pub metadata: HashMap<String, String>,
}

impl ConnectorSpec {
    /// Create a new spec
    pub fn new(
        connector_type: impl Into<String>,
        version: impl Into<String>,
        plugin_type: PluginType,
    ) -> Self {
        Self {
            connector_type: connector_type.into(),
            version: version.into(),
            description: None,
            category: None,
            plugin_type,
            config_schema: None,
            metadata: HashMap::new(),
        }
    }

    /// Set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Set category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set config schema from a type implementing JsonSchema
    pub fn config_schema_from<T: JsonSchema>(mut self) -> Self {
        let schema = schemars::schema_for!(T);
        self.config_schema = Some(serde_json::to_value(schema).unwrap_or_default());
        self
    }

    /// Add metadata
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Kinds of plugins the host knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PluginType {
    BatchSource,
    BatchSink,
    Connector,
}

impl PluginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BatchSource => "batchsource",
            Self::BatchSink => "batchsink",
            Self::Connector => "connector",
        }
    }
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request for the plugin properties matching a browsed path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSpecRequest {
    /// The browsed path
    pub path: String,
    /// Connection reference as a macro, e.g. `${conn(my-obs)}`
    pub connection_with_macro: String,
}

impl ConnectionSpecRequest {
    pub fn new(path: impl Into<String>, connection_with_macro: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            connection_with_macro: connection_with_macro.into(),
        }
    }
}

/// A plugin preconfigured for a browsed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    pub properties: BTreeMap<String, String>,
}

impl PluginSpec {
    pub fn new(
        name: impl Into<String>,
        plugin_type: PluginType,
        properties: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            plugin_type,
            properties,
        }
    }
}

/// Connection-level spec returned for a browsed path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSpec {
    pub properties: BTreeMap<String, String>,
    pub related_plugins: Vec<PluginSpec>,
}

impl ConnectionSpec {
    pub fn builder() -> ConnectionSpecBuilder {
        ConnectionSpecBuilder::default()
    }

    /// Find a related plugin by name and type
    pub fn related_plugin(&self, name: &str, plugin_type: PluginType) -> Option<&PluginSpec> {
        self.related_plugins
            .iter()
            .find(|p| p.name == name && p.plugin_type == plugin_type)
    }
}

/// Builder for [`ConnectionSpec`]
#[derive(Debug, Default)]
pub struct ConnectionSpecBuilder {
    spec: ConnectionSpec,
}

impl ConnectionSpecBuilder {
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.properties.insert(key.into(), value.into());
        self
    }

    pub fn related_plugin(mut self, plugin: PluginSpec) -> Self {
        self.spec.related_plugins.push(plugin);
        self
    }

    pub fn build(self) -> ConnectionSpec {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_spec_builder() {
        let spec = ConnectorSpec::new("obs", "1.0.0", PluginType::Connector)
            .description("Connection to access data in Huawei OBS.")
            .category("Huawei Web Services")
            .metadata("scheme", "obs://");

        assert_eq!(spec.connector_type, "obs");
        assert_eq!(spec.version, "1.0.0");
        assert_eq!(spec.category.as_deref(), Some("Huawei Web Services"));
        assert_eq!(spec.metadata.get("scheme").map(String::as_str), Some("obs://"));
    }

    #[test]
    fn test_connection_spec_related_plugin() {
        let mut props = BTreeMap::new();
        props.insert("path".to_string(), "obs://bucket/a.csv".to_string());
        let spec = ConnectionSpec::builder()
            .related_plugin(PluginSpec::new("Obs", PluginType::BatchSource, props))
            .build();

        let plugin = spec.related_plugin("Obs", PluginType::BatchSource).unwrap();
        assert_eq!(plugin.properties["path"], "obs://bucket/a.csv");
        assert!(spec.related_plugin("Obs", PluginType::BatchSink).is_none());
    }

    #[test]
    fn test_plugin_type_display() {
        assert_eq!(PluginType::BatchSource.to_string(), "batchsource");
        assert_eq!(PluginType::Connector.to_string(), "connector");
    }
}
