//! Huawei OBS batch source
//!
//! Reads files from OBS through the file system implementation. The source
//! only validates its configuration and assembles the `fs.obs.*` properties
//! that implementation needs.
//!
//! # Example
//!
//! ```yaml
//! referenceName: orders
//! path: obs://sales/orders/
//! format: csv
//! skipHeader: true
//! useConnection: true
//! connection:
//!   accessKey: ${OBS_ACCESS_KEY}
//!   secretKey: ${OBS_SECRET_KEY}
//!   endPoint: obs.cn-north-4.myhuaweicloud.com
//! ```

use crate::connection::{ObsConnectorConfig, NAME_ACCESS_KEY, NAME_SECRET_KEY};
use crate::connector::CONNECTOR_TYPE;
use crate::path::{check_plugin_path, SCHEME};
use obs_connect::config::{NAME_CONNECTION, NAME_USE_CONNECTION};
use obs_connect::prelude::*;
use obs_connect::{parse_plugin_config, SourceRegistry};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Copy the header line into every split
pub const COPY_HEADER: &str = "path.tracking.copy.header";
/// Character encoding of the files
pub const ENCODING: &str = "path.tracking.encoding";

/// Configuration for the OBS batch source
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObsBatchSourceConfig {
    #[serde(flatten)]
    pub file: FileSourceProperties,

    /// Use an existing connection
    #[serde(default)]
    pub use_connection: ConfigValue<bool>,

    /// The OBS connection to read through
    #[serde(default)]
    pub connection: ConfigValue<ObsConnectorConfig>,
}

impl ObsBatchSourceConfig {
    /// Record every configuration problem in `collector`
    pub fn validate(&self, collector: &mut FailureCollector) {
        self.file.validate(collector);
        check_plugin_path(&self.file.path, collector);

        match &self.connection {
            ConfigValue::Absent => {
                let failure = collector
                    .add_failure(
                        "Connection credentials is not provided",
                        Some("Please provide valid credentials"),
                    )
                    .with_config_property(NAME_CONNECTION);
                if matches!(self.use_connection, ConfigValue::Present(true)) {
                    failure.with_config_property(NAME_USE_CONNECTION);
                }
            }
            ConfigValue::Deferred(_) => {}
            ConfigValue::Present(connection) => connection.validate(collector),
        }
    }

    /// Properties for the file system implementation
    pub fn file_system_properties(&self) -> ConnectorResult<BTreeMap<String, String>> {
        let mut properties = self.file.file_system_properties()?;

        let obs_path = self
            .file
            .path
            .as_present()
            .is_some_and(|path| path.starts_with(SCHEME));
        if let (true, Some(connection)) = (obs_path, self.connection.as_present()) {
            properties.extend(connection.credential_properties());
        }

        if self.file.should_copy_header() {
            properties.insert(COPY_HEADER.to_string(), "true".to_string());
        }
        if let Some(encoding) = self.file.file_encoding_override() {
            properties.insert(ENCODING.to_string(), encoding.to_string());
        }
        Ok(properties)
    }

    /// Whether any field the schema depends on is still a macro
    pub fn has_deferred_schema_inputs(&self) -> bool {
        let credentials_deferred = self
            .connection
            .as_present()
            .is_some_and(ObsConnectorConfig::has_deferred_credentials);
        if credentials_deferred {
            debug!(
                "Schema inference postponed, {} or {} is a macro",
                NAME_ACCESS_KEY, NAME_SECRET_KEY
            );
        }

        self.file.path.is_deferred()
            || self.file.format.is_deferred()
            || self.file.delimiter.is_deferred()
            || self.file.file_system_properties.is_deferred()
            || self.connection.is_deferred()
            || credentials_deferred
    }
}

/// Batch source reading from OBS
#[derive(Debug, Clone)]
pub struct ObsBatchSource {
    config: ObsBatchSourceConfig,
}

impl ObsBatchSource {
    pub fn new(config: ObsBatchSourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ObsBatchSourceConfig {
        &self.config
    }

    pub fn spec() -> ConnectorSpec {
        ConnectorSpec::new(CONNECTOR_TYPE, env!("CARGO_PKG_VERSION"), PluginType::BatchSource)
            .description("Batch source to use Huawei OBS as a source.")
            .category("Huawei Web Services")
            .config_schema_from::<ObsBatchSourceConfig>()
            .metadata("scheme", SCHEME)
    }
}

impl BatchPlugin for ObsBatchSource {
    fn plugin_type(&self) -> PluginType {
        PluginType::BatchSource
    }

    fn reference_name(&self) -> Option<&str> {
        self.config.file.reference_name.as_present().map(String::as_str)
    }

    fn validate(&self, collector: &mut FailureCollector) {
        self.config.validate(collector);
    }

    fn file_system_properties(&self) -> ConnectorResult<BTreeMap<String, String>> {
        self.config.file_system_properties()
    }

    fn record_lineage(&self, recorder: &mut LineageRecorder, fields: &[String]) {
        recorder.record_read("Read", "Read from OBS.", fields);
    }

    fn should_infer_schema(&self) -> bool {
        !self.config.has_deferred_schema_inputs()
    }
}

/// Factory for creating OBS batch sources
pub struct ObsBatchSourceFactory;

impl BatchPluginFactory for ObsBatchSourceFactory {
    fn spec(&self) -> ConnectorSpec {
        ObsBatchSource::spec()
    }

    fn create(&self, config: &serde_yaml::Value) -> ConnectorResult<Box<dyn BatchPlugin>> {
        let config: ObsBatchSourceConfig = parse_plugin_config(config)?;
        Ok(Box::new(ObsBatchSource::new(config)))
    }
}

/// Register the OBS batch source
pub fn register(registry: &mut SourceRegistry) {
    registry.register(CONNECTOR_TYPE, Arc::new(ObsBatchSourceFactory));
}
