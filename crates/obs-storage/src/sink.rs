//! Huawei OBS batch sink
//!
//! Writes files to OBS through the file system implementation. Credentials
//! sit next to the file properties instead of under a connection.
//!
//! # Example
//!
//! ```yaml
//! referenceName: orders_out
//! path: obs://sales/exports/
//! suffix: yyyy-MM-dd-HH-mm
//! format: json
//! accessKey: ${OBS_ACCESS_KEY}
//! secretKey: ${OBS_SECRET_KEY}
//! endPoint: obs.cn-north-4.myhuaweicloud.com
//! enableEncryption: true
//! ```

use crate::connection::{ObsConnectorConfig, OBS_ENCRYPTION_SSE_KMS, OBS_ENCRYPTION_TYPE};
use crate::connector::CONNECTOR_TYPE;
use crate::path::{check_plugin_path, SCHEME};
use obs_connect::prelude::*;
use obs_connect::{parse_plugin_config, SinkRegistry};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Configuration for the OBS batch sink
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObsBatchSinkConfig {
    #[serde(flatten)]
    pub file: FileSinkProperties,

    #[serde(flatten)]
    pub credentials: ObsConnectorConfig,

    /// Encrypt written objects with KMS-managed keys
    #[serde(default)]
    pub enable_encryption: ConfigValue<bool>,
}

impl ObsBatchSinkConfig {
    pub fn validate(&self, collector: &mut FailureCollector) {
        self.file.validate(collector);
        check_plugin_path(&self.file.path, collector);
        self.credentials.validate(collector);
    }

    pub fn is_encryption_enabled(&self) -> bool {
        matches!(self.enable_encryption, ConfigValue::Present(true))
    }

    /// Properties for the file system implementation
    pub fn file_system_properties(&self) -> ConnectorResult<BTreeMap<String, String>> {
        let mut properties = self.file.file_system_properties()?;

        let obs_path = self
            .file
            .path
            .as_present()
            .is_some_and(|path| path.starts_with(SCHEME));
        if obs_path {
            properties.extend(self.credentials.credential_properties());
            if self.is_encryption_enabled() {
                properties.insert(
                    OBS_ENCRYPTION_TYPE.to_string(),
                    OBS_ENCRYPTION_SSE_KMS.to_string(),
                );
            }
        }
        Ok(properties)
    }
}

/// Batch sink writing to OBS
#[derive(Debug, Clone)]
pub struct ObsBatchSink {
    config: ObsBatchSinkConfig,
}

impl ObsBatchSink {
    pub fn new(config: ObsBatchSinkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ObsBatchSinkConfig {
        &self.config
    }

    pub fn spec() -> ConnectorSpec {
        ConnectorSpec::new(CONNECTOR_TYPE, env!("CARGO_PKG_VERSION"), PluginType::BatchSink)
            .description("Batch sink to use Huawei OBS as a sink.")
            .category("Huawei Web Services")
            .config_schema_from::<ObsBatchSinkConfig>()
            .metadata("scheme", SCHEME)
            .metadata("encryption", OBS_ENCRYPTION_SSE_KMS)
    }
}

impl BatchPlugin for ObsBatchSink {
    fn plugin_type(&self) -> PluginType {
        PluginType::BatchSink
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
        recorder.record_write("Write", "Wrote to OBS.", fields);
    }
}

/// Factory for creating OBS batch sinks
pub struct ObsBatchSinkFactory;

impl BatchPluginFactory for ObsBatchSinkFactory {
    fn spec(&self) -> ConnectorSpec {
        ObsBatchSink::spec()
    }

    fn create(&self, config: &serde_yaml::Value) -> ConnectorResult<Box<dyn BatchPlugin>> {
        let config: ObsBatchSinkConfig = parse_plugin_config(config)?;
        Ok(Box::new(ObsBatchSink::new(config)))
    }
}

/// Register the OBS batch sink
pub fn register(registry: &mut SinkRegistry) {
    registry.register(CONNECTOR_TYPE, Arc::new(ObsBatchSinkFactory));
}
