//! Batch plugin traits and lineage recording

use super::failure::FailureCollector;
use super::spec::PluginType;
use crate::error::ConnectorResult;
use serde::Serialize;
use std::collections::BTreeMap;

/// Kind of data access recorded for lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    Read,
    Write,
}

/// One recorded field-level lineage operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageOperation {
    pub access: AccessType,
    pub name: String,
    pub description: String,
    pub fields: Vec<String>,
}

/// Collects lineage operations for a named dataset
#[derive(Debug, Clone, Serialize)]
pub struct LineageRecorder {
    reference_name: String,
    operations: Vec<LineageOperation>,
}

impl LineageRecorder {
    pub fn new(reference_name: impl Into<String>) -> Self {
        Self {
            reference_name: reference_name.into(),
            operations: Vec::new(),
        }
    }

    pub fn reference_name(&self) -> &str {
        &self.reference_name
    }

    /// Record that `fields` were read from the dataset
    pub fn record_read(&mut self, name: &str, description: &str, fields: &[String]) {
        self.record(AccessType::Read, name, description, fields);
    }

    /// Record that `fields` were written to the dataset
    pub fn record_write(&mut self, name: &str, description: &str, fields: &[String]) {
        self.record(AccessType::Write, name, description, fields);
    }

    fn record(&mut self, access: AccessType, name: &str, description: &str, fields: &[String]) {
        if fields.is_empty() {
            return;
        }
        self.operations.push(LineageOperation {
            access,
            name: name.to_string(),
            description: description.to_string(),
            fields: fields.to_vec(),
        });
    }

    pub fn operations(&self) -> &[LineageOperation] {
        &self.operations
    }
}

/// A configured batch source or sink
///
/// Batch plugins do not move data themselves. They validate their
/// configuration and hand a property map to the file system implementation
/// that does the reading or writing.
pub trait BatchPlugin: Send + Sync {
    /// Whether this is a source or a sink
    fn plugin_type(&self) -> PluginType;

    /// Reference name used for lineage, if configured
    fn reference_name(&self) -> Option<&str>;

    /// Record every configuration problem in `collector`
    fn validate(&self, collector: &mut FailureCollector);

    /// Properties for the underlying file system implementation
    fn file_system_properties(&self) -> ConnectorResult<BTreeMap<String, String>>;

    /// Record field-level lineage for the output schema
    fn record_lineage(&self, recorder: &mut LineageRecorder, fields: &[String]);

    /// Whether the schema can be inferred at configure time
    fn should_infer_schema(&self) -> bool {
        false
    }

    /// Validate, then produce the properties for a run.
    ///
    /// Fails with every recorded problem when validation does not pass.
    fn prepare_run(&self, stage: &str) -> ConnectorResult<BTreeMap<String, String>> {
        let mut collector = FailureCollector::new(stage);
        self.validate(&mut collector);
        collector.get_or_throw()?;
        self.file_system_properties()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectorError;

    struct PathOnly(Option<&'static str>);

    impl BatchPlugin for PathOnly {
        fn plugin_type(&self) -> PluginType {
            PluginType::BatchSink
        }

        fn reference_name(&self) -> Option<&str> {
            None
        }

        fn validate(&self, collector: &mut FailureCollector) {
            if self.0.is_none() {
                collector
                    .add_failure("Path must be specified.", None)
                    .with_config_property("path");
            }
        }

        fn file_system_properties(&self) -> ConnectorResult<BTreeMap<String, String>> {
            let mut properties = BTreeMap::new();
            if let Some(path) = self.0 {
                properties.insert("path".to_string(), path.to_string());
            }
            Ok(properties)
        }

        fn record_lineage(&self, _recorder: &mut LineageRecorder, _fields: &[String]) {}
    }

    #[test]
    fn test_prepare_run() {
        let properties = PathOnly(Some("obs://sales/")).prepare_run("sink").unwrap();
        assert_eq!(properties["path"], "obs://sales/");

        let err = PathOnly(None).prepare_run("sink").unwrap_err();
        match err {
            ConnectorError::Validation(e) => assert_eq!(e.failures.len(), 1),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_lineage_recorder() {
        let mut recorder = LineageRecorder::new("orders");
        let fields = vec!["id".to_string(), "amount".to_string()];
        recorder.record_read("Read", "Read from OBS.", &fields);
        recorder.record_write("Write", "Wrote to OBS.", &[]);

        assert_eq!(recorder.reference_name(), "orders");
        assert_eq!(recorder.operations().len(), 1);
        let op = &recorder.operations()[0];
        assert_eq!(op.access, AccessType::Read);
        assert_eq!(op.description, "Read from OBS.");
        assert_eq!(op.fields, fields);
    }
}
