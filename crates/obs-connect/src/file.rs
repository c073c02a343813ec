//! Generic file-plugin configuration
//!
//! Every file-based batch plugin shares these properties. Storage-specific
//! plugins flatten them into their own config and add credentials on top.
//!
//! # Example YAML
//!
//! ```yaml
//! referenceName: orders
//! path: obs://sales/orders/
//! format: csv
//! skipHeader: true
//! fileSystemProperties: '{"fs.obs.connection.maximum": "64"}'
//! ```

use crate::error::{ConnectorError, ConnectorResult};
use crate::format::{is_valid_reference_name, FileFormat};
use crate::traits::failure::FailureCollector;
use crate::value::ConfigValue;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

pub const NAME_REFERENCE_NAME: &str = "referenceName";
pub const NAME_PATH: &str = "path";
pub const NAME_FORMAT: &str = "format";
pub const NAME_DELIMITER: &str = "delimiter";
pub const NAME_FILE_REGEX: &str = "fileRegex";
pub const NAME_FILE_SYSTEM_PROPERTIES: &str = "fileSystemProperties";

/// Encoding assumed when `fileEncoding` is not set
pub const DEFAULT_FILE_ENCODING: &str = "UTF-8";

fn validate_reference_name(value: &ConfigValue<String>) -> Result<(), ValidationError> {
    match value.as_present() {
        Some(name) if !name.is_empty() && !is_valid_reference_name(name) => {
            Err(ValidationError::new("invalid_reference_name").with_message(Cow::Owned(format!(
                "Invalid reference name '{}'. Supported characters are: letters, numbers, and '_', '-', '.'.",
                name
            ))))
        }
        _ => Ok(()),
    }
}

fn validate_file_regex(value: &ConfigValue<String>) -> Result<(), ValidationError> {
    match value.as_present() {
        Some(pattern) => regex::Regex::new(pattern).map(|_| ()).map_err(|e| {
            ValidationError::new("invalid_regex")
                .with_message(Cow::Owned(format!("File regex is invalid: {}", e)))
        }),
        None => Ok(()),
    }
}

/// Parse the `fileSystemProperties` JSON object.
///
/// Absent, blank and deferred values yield an empty map. Numbers and
/// booleans are kept as their JSON text, null entries are dropped, and
/// nested arrays or objects are rejected.
pub fn parse_file_system_properties(
    value: &ConfigValue<String>,
) -> ConnectorResult<BTreeMap<String, String>> {
    let json = match value.as_present() {
        Some(json) if !json.trim().is_empty() => json,
        _ => return Ok(BTreeMap::new()),
    };

    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
    let mut properties = BTreeMap::new();
    for (key, value) in raw {
        let text = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(text) => text,
            serde_json::Value::Bool(flag) => flag.to_string(),
            serde_json::Value::Number(number) => number.to_string(),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                return Err(ConnectorError::config(format!(
                    "value of file system property '{}' must be a string, number or boolean",
                    key
                )));
            }
        };
        properties.insert(key, text);
    }
    Ok(properties)
}

fn check_file_system_properties(value: &ConfigValue<String>, collector: &mut FailureCollector) {
    if let Err(err) = parse_file_system_properties(value) {
        collector
            .add_failure("File system properties must be a valid json.", None)
            .with_config_property(NAME_FILE_SYSTEM_PROPERTIES)
            .with_stacktrace(&err);
    }
}

fn check_common(
    reference_name: &ConfigValue<String>,
    path: &ConfigValue<String>,
    format: &ConfigValue<FileFormat>,
    delimiter: &ConfigValue<String>,
    collector: &mut FailureCollector,
) {
    if reference_name.is_missing() {
        collector
            .add_failure("Reference name must be specified.", None)
            .with_config_property(NAME_REFERENCE_NAME);
    }
    if path.is_missing() {
        collector
            .add_failure("Path must be specified.", None)
            .with_config_property(NAME_PATH);
    }
    if let Some(format) = format.as_present() {
        if format.requires_delimiter() && delimiter.is_missing() {
            collector
                .add_failure(
                    format!("Delimiter is required when format is set to '{}'.", format),
                    Some("Set a delimiter or choose another format."),
                )
                .with_config_property(NAME_DELIMITER)
                .with_config_property(NAME_FORMAT);
        }
    }
}

/// Properties shared by file-based batch sources
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileSourceProperties {
    /// Name used to identify this source for lineage
    #[serde(default)]
    #[validate(custom(function = "validate_reference_name"))]
    pub reference_name: ConfigValue<String>,

    /// Path to the file(s) to read. Directories end with '/'.
    #[serde(default)]
    pub path: ConfigValue<String>,

    /// Record format
    #[serde(default)]
    pub format: ConfigValue<FileFormat>,

    /// Field delimiter for the `delimited` format
    #[serde(default)]
    pub delimiter: ConfigValue<String>,

    /// Skip the first line of each file
    #[serde(default)]
    pub skip_header: ConfigValue<bool>,

    /// Character encoding of the files
    #[serde(default)]
    pub file_encoding: ConfigValue<String>,

    /// Only read files whose path matches this regex
    #[serde(default)]
    #[validate(custom(function = "validate_file_regex"))]
    pub file_regex: ConfigValue<String>,

    /// Read files in subdirectories
    #[serde(default)]
    pub recursive: ConfigValue<bool>,

    /// Extra properties for the file system implementation, as a JSON object
    #[serde(default)]
    pub file_system_properties: ConfigValue<String>,
}

impl FileSourceProperties {
    /// Record every generic problem in `collector`
    pub fn validate(&self, collector: &mut FailureCollector) {
        if let Err(errors) = Validate::validate(self) {
            collector.add_validation_errors(&errors);
        }
        check_common(
            &self.reference_name,
            &self.path,
            &self.format,
            &self.delimiter,
            collector,
        );
        check_file_system_properties(&self.file_system_properties, collector);
    }

    pub fn file_system_properties(&self) -> ConnectorResult<BTreeMap<String, String>> {
        parse_file_system_properties(&self.file_system_properties)
    }

    /// Whether the header line is copied into every split
    pub fn should_copy_header(&self) -> bool {
        matches!(self.skip_header, ConfigValue::Present(true))
    }

    /// The configured encoding when it differs from the default
    pub fn file_encoding_override(&self) -> Option<&str> {
        self.file_encoding
            .as_present()
            .map(String::as_str)
            .filter(|encoding| !encoding.is_empty() && *encoding != DEFAULT_FILE_ENCODING)
    }
}

/// Properties shared by file-based batch sinks
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileSinkProperties {
    /// Name used to identify this sink for lineage
    #[serde(default)]
    #[validate(custom(function = "validate_reference_name"))]
    pub reference_name: ConfigValue<String>,

    /// Directory to write to
    #[serde(default)]
    pub path: ConfigValue<String>,

    /// Time format of the output subdirectory, e.g. `yyyy-MM-dd-HH-mm`
    #[serde(default)]
    pub suffix: ConfigValue<String>,

    /// Record format
    #[serde(default)]
    pub format: ConfigValue<FileFormat>,

    /// Field delimiter for the `delimited` format
    #[serde(default)]
    pub delimiter: ConfigValue<String>,

    /// Extra properties for the file system implementation, as a JSON object
    #[serde(default)]
    pub file_system_properties: ConfigValue<String>,
}

impl FileSinkProperties {
    /// Record every generic problem in `collector`
    pub fn validate(&self, collector: &mut FailureCollector) {
        if let Err(errors) = Validate::validate(self) {
            collector.add_validation_errors(&errors);
        }
        check_common(
            &self.reference_name,
            &self.path,
            &self.format,
            &self.delimiter,
            collector,
        );
        check_file_system_properties(&self.file_system_properties, collector);
    }

    pub fn file_system_properties(&self) -> ConnectorResult<BTreeMap<String, String>> {
        parse_file_system_properties(&self.file_system_properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(yaml: &str) -> FileSourceProperties {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_source_valid() {
        let props = source(
            r#"
referenceName: orders
path: obs://sales/orders/
format: csv
"#,
        );
        let mut collector = FailureCollector::new("source");
        props.validate(&mut collector);
        assert!(collector.is_empty(), "{:?}", collector.failures());
        assert_eq!(props.format, ConfigValue::Present(FileFormat::Csv));
    }

    #[test]
    fn test_source_missing_fields() {
        let props = source("format: delimited");
        let mut collector = FailureCollector::new("source");
        props.validate(&mut collector);

        let failures = collector.failures();
        assert_eq!(failures.len(), 3);
        assert!(failures[0].mentions_property(NAME_REFERENCE_NAME));
        assert!(failures[1].mentions_property(NAME_PATH));
        assert!(failures[2].mentions_property(NAME_DELIMITER));
    }

    #[test]
    fn test_source_invalid_reference_and_regex() {
        let props = source(
            r#"
referenceName: "orders v2"
path: obs://sales/
fileRegex: "(["
"#,
        );
        let mut collector = FailureCollector::new("source");
        props.validate(&mut collector);

        let failures = collector.failures();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().any(|f| f.mentions_property("referenceName")));
        assert!(failures.iter().any(|f| f.mentions_property("fileRegex")));
    }

    #[test]
    fn test_deferred_values_skip_checks() {
        let props = source(
            r#"
referenceName: "${ref}"
path: "${path}"
format: delimited
delimiter: "${delim}"
fileSystemProperties: "${fs}"
"#,
        );
        let mut collector = FailureCollector::new("source");
        props.validate(&mut collector);
        assert!(collector.is_empty(), "{:?}", collector.failures());
        assert!(props.file_system_properties().unwrap().is_empty());
    }

    #[test]
    fn test_file_system_properties_json() {
        let props = source(
            r#"
referenceName: orders
path: obs://sales/
fileSystemProperties: '{"fs.obs.connection.maximum": "64"}'
"#,
        );
        let map = props.file_system_properties().unwrap();
        assert_eq!(map["fs.obs.connection.maximum"], "64");

        let broken = source(
            r#"
referenceName: orders
path: obs://sales/
fileSystemProperties: '{"unterminated'
"#,
        );
        assert!(broken.file_system_properties().is_err());
        let mut collector = FailureCollector::new("source");
        broken.validate(&mut collector);
        assert_eq!(collector.failures().len(), 1);
        assert!(collector.failures()[0].mentions_property(NAME_FILE_SYSTEM_PROPERTIES));
    }

    #[test]
    fn test_file_system_properties_scalars() {
        let props = source(
            r#"
referenceName: orders
path: obs://sales/
fileSystemProperties: '{"fs.obs.connection.maximum": 64, "fs.obs.fast.upload": true, "fs.obs.buffer.dir": null}'
"#,
        );
        let mut collector = FailureCollector::new("source");
        props.validate(&mut collector);
        assert!(collector.is_empty(), "{:?}", collector.failures());

        let map = props.file_system_properties().unwrap();
        assert_eq!(map["fs.obs.connection.maximum"], "64");
        assert_eq!(map["fs.obs.fast.upload"], "true");
        assert!(!map.contains_key("fs.obs.buffer.dir"));

        let nested = source(
            r#"
referenceName: orders
path: obs://sales/
fileSystemProperties: '{"fs.obs.retry": {"limit": 3}}'
"#,
        );
        let mut collector = FailureCollector::new("source");
        nested.validate(&mut collector);
        assert_eq!(collector.failures().len(), 1);
        assert!(collector.failures()[0].mentions_property(NAME_FILE_SYSTEM_PROPERTIES));
    }

    #[test]
    fn test_header_and_encoding() {
        let props = source(
            r#"
skipHeader: true
fileEncoding: ISO-8859-1
"#,
        );
        assert!(props.should_copy_header());
        assert_eq!(props.file_encoding_override(), Some("ISO-8859-1"));

        let props = source("fileEncoding: UTF-8");
        assert!(!props.should_copy_header());
        assert_eq!(props.file_encoding_override(), None);
    }

    #[test]
    fn test_sink_validation() {
        let props: FileSinkProperties = serde_yaml::from_str(
            r#"
referenceName: out
path: obs://sales/out
suffix: yyyy-MM-dd
format: parquet
"#,
        )
        .unwrap();
        let mut collector = FailureCollector::new("sink");
        props.validate(&mut collector);
        assert!(collector.is_empty());

        let props = FileSinkProperties::default();
        let mut collector = FailureCollector::new("sink");
        props.validate(&mut collector);
        assert_eq!(collector.failures().len(), 2);
    }
}
