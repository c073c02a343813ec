//! Fail-soft validation reporting
//!
//! Plugins never stop at the first configuration problem. Every problem is
//! recorded in a [`FailureCollector`] so the host can show all of them at
//! once, each pointing at the property (or properties) that caused it.
//!
//! # Example
//!
//! ```rust
//! use obs_connect::FailureCollector;
//!
//! let mut collector = FailureCollector::new("obs-sink");
//! collector
//!     .add_failure("The Access Key must be specified.", None)
//!     .with_config_property("accessKey")
//!     .with_config_property("authenticationMethod");
//!
//! assert_eq!(collector.failures().len(), 1);
//! assert!(collector.get_or_throw().is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cause attribute naming the offending property
pub const CAUSE_STAGE_CONFIG: &str = "stageConfig";
/// Cause attribute carrying the rendered error chain
pub const CAUSE_STACKTRACE: &str = "stacktrace";
/// Cause attribute naming the plugin stage
pub const CAUSE_STAGE: &str = "stage";

/// One cause of a validation failure, as a bag of attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    pub attributes: BTreeMap<String, String>,
}

impl Cause {
    /// Create a cause with a single attribute
    pub fn with_attribute(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(key.into(), value.into());
        Self { attributes }
    }

    /// Look up an attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// A single validation failure with its causes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub message: String,
    pub corrective_action: Option<String>,
    pub causes: Vec<Cause>,
}

impl ValidationFailure {
    /// Create a failure without causes
    pub fn new(message: impl Into<String>, corrective_action: Option<&str>) -> Self {
        Self {
            message: message.into(),
            corrective_action: corrective_action.map(str::to_string),
            causes: Vec::new(),
        }
    }

    /// Point this failure at a configuration property
    pub fn with_config_property(&mut self, property: impl Into<String>) -> &mut Self {
        self.causes
            .push(Cause::with_attribute(CAUSE_STAGE_CONFIG, property));
        self
    }

    /// Attach the rendered chain of an underlying error
    pub fn with_stacktrace(&mut self, err: &(dyn std::error::Error + 'static)) -> &mut Self {
        self.causes
            .push(Cause::with_attribute(CAUSE_STACKTRACE, render_chain(err)));
        self
    }

    /// Builder-style variant of [`with_config_property`](Self::with_config_property)
    pub fn config_property(mut self, property: impl Into<String>) -> Self {
        self.with_config_property(property);
        self
    }

    /// All configuration properties this failure points at, in order
    pub fn config_properties(&self) -> Vec<&str> {
        self.causes
            .iter()
            .filter_map(|c| c.attribute(CAUSE_STAGE_CONFIG))
            .collect()
    }

    /// Whether the failure points at the given property
    pub fn mentions_property(&self, property: &str) -> bool {
        self.config_properties().contains(&property)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        let properties = self.config_properties();
        if !properties.is_empty() {
            write!(f, " [{}]", properties.join(", "))?;
        }
        if let Some(ref action) = self.corrective_action {
            write!(f, " ({})", action)?;
        }
        Ok(())
    }
}

fn render_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str("\n  caused by: ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Collects validation failures for one plugin stage
#[derive(Debug, Clone, Default)]
pub struct FailureCollector {
    stage: Option<String>,
    failures: Vec<ValidationFailure>,
}

impl FailureCollector {
    /// Create a collector for the named stage
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: Some(stage.into()),
            failures: Vec::new(),
        }
    }

    /// The stage this collector reports for
    pub fn stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }

    /// Record a failure and return it for further decoration
    pub fn add_failure(
        &mut self,
        message: impl Into<String>,
        corrective_action: Option<&str>,
    ) -> &mut ValidationFailure {
        self.push(ValidationFailure::new(message, corrective_action))
    }

    /// Record an already-built failure
    pub fn push(&mut self, mut failure: ValidationFailure) -> &mut ValidationFailure {
        if let Some(ref stage) = self.stage {
            failure
                .causes
                .push(Cause::with_attribute(CAUSE_STAGE, stage.clone()));
        }
        self.failures.push(failure);
        let last = self.failures.len() - 1;
        &mut self.failures[last]
    }

    /// Record several failures
    pub fn extend(&mut self, failures: impl IntoIterator<Item = ValidationFailure>) {
        for failure in failures {
            self.push(failure);
        }
    }

    /// Translate structural `validator` errors into per-property failures.
    /// Field names are reported in camelCase, as the host names properties.
    pub fn add_validation_errors(&mut self, errors: &validator::ValidationErrors) {
        for (field, field_errors) in errors.field_errors() {
            let property = camel_case(&field);
            for error in field_errors {
                let message = match &error.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid value for '{}': {}", property, error.code),
                };
                self.add_failure(message, None)
                    .with_config_property(property.clone());
            }
        }
    }

    /// All recorded failures
    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Finish validation: `Ok` when nothing was recorded
    pub fn get_or_throw(&self) -> Result<(), ValidationException> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(ValidationException {
                failures: self.failures.clone(),
            })
        }
    }
}

/// Raised once validation finished with recorded failures
#[derive(Debug, Clone)]
pub struct ValidationException {
    pub failures: Vec<ValidationFailure>,
}

impl fmt::Display for ValidationException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation failure(s)", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  - {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationException {}
