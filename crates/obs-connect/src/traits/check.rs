//! Connection check reporting
//!
//! The host's `test` hook only fills a [`FailureCollector`]; this module turns
//! the collected state into a printable [`CheckResult`] for the CLI.

use super::failure::{FailureCollector, ValidationFailure, CAUSE_STACKTRACE};
use serde::Serialize;
use std::fmt;

/// Outcome of one check over a failure collector
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Check name (e.g. "configuration", "connectivity")
    pub name: String,
    /// Stage the collector was opened for
    pub stage: Option<String>,
    /// One entry per recorded failure
    pub failures: Vec<CheckDetail>,
}

/// One recorded failure, flattened for display
#[derive(Debug, Clone, Serialize)]
pub struct CheckDetail {
    pub message: String,
    pub corrective_action: Option<String>,
    pub properties: Vec<String>,
    /// First line of the underlying error, when one was attached
    pub cause: Option<String>,
}

impl From<&ValidationFailure> for CheckDetail {
    fn from(failure: &ValidationFailure) -> Self {
        let cause = failure
            .causes
            .iter()
            .find_map(|c| c.attribute(CAUSE_STACKTRACE))
            .and_then(|trace| trace.lines().next())
            .map(str::to_string);

        Self {
            message: failure.message.clone(),
            corrective_action: failure.corrective_action.clone(),
            properties: failure
                .config_properties()
                .into_iter()
                .map(str::to_string)
                .collect(),
            cause,
        }
    }
}

impl CheckResult {
    /// Summarize everything `collector` recorded under the check `name`
    pub fn from_failures(name: impl Into<String>, collector: &FailureCollector) -> Self {
        Self {
            name: name.into(),
            stage: collector.stage().map(str::to_string),
            failures: collector.failures().iter().map(CheckDetail::from).collect(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckDetail> {
        self.failures.iter()
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_success() { "✓" } else { "✗" };
        write!(f, "{} {}", status, self.name)?;
        if let Some(ref stage) = self.stage {
            write!(f, " ({})", stage)?;
        }
        if self.is_success() {
            return write!(f, " passed");
        }

        writeln!(f, " failed: {} failure(s)", self.failures.len())?;
        for detail in &self.failures {
            write!(f, "  ✗ {}", detail.message)?;
            if !detail.properties.is_empty() {
                write!(f, " [{}]", detail.properties.join(", "))?;
            }
            writeln!(f)?;
            if let Some(ref action) = detail.corrective_action {
                writeln!(f, "      → {}", action)?;
            }
            if let Some(ref cause) = detail.cause {
                writeln!(f, "      caused by: {}", cause)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_collector_passes() {
        let collector = FailureCollector::new("lake");
        let result = CheckResult::from_failures("connectivity", &collector);
        assert!(result.is_success());
        assert_eq!(result.failed_checks().count(), 0);
        assert_eq!(result.to_string(), "✓ connectivity (lake) passed");
    }

    #[test]
    fn test_failures_carry_properties_and_cause() {
        let mut collector = FailureCollector::new("lake");
        collector
            .add_failure("The Endpoint must be specified.", None)
            .with_config_property("endPoint");
        let io = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
        collector
            .add_failure(
                "Could not connect to OBS: socket closed",
                Some("Ensure the credentials and endpoint are correct."),
            )
            .with_stacktrace(&io);

        let result = CheckResult::from_failures("connectivity", &collector);
        assert!(!result.is_success());
        assert_eq!(result.stage.as_deref(), Some("lake"));
        assert_eq!(result.failed_checks().count(), 2);
        assert_eq!(result.failures[0].properties, vec!["endPoint"]);
        assert_eq!(result.failures[1].cause.as_deref(), Some("socket closed"));

        let rendered = result.to_string();
        assert!(rendered.starts_with("✗ connectivity (lake) failed: 2 failure(s)"));
        assert!(rendered.contains("[endPoint]"));
        assert!(rendered.contains("→ Ensure the credentials and endpoint are correct."));
        assert!(rendered.contains("caused by: socket closed"));
    }
}
