//! OBS path parsing
//!
//! Users type paths in several shapes; all of them normalize to
//! `obs://bucket/key`:
//!
//! ```text
//! obs://bucket/dir/file.csv  -> bucket "bucket", key "dir/file.csv"
//! /bucket/dir/               -> bucket "bucket", key "dir/"
//! bucket                     -> bucket "bucket", key ""
//! ```

use obs_connect::file::NAME_PATH;
use obs_connect::{ConfigValue, ConnectorError, ConnectorResult, FailureCollector};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// URI scheme of OBS paths
pub const SCHEME: &str = "obs://";
/// Separator and root directory
pub const ROOT_DIR: &str = "/";

const MIN_BUCKET_LEN: usize = 3;
const MAX_BUCKET_LEN: usize = 63;

/// A validated `obs://bucket/key` path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObsPath {
    full_path: String,
    bucket: String,
    key: String,
}

impl ObsPath {
    /// Parse and normalize a user-supplied path
    pub fn parse(raw: &str) -> ConnectorResult<Self> {
        if raw.is_empty() {
            return Err(ConnectorError::invalid_argument(
                "OBS path can not be empty. The path must at least contain the bucket name.",
            ));
        }

        let rest = raw
            .strip_prefix(ROOT_DIR)
            .or_else(|| raw.strip_prefix(SCHEME))
            .unwrap_or(raw);

        let (bucket, key) = match rest.split_once('/') {
            Some((bucket, key)) => (bucket, key.trim_start_matches('/')),
            None => (rest, ""),
        };

        if !(MIN_BUCKET_LEN..=MAX_BUCKET_LEN).contains(&bucket.len()) {
            return Err(ConnectorError::invalid_argument(format!(
                "Invalid bucket name in path '{}'. Bucket name should be between {} and {} characters long.",
                raw, MIN_BUCKET_LEN, MAX_BUCKET_LEN
            )));
        }

        if !bucket
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
        {
            return Err(ConnectorError::invalid_argument(format!(
                "Invalid bucket name in path '{}'. Bucket name should only contain lower case \
                 alphanumeric characters, hyphens and dots.",
                raw
            )));
        }

        let full_path = format!("{}{}/{}", SCHEME, bucket, key);
        debug!("Normalized OBS path '{}' to '{}'", raw, full_path);

        Ok(Self {
            full_path,
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// Whether a browse path denotes the root (all buckets)
    pub fn is_root(path: &str) -> bool {
        path.is_empty() || path == ROOT_DIR
    }

    /// The normalized `obs://bucket/key` form
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The object key, empty for a bucket root. Never starts with `/`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the path points at a bucket root
    pub fn is_bucket(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Display for ObsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path)
    }
}

impl FromStr for ObsPath {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Record a failure unless a configured plugin path is a valid `obs://` path.
/// Absent and deferred paths are left to the generic checks.
pub fn check_plugin_path(path: &ConfigValue<String>, collector: &mut FailureCollector) {
    let Some(path) = path.as_present().filter(|p| !p.is_empty()) else {
        return;
    };

    if !path.starts_with(SCHEME) {
        collector
            .add_failure(
                format!("Path must start with {}.", SCHEME),
                Some("Use a path of the form obs://bucket/key."),
            )
            .with_config_property(NAME_PATH);
        return;
    }

    if let Err(e) = ObsPath::parse(path) {
        collector
            .add_failure(e.to_string(), None)
            .with_config_property(NAME_PATH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare() {
        let path = ObsPath::parse("bucket/dir/file.csv").unwrap();
        assert_eq!(path.bucket(), "bucket");
        assert_eq!(path.key(), "dir/file.csv");
        assert_eq!(path.full_path(), "obs://bucket/dir/file.csv");
        assert!(!path.is_bucket());
    }

    #[test]
    fn test_parse_scheme_and_root() {
        let a = ObsPath::parse("obs://bucket/dir/").unwrap();
        let b = ObsPath::parse("/bucket/dir/").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.key(), "dir/");
        assert_eq!(a.to_string(), "obs://bucket/dir/");
    }

    #[test]
    fn test_parse_bucket_only() {
        for raw in ["bucket", "obs://bucket", "/bucket", "bucket/"] {
            let path = ObsPath::parse(raw).unwrap();
            assert_eq!(path.bucket(), "bucket", "{}", raw);
            assert!(path.is_bucket(), "{}", raw);
            assert_eq!(path.full_path(), "obs://bucket/");
        }
    }

    #[test]
    fn test_parse_strips_leading_separators_from_key() {
        let path = ObsPath::parse("bucket//dir/a.csv").unwrap();
        assert_eq!(path.key(), "dir/a.csv");
        assert_eq!(path.full_path(), "obs://bucket/dir/a.csv");

        let path = ObsPath::parse("obs://bucket///a.csv").unwrap();
        assert_eq!(path.key(), "a.csv");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for raw in ["", "ab", "/ab/x", "obs://Bucket/x", "bu_ck", "buc ket/x"] {
            let err = ObsPath::parse(raw).unwrap_err();
            assert!(
                matches!(err, ConnectorError::InvalidArgument(_)),
                "{}: {:?}",
                raw,
                err
            );
        }
        let long = "a".repeat(64);
        assert!(ObsPath::parse(&long).is_err());
        assert!(ObsPath::parse(&"a".repeat(63)).is_ok());
        assert!(ObsPath::parse("my-bucket.v2").is_ok());
    }

    #[test]
    fn test_is_root() {
        assert!(ObsPath::is_root(""));
        assert!(ObsPath::is_root("/"));
        assert!(!ObsPath::is_root("/bucket"));
    }

    #[test]
    fn test_check_plugin_path() {
        let check = |value: ConfigValue<String>| {
            let mut collector = FailureCollector::new("sink");
            check_plugin_path(&value, &mut collector);
            collector.failures().len()
        };

        assert_eq!(check(ConfigValue::present("obs://sales/out/".to_string())), 0);
        assert_eq!(check(ConfigValue::present("s3://sales/out/".to_string())), 1);
        assert_eq!(check(ConfigValue::present("obs://x/out/".to_string())), 1);
        assert_eq!(check(ConfigValue::deferred("${path}")), 0);
        assert_eq!(check(ConfigValue::Absent), 0);
    }

    #[test]
    fn test_from_str() {
        let path: ObsPath = "obs://logs/2024/".parse().unwrap();
        assert_eq!(path.bucket(), "logs");
        assert!("x".parse::<ObsPath>().is_err());
    }
}
