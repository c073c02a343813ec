//! OBS client seam
//!
//! The connector talks to OBS only through [`ObsClient`]. Two
//! implementations exist:
//!
//! - [`S3CompatClient`] speaks the S3-compatible OBS API through `aws-sdk-s3`
//! - [`MemoryObsClient`] keeps buckets in memory for tests and offline use

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

pub use memory::MemoryObsClient;
#[cfg(feature = "s3")]
pub use s3::S3CompatClient;

/// Errors raised by an OBS client
#[derive(Debug, Error)]
pub enum ObsClientError {
    /// The service answered with an error
    #[error("OBS service error ({code}): {message}")]
    Service { code: String, message: String },

    /// The request could not be sent or the response could not be read
    #[error("OBS request failed: {0}")]
    Request(String),

    /// The client was closed
    #[error("OBS client is closed")]
    Closed,

    /// The bucket does not exist
    #[error("bucket '{0}' does not exist")]
    NoSuchBucket(String),
}

/// A bucket visible to the credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub name: String,
    pub creation_date: Option<DateTime<Utc>>,
}

impl Bucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_date: None,
        }
    }
}

/// One page of a list-objects call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    /// Start listing after this key
    pub marker: Option<String>,
    pub max_keys: Option<i32>,
}

impl ListObjectsRequest {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn max_keys(mut self, max_keys: i32) -> Self {
        self.max_keys = Some(max_keys);
        self
    }
}

/// Summary of one object in a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub bucket: String,
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Result of a list-objects call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    pub bucket: String,
    pub objects: Vec<ObjectSummary>,
    /// Key prefixes rolled up by the delimiter, each ending with it
    pub common_prefixes: Vec<String>,
    pub is_truncated: bool,
    pub next_marker: Option<String>,
}

impl ObjectListing {
    /// Marker for the next page.
    ///
    /// The service only returns a next marker for delimited listings; without
    /// one, the greatest key or prefix on this page is used.
    pub fn continuation_marker(&self) -> Option<String> {
        if let Some(marker) = self.next_marker.as_ref().filter(|m| !m.is_empty()) {
            return Some(marker.clone());
        }
        let last_key = self.objects.last().map(|o| o.key.as_str());
        let last_prefix = self.common_prefixes.last().map(String::as_str);
        last_key.max(last_prefix).map(str::to_string)
    }
}

/// Operations the connector needs from OBS
#[async_trait]
pub trait ObsClient: Send + Sync {
    /// List every bucket visible to the credentials
    async fn list_buckets(&self) -> Result<Vec<Bucket>, ObsClientError>;

    /// List one page of objects
    async fn list_objects(
        &self,
        request: &ListObjectsRequest,
    ) -> Result<ObjectListing, ObsClientError>;

    /// Release connections held by the client
    async fn close(&self) -> Result<(), ObsClientError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(key: &str) -> ObjectSummary {
        ObjectSummary {
            bucket: "b".to_string(),
            key: key.to_string(),
            size: 0,
            last_modified: None,
        }
    }

    #[test]
    fn test_continuation_marker_prefers_next_marker() {
        let listing = ObjectListing {
            objects: vec![object("a/1.csv")],
            next_marker: Some("a/9.csv".to_string()),
            ..Default::default()
        };
        assert_eq!(listing.continuation_marker().as_deref(), Some("a/9.csv"));
    }

    #[test]
    fn test_continuation_marker_falls_back_to_greatest_entry() {
        let listing = ObjectListing {
            objects: vec![object("a/1.csv")],
            common_prefixes: vec!["a/z/".to_string()],
            next_marker: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(listing.continuation_marker().as_deref(), Some("a/z/"));

        let listing = ObjectListing {
            objects: vec![object("a/2.csv")],
            ..Default::default()
        };
        assert_eq!(listing.continuation_marker().as_deref(), Some("a/2.csv"));

        assert_eq!(ObjectListing::default().continuation_marker(), None);
    }

    #[test]
    fn test_request_builder() {
        let request = ListObjectsRequest::new("logs")
            .prefix("2024/")
            .delimiter("/")
            .marker("2024/01/")
            .max_keys(100);
        assert_eq!(request.bucket, "logs");
        assert_eq!(request.prefix.as_deref(), Some("2024/"));
        assert_eq!(request.max_keys, Some(100));
    }
}
