//! In-memory OBS client
//!
//! Listing follows the S3 v1 rules: keys are returned in lexicographic
//! order after the marker, keys sharing a prefix up to the delimiter are
//! rolled up into one common prefix, and a next marker is only returned for
//! delimited listings.
//!
//! The client can be loaded from a YAML fixture, which is how the CLI's
//! `--memory` mode browses without a real endpoint:
//!
//! ```yaml
//! buckets:
//!   sales:
//!     - key: orders/2024-01.csv
//!       size: 2048
//!       last_modified: 2024-02-01T00:00:00Z
//!   archive: []
//! ```

use super::{Bucket, ListObjectsRequest, ObjectListing, ObjectSummary, ObsClient, ObsClientError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Page size the service uses when `max_keys` is not set
pub const DEFAULT_MAX_KEYS: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    size: i64,
    last_modified: DateTime<Utc>,
}

/// One object in a fixture file
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureObject {
    pub key: String,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Buckets and objects to preload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryFixture {
    #[serde(default)]
    pub buckets: BTreeMap<String, Vec<FixtureObject>>,
}

/// OBS client backed by in-memory buckets
#[derive(Debug)]
pub struct MemoryObsClient {
    buckets: RwLock<BTreeMap<String, BTreeMap<String, StoredObject>>>,
    page_size: usize,
    failure: RwLock<Option<String>>,
    requests: Mutex<Vec<ListObjectsRequest>>,
    bucket_listings: AtomicUsize,
    closed: AtomicBool,
}

impl Default for MemoryObsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObsClient {
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(BTreeMap::new()),
            page_size: DEFAULT_MAX_KEYS,
            failure: RwLock::new(None),
            requests: Mutex::new(Vec::new()),
            bucket_listings: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Build a client from a parsed fixture
    pub fn from_fixture(fixture: MemoryFixture) -> Self {
        let client = Self::new();
        for (bucket, objects) in fixture.buckets {
            client.create_bucket(&bucket);
            for object in objects {
                client.put_object_at(
                    &bucket,
                    &object.key,
                    object.size,
                    object.last_modified.unwrap_or_else(Utc::now),
                );
            }
        }
        client
    }

    /// Cap every page at `page_size` entries, whatever `max_keys` asks for
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_bucket(self, bucket: &str) -> Self {
        self.create_bucket(bucket);
        self
    }

    pub fn with_object(self, bucket: &str, key: &str, size: i64) -> Self {
        self.put_object(bucket, key, size);
        self
    }

    pub fn create_bucket(&self, bucket: &str) {
        self.buckets.write().entry(bucket.to_string()).or_default();
    }

    /// Store an object, creating its bucket when needed
    pub fn put_object(&self, bucket: &str, key: &str, size: i64) {
        self.put_object_at(bucket, key, size, Utc::now());
    }

    pub fn put_object_at(&self, bucket: &str, key: &str, size: i64, last_modified: DateTime<Utc>) {
        self.buckets
            .write()
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                StoredObject {
                    size,
                    last_modified,
                },
            );
    }

    /// Make every following call fail with a service error
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write() = Some(message.into());
    }

    /// Every list-objects request received so far
    pub fn requests(&self) -> Vec<ListObjectsRequest> {
        self.requests.lock().clone()
    }

    /// Number of list-buckets calls received so far
    pub fn bucket_listings(&self) -> usize {
        self.bucket_listings.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check_usable(&self) -> Result<(), ObsClientError> {
        if self.is_closed() {
            return Err(ObsClientError::Closed);
        }
        match self.failure.read().as_ref() {
            Some(message) => Err(ObsClientError::Service {
                code: "InternalError".to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObsClient for MemoryObsClient {
    async fn list_buckets(&self) -> Result<Vec<Bucket>, ObsClientError> {
        self.bucket_listings.fetch_add(1, Ordering::SeqCst);
        self.check_usable()?;
        Ok(self.buckets.read().keys().map(Bucket::new).collect())
    }

    async fn list_objects(
        &self,
        request: &ListObjectsRequest,
    ) -> Result<ObjectListing, ObsClientError> {
        self.requests.lock().push(request.clone());
        self.check_usable()?;

        let buckets = self.buckets.read();
        let objects = buckets
            .get(&request.bucket)
            .ok_or_else(|| ObsClientError::NoSuchBucket(request.bucket.clone()))?;

        let limit = request
            .max_keys
            .filter(|k| *k > 0)
            .map(|k| k as usize)
            .unwrap_or(DEFAULT_MAX_KEYS)
            .min(self.page_size);
        let prefix = request.prefix.as_deref().unwrap_or("");
        let delimiter = request.delimiter.as_deref().filter(|d| !d.is_empty());
        let marker = request.marker.as_deref();

        let mut listing = ObjectListing {
            bucket: request.bucket.clone(),
            ..Default::default()
        };
        let mut count = 0;
        let mut last_entry: Option<String> = None;

        for (key, object) in objects.iter() {
            if marker.is_some_and(|m| key.as_str() <= m) || !key.starts_with(prefix) {
                continue;
            }

            let rolled_up = delimiter.and_then(|d| {
                key[prefix.len()..]
                    .find(d)
                    .map(|i| key[..prefix.len() + i + d.len()].to_string())
            });

            if let Some(ref common) = rolled_up {
                if listing.common_prefixes.last() == Some(common)
                    || marker.is_some_and(|m| common.as_str() <= m)
                {
                    continue;
                }
            }

            if count == limit {
                listing.is_truncated = true;
                break;
            }
            count += 1;

            match rolled_up {
                Some(common) => {
                    last_entry = Some(common.clone());
                    listing.common_prefixes.push(common);
                }
                None => {
                    last_entry = Some(key.clone());
                    listing.objects.push(ObjectSummary {
                        bucket: request.bucket.clone(),
                        key: key.clone(),
                        size: object.size,
                        last_modified: Some(object.last_modified),
                    });
                }
            }
        }

        if listing.is_truncated && delimiter.is_some() {
            listing.next_marker = last_entry;
        }
        Ok(listing)
    }

    async fn close(&self) -> Result<(), ObsClientError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
