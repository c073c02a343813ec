//! Huawei OBS plugins for obs-connect
//!
//! This crate provides a connector, a batch source and a batch sink for
//! Huawei Object Storage Service (OBS), which speaks the S3 API:
//!
//! - **Connector** - tests connectivity, browses buckets and objects, and
//!   preconfigures a batch source for a browsed path
//! - **Batch source** - validates a read configuration and produces the
//!   `fs.obs.*` properties for the file system implementation
//! - **Batch sink** - the same for writes, with optional KMS encryption
//!
//! # Feature Flags
//!
//! ```toml
//! # S3-compatible client (default)
//! obs-storage = { version = "0.1", features = ["s3"] }
//!
//! # In-memory client only
//! obs-storage = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use obs_connect::PluginRegistry;
//!
//! let mut registry = PluginRegistry::new();
//! obs_storage::register_all(&mut registry);
//!
//! let source = registry.sources.get("obs").unwrap().create(&config)?;
//! let properties = source.prepare_run("orders")?;
//! ```

pub mod client;
pub mod connection;
pub mod connector;
pub mod path;
pub mod sink;
pub mod source;

// Re-exports for convenience
pub use client::{MemoryObsClient, ObsClient, ObsClientError};
#[cfg(feature = "s3")]
pub use client::S3CompatClient;
pub use connection::{AuthenticationMethod, ObsConnectorConfig};
pub use connector::{ObsConnector, ObsConnectorFactory};
pub use path::ObsPath;
pub use sink::{ObsBatchSink, ObsBatchSinkConfig, ObsBatchSinkFactory};
pub use source::{ObsBatchSource, ObsBatchSourceConfig, ObsBatchSourceFactory};

/// Register the OBS connector, source and sink
pub fn register_all(registry: &mut obs_connect::PluginRegistry) {
    connector::register(&mut registry.connectors);
    source::register(&mut registry.sources);
    sink::register(&mut registry.sinks);
}
