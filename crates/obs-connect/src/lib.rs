//! obs-connect - Plugin SDK for object-storage connectors
//!
//! This crate models the host side of a data-integration plugin: the types a
//! connector or batch plugin receives and returns, and the small runtime the
//! `obs-connect` CLI uses to load and drive plugins locally.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    obs-connect (SDK + host runtime)             │
//! │  Connector, BatchPlugin, FailureCollector, ConfigValue,         │
//! │  Browse/Spec types, PluginRegistry, ConnectConfig, logging      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                    Plugin crates                                │
//! │  └── obs-storage (Huawei OBS connector, batch source and sink)  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # SDK Usage
//!
//! ```rust,ignore
//! use obs_connect::prelude::*;
//!
//! #[async_trait]
//! impl Connector for MyConnector {
//!     async fn test(&self, ctx: &mut ConnectorContext) -> ConnectorResult<()> {
//!         self.config.validate(ctx.failure_collector_mut());
//!         Ok(())
//!     }
//!     // ...
//! }
//! ```

// Core plugin traits
pub mod traits;

// Common types (SensitiveString)
pub mod types;

// Deferred configuration values
pub mod value;

// Error types
pub mod error;

// File formats and file type detection
pub mod format;

// Generic file-plugin configuration
pub mod file;

// Host runtime
pub mod config;
pub mod logging;

// Re-export SensitiveString at crate root for convenience
pub use types::SensitiveString;

pub use value::{is_macro, Blank, ConfigValue};

// Re-export core traits at crate root for ergonomic use
pub use traits::{
    parse_plugin_config,
    AccessType,
    BatchPlugin,
    BatchPluginFactory,
    // Browse
    BrowseDetail,
    BrowseDetailBuilder,
    BrowseEntity,
    BrowseEntityBuilder,
    BrowseEntityPropertyValue,
    BrowseRequest,
    Cause,
    // Check
    CheckDetail,
    CheckResult,
    // Spec
    ConnectionSpec,
    ConnectionSpecBuilder,
    ConnectionSpecRequest,
    // Core plugin traits
    Connector,
    ConnectorContext,
    ConnectorFactory,
    // Registry
    ConnectorRegistry,
    ConnectorSpec,
    // Failures
    FailureCollector,
    FactoryRegistry,
    // Lineage
    LineageOperation,
    LineageRecorder,
    PluginRegistry,
    PluginSpec,
    PluginType,
    PropertyType,
    SinkRegistry,
    SourceRegistry,
    ValidationException,
    ValidationFailure,
};

// Re-export error types
pub use error::{ConnectError, ConnectorError, ConnectorResult, Result};

// Re-export config types
pub use config::ConnectConfig;

pub use file::{FileSinkProperties, FileSourceProperties};
pub use format::FileFormat;
pub use logging::{init_logging, LogFormat};

// Re-export commonly used dependencies for plugin implementations
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        async_trait, BatchPlugin, BatchPluginFactory, BrowseDetail, BrowseEntity,
        BrowseEntityPropertyValue, BrowseRequest, ConfigValue, ConnectionSpec,
        ConnectionSpecRequest, Connector, ConnectorContext, ConnectorError, ConnectorFactory,
        ConnectorResult, ConnectorSpec, Deserialize, FailureCollector, FileFormat,
        FileSinkProperties, FileSourceProperties, LineageRecorder, PluginSpec, PluginType,
        PropertyType, SensitiveString, Serialize,
    };
    pub use schemars::JsonSchema;
    pub use validator::Validate;
}
