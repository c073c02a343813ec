//! Core plugin traits and types
//!
//! This module provides the host-facing building blocks plugins implement
//! or consume:
//! - `Connector` - test, browse and describe a storage connection
//! - `BatchPlugin` - validate a batch source/sink and produce its properties
//! - `FailureCollector` - fail-soft validation reporting
//! - `registry` - name-keyed factories for runtime lookup

pub mod browse;
pub mod check;
pub mod connector;
pub mod failure;
pub mod plugin;
pub mod registry;
pub mod spec;

// Re-export browse types
pub use browse::{
    BrowseDetail, BrowseDetailBuilder, BrowseEntity, BrowseEntityBuilder,
    BrowseEntityPropertyValue, BrowseRequest, PropertyType,
};

// Re-export check types
pub use check::{CheckDetail, CheckResult};

// Re-export connector types
pub use connector::{Connector, ConnectorContext};

// Re-export failure types
pub use failure::{Cause, FailureCollector, ValidationException, ValidationFailure};

// Re-export plugin types
pub use plugin::{AccessType, BatchPlugin, LineageOperation, LineageRecorder};

// Re-export registry types
pub use registry::{
    parse_plugin_config, BatchPluginFactory, ConnectorFactory, ConnectorRegistry, FactoryRegistry,
    PluginRegistry, SinkRegistry, SourceRegistry,
};

// Re-export spec types
pub use spec::{
    ConnectionSpec, ConnectionSpecBuilder, ConnectionSpecRequest, ConnectorSpec, PluginSpec,
    PluginType,
};
