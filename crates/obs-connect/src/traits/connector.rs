//! Connector trait
//!
//! A connector owns a storage client handle for one connection and exposes
//! the interactive hooks the host drives: connectivity test, browse, the
//! related-plugin spec for a browsed path, and the filesystem properties the
//! underlying file system implementation needs.

use super::browse::{BrowseDetail, BrowseRequest};
use super::failure::FailureCollector;
use super::spec::{ConnectionSpec, ConnectionSpecRequest};
use crate::error::ConnectorResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Per-call context handed to connector operations
#[derive(Debug, Default)]
pub struct ConnectorContext {
    failure_collector: FailureCollector,
}

impl ConnectorContext {
    /// Create a context whose failures are attributed to `stage`
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            failure_collector: FailureCollector::new(stage),
        }
    }

    pub fn failure_collector(&self) -> &FailureCollector {
        &self.failure_collector
    }

    pub fn failure_collector_mut(&mut self) -> &mut FailureCollector {
        &mut self.failure_collector
    }

    /// Consume the context and keep the collected failures
    pub fn into_failure_collector(self) -> FailureCollector {
        self.failure_collector
    }
}

/// A browsable connection to an external storage system
///
/// # Example
///
/// ```rust,ignore
/// let mut ctx = ConnectorContext::new("obs");
/// connector.test(&mut ctx).await?;
/// ctx.failure_collector().get_or_throw()?;
///
/// let detail = connector.browse(&mut ctx, &BrowseRequest::new("/")).await?;
/// connector.close().await?;
/// ```
#[async_trait]
pub trait Connector: Send + Sync {
    /// Validate the configuration and try the connection.
    ///
    /// Problems are recorded in the context's failure collector; an `Err` is
    /// only returned when the connector itself can no longer be used.
    async fn test(&self, ctx: &mut ConnectorContext) -> ConnectorResult<()>;

    /// List the entities under a path
    async fn browse(
        &self,
        ctx: &mut ConnectorContext,
        request: &BrowseRequest,
    ) -> ConnectorResult<BrowseDetail>;

    /// Build the plugin properties matching a browsed path
    fn connection_spec(&self, request: &ConnectionSpecRequest) -> ConnectorResult<ConnectionSpec>;

    /// Properties for the underlying file system implementation
    fn file_system_properties(&self, path: &str) -> ConnectorResult<BTreeMap<String, String>>;

    /// Release the client handle. Calling it again is a no-op.
    async fn close(&self) -> ConnectorResult<()>;
}
