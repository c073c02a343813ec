//! Huawei OBS connector
//!
//! Tests connectivity, browses buckets and objects, and builds the batch
//! source spec for a browsed path.
//!
//! # Browsing
//!
//! - `/` (or an empty path) lists buckets
//! - any other path lists the common prefixes and objects one level below
//!   it, following continuation markers until the limit is reached
//! - a path that names a single object is resolved by a second listing
//!   without delimiter when the directory listing comes back empty

use crate::client::{Bucket, ListObjectsRequest, ObjectSummary, ObsClient};
use crate::connection::ObsConnectorConfig;
use crate::path::{ObsPath, ROOT_DIR, SCHEME};
use obs_connect::config::{NAME_CONNECTION, NAME_USE_CONNECTION};
use obs_connect::file::{NAME_FORMAT, NAME_PATH, NAME_REFERENCE_NAME};
use obs_connect::format::{
    cleanse_reference_name, detect_file_format, detect_file_type, is_sampleable,
};
use obs_connect::prelude::*;
use obs_connect::parse_plugin_config;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Plugin name shared by the connector, source and sink
pub const NAME: &str = "Obs";
/// Registry key of the connector
pub const CONNECTOR_TYPE: &str = "obs";

pub const BUCKET_TYPE: &str = "bucket";
pub const DIRECTORY_TYPE: &str = "directory";
pub const FILE_TYPE: &str = "file";

pub const LAST_MODIFIED_KEY: &str = "Last Modified";
pub const SIZE_KEY: &str = "Size";
pub const FILE_TYPE_KEY: &str = "File Type";

const DELIMITER: &str = "/";

fn bucket_entity(bucket: &Bucket) -> BrowseEntity {
    BrowseEntity::builder(&bucket.name, &bucket.name, BUCKET_TYPE)
        .can_browse(true)
        .can_sample(true)
        .build()
}

fn directory_entity(bucket: &str, prefix: &str) -> BrowseEntity {
    let name = prefix
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    BrowseEntity::builder(name, format!("{}/{}", bucket, prefix), DIRECTORY_TYPE)
        .can_browse(true)
        .can_sample(true)
        .build()
}

fn file_entity(object: &ObjectSummary) -> BrowseEntity {
    let name = object.key.rsplit('/').next().unwrap_or_default();
    let file_type = detect_file_type(&object.key);

    let mut builder = BrowseEntity::builder(
        name,
        format!("{}/{}", object.bucket, object.key),
        FILE_TYPE,
    )
    .can_sample(is_sampleable(file_type));

    if let Some(last_modified) = object.last_modified {
        builder = builder.property(
            LAST_MODIFIED_KEY,
            BrowseEntityPropertyValue::new(
                last_modified.timestamp_millis().to_string(),
                PropertyType::TimestampMillis,
            ),
        );
    }

    builder
        .property(
            SIZE_KEY,
            BrowseEntityPropertyValue::new(object.size.to_string(), PropertyType::SizeBytes),
        )
        .property(
            FILE_TYPE_KEY,
            BrowseEntityPropertyValue::new(file_type, PropertyType::String),
        )
        .build()
}

/// Connector for one OBS connection
pub struct ObsConnector {
    config: ObsConnectorConfig,
    client: RwLock<Option<Arc<dyn ObsClient>>>,
}

impl fmt::Debug for ObsConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObsConnector")
            .field("config", &self.config)
            .field("closed", &self.client.read().is_none())
            .finish()
    }
}

impl ObsConnector {
    /// Create a connector that owns `client` until [`Connector::close`]
    pub fn new(config: ObsConnectorConfig, client: Arc<dyn ObsClient>) -> Self {
        Self {
            config,
            client: RwLock::new(Some(client)),
        }
    }

    /// Create a connector with an S3-compatible client for `config`
    #[cfg(feature = "s3")]
    pub async fn connect(config: ObsConnectorConfig) -> Self {
        let client = crate::client::S3CompatClient::connect(&config).await;
        Self::new(config, Arc::new(client))
    }

    pub fn spec() -> ConnectorSpec {
        ConnectorSpec::new(CONNECTOR_TYPE, env!("CARGO_PKG_VERSION"), PluginType::Connector)
            .description("Connection to access data in Huawei OBS.")
            .category("Huawei Web Services")
            .config_schema_from::<ObsConnectorConfig>()
            .metadata("scheme", SCHEME)
    }

    pub fn config(&self) -> &ObsConnectorConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.client.read().is_none()
    }

    fn client(&self) -> ConnectorResult<Arc<dyn ObsClient>> {
        self.client.read().clone().ok_or(ConnectorError::Closed)
    }

    async fn browse_buckets(
        &self,
        client: &dyn ObsClient,
        limit: usize,
    ) -> ConnectorResult<BrowseDetail> {
        let buckets = client.list_buckets().await.map_err(ConnectorError::client)?;
        debug!("Found {} buckets", buckets.len());

        Ok(BrowseDetail::builder()
            .total_count(buckets.len())
            .entities(buckets.iter().take(limit).map(bucket_entity).collect())
            .build())
    }

    async fn browse_objects(
        &self,
        client: &dyn ObsClient,
        path: &ObsPath,
        limit: usize,
    ) -> ConnectorResult<BrowseDetail> {
        let bucket = path.bucket();
        let key = path.key();

        let mut request = ListObjectsRequest::new(bucket).delimiter(DELIMITER);
        if !key.is_empty() {
            let prefix = if key.ends_with(DELIMITER) {
                key.to_string()
            } else {
                format!("{}{}", key, DELIMITER)
            };
            request = request.prefix(prefix);
        }

        let mut entities = Vec::new();
        loop {
            let listing = client
                .list_objects(&request)
                .await
                .map_err(ConnectorError::client)?;
            debug!(
                "Listed {} prefixes and {} objects in bucket '{}' (truncated: {})",
                listing.common_prefixes.len(),
                listing.objects.len(),
                bucket,
                listing.is_truncated
            );

            for prefix in &listing.common_prefixes {
                if entities.len() >= limit {
                    break;
                }
                if prefix == ROOT_DIR {
                    continue;
                }
                entities.push(directory_entity(bucket, prefix));
            }

            for object in &listing.objects {
                if entities.len() >= limit {
                    break;
                }
                entities.push(file_entity(object));
            }

            if entities.len() >= limit || !listing.is_truncated {
                break;
            }
            match listing.continuation_marker() {
                Some(marker) => request.marker = Some(marker),
                None => break,
            }
        }

        if !entities.is_empty() {
            return Ok(BrowseDetail::builder()
                .total_count(entities.len())
                .entities(entities)
                .build());
        }

        // Nothing below the path as a directory; it may name an object
        let lookup = ListObjectsRequest::new(bucket).prefix(key).max_keys(1);
        let listing = client
            .list_objects(&lookup)
            .await
            .map_err(ConnectorError::client)?;

        match listing.objects.first() {
            Some(object) => Ok(BrowseDetail::builder()
                .total_count(1)
                .entity(file_entity(object))
                .build()),
            None => Ok(BrowseDetail::empty()),
        }
    }
}

#[async_trait]
impl Connector for ObsConnector {
    async fn test(&self, ctx: &mut ConnectorContext) -> ConnectorResult<()> {
        let collector = ctx.failure_collector_mut();
        let before = collector.failures().len();
        self.config.validate(collector);
        if collector.failures().len() > before {
            debug!("Skipping connectivity check, the connection config is incomplete");
            return Ok(());
        }

        let client = self.client()?;
        info!("Testing OBS connectivity");
        match client.list_buckets().await {
            Ok(buckets) => {
                info!("Connected to OBS, {} buckets visible", buckets.len());
            }
            Err(e) => {
                warn!("Could not connect to OBS: {}", e);
                collector
                    .add_failure(
                        format!("Could not connect to OBS: {}", e),
                        Some("Ensure the credentials and endpoint are correct."),
                    )
                    .with_stacktrace(&e);
            }
        }
        Ok(())
    }

    async fn browse(
        &self,
        _ctx: &mut ConnectorContext,
        request: &BrowseRequest,
    ) -> ConnectorResult<BrowseDetail> {
        let client = self.client()?;
        let limit = request.effective_limit();

        if ObsPath::is_root(&request.path) {
            return self.browse_buckets(client.as_ref(), limit).await;
        }

        let path = ObsPath::parse(&request.path)?;
        self.browse_objects(client.as_ref(), &path, limit).await
    }

    fn connection_spec(&self, request: &ConnectionSpecRequest) -> ConnectorResult<ConnectionSpec> {
        let mut properties = BTreeMap::new();
        properties.insert(NAME_USE_CONNECTION.to_string(), "true".to_string());
        properties.insert(
            NAME_CONNECTION.to_string(),
            request.connection_with_macro.clone(),
        );

        let key = if ObsPath::is_root(&request.path) {
            properties.insert(NAME_PATH.to_string(), SCHEME.to_string());
            String::new()
        } else {
            let path = ObsPath::parse(&request.path)?;
            properties.insert(NAME_PATH.to_string(), path.full_path().to_string());
            properties.insert(
                NAME_REFERENCE_NAME.to_string(),
                cleanse_reference_name(&format!("{}.{}", path.bucket(), path.key())),
            );
            path.key().to_string()
        };

        let format = detect_file_format(detect_file_type(&key));
        properties.insert(NAME_FORMAT.to_string(), format.name().to_string());

        Ok(ConnectionSpec::builder()
            .related_plugin(PluginSpec::new(NAME, PluginType::BatchSource, properties))
            .build())
    }

    fn file_system_properties(&self, _path: &str) -> ConnectorResult<BTreeMap<String, String>> {
        Ok(self.config.credential_properties())
    }

    async fn close(&self) -> ConnectorResult<()> {
        let client = self.client.write().take();
        if let Some(client) = client {
            client.close().await.map_err(ConnectorError::client)?;
            info!("Closed OBS connector");
        }
        Ok(())
    }
}

/// Factory for creating OBS connectors
pub struct ObsConnectorFactory;

#[async_trait]
impl ConnectorFactory for ObsConnectorFactory {
    fn spec(&self) -> ConnectorSpec {
        ObsConnector::spec()
    }

    async fn create(&self, config: &serde_yaml::Value) -> ConnectorResult<Box<dyn Connector>> {
        let config: ObsConnectorConfig = parse_plugin_config(config)?;

        #[cfg(feature = "s3")]
        {
            Ok(Box::new(ObsConnector::connect(config).await))
        }

        #[cfg(not(feature = "s3"))]
        {
            let _ = config;
            Err(ConnectorError::config(
                "no OBS client available, enable the 's3' feature",
            ))
        }
    }
}

/// Register the OBS connector
pub fn register(registry: &mut obs_connect::ConnectorRegistry) {
    registry.register(CONNECTOR_TYPE, Arc::new(ObsConnectorFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryObsClient;
    use chrono::{TimeZone, Utc};

    fn connector(client: MemoryObsClient) -> ObsConnector {
        ObsConnector::new(
            ObsConnectorConfig::with_credentials("AK", "SK", "obs.cn-north-4.myhuaweicloud.com"),
            Arc::new(client),
        )
    }

    #[test]
    fn test_spec() {
        let spec = ObsConnector::spec();
        assert_eq!(spec.connector_type, "obs");
        assert_eq!(spec.plugin_type, PluginType::Connector);
        assert!(spec.config_schema.is_some());
    }

    #[test]
    fn test_directory_entity() {
        let entity = directory_entity("sales", "orders/2024/");
        assert_eq!(entity.name, "2024");
        assert_eq!(entity.path, "sales/orders/2024/");
        assert_eq!(entity.entity_type, DIRECTORY_TYPE);
        assert!(entity.can_browse && entity.can_sample);
    }

    #[test]
    fn test_file_entity() {
        let object = ObjectSummary {
            bucket: "sales".to_string(),
            key: "orders/2024-01.csv".to_string(),
            size: 2048,
            last_modified: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
        };
        let entity = file_entity(&object);
        assert_eq!(entity.name, "2024-01.csv");
        assert_eq!(entity.path, "sales/orders/2024-01.csv");
        assert!(!entity.can_browse);
        assert!(entity.can_sample);
        assert_eq!(entity.property(SIZE_KEY).unwrap().value, "2048");
        assert_eq!(entity.property(FILE_TYPE_KEY).unwrap().value, "text/csv");
        assert_eq!(
            entity.property(LAST_MODIFIED_KEY).unwrap().value,
            "1706745600000"
        );

        let marker = ObjectSummary {
            key: "orders/".to_string(),
            last_modified: None,
            ..object
        };
        let entity = file_entity(&marker);
        assert_eq!(entity.name, "");
        assert!(entity.property(LAST_MODIFIED_KEY).is_none());
        assert!(!entity.can_sample);
    }

    #[tokio::test]
    async fn test_browse_root() {
        let connector = connector(
            MemoryObsClient::new()
                .with_bucket("alpha")
                .with_bucket("beta")
                .with_bucket("gamma"),
        );
        let mut ctx = ConnectorContext::new("obs");

        let detail = connector
            .browse(&mut ctx, &BrowseRequest::new("/"))
            .await
            .unwrap();
        assert_eq!(detail.total_count, 3);
        assert_eq!(detail.entities.len(), 3);
        assert!(detail.entities.iter().all(|e| e.entity_type == BUCKET_TYPE));

        let detail = connector
            .browse(&mut ctx, &BrowseRequest::new("").with_limit(2))
            .await
            .unwrap();
        assert_eq!(detail.total_count, 3);
        assert_eq!(detail.entities.len(), 2);
    }

    #[tokio::test]
    async fn test_browse_invalid_path() {
        let connector = connector(MemoryObsClient::new());
        let mut ctx = ConnectorContext::new("obs");
        let err = connector
            .browse(&mut ctx, &BrowseRequest::new("ab/x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidArgument(_)));
    }

    #[test]
    fn test_connection_spec_root() {
        let connector = connector(MemoryObsClient::new());
        let spec = connector
            .connection_spec(&ConnectionSpecRequest::new("/", "${conn(my-obs)}"))
            .unwrap();
        let plugin = spec.related_plugin(NAME, PluginType::BatchSource).unwrap();
        assert_eq!(plugin.properties[NAME_PATH], "obs://");
        assert_eq!(plugin.properties[NAME_USE_CONNECTION], "true");
        assert_eq!(plugin.properties[NAME_CONNECTION], "${conn(my-obs)}");
        assert_eq!(plugin.properties[NAME_FORMAT], "text");
        assert!(!plugin.properties.contains_key(NAME_REFERENCE_NAME));
    }

    #[test]
    fn test_file_system_properties() {
        let connector = connector(MemoryObsClient::new());
        let props = connector.file_system_properties("obs://sales/").unwrap();
        assert_eq!(props["fs.obs.access.key"], "AK");
        assert_eq!(props.len(), 3);
    }

    #[tokio::test]
    async fn test_factory() {
        let factory = ObsConnectorFactory;
        assert_eq!(factory.spec().connector_type, "obs");

        let mut registry = obs_connect::ConnectorRegistry::new();
        register(&mut registry);
        assert!(registry.contains(CONNECTOR_TYPE));
    }
}
