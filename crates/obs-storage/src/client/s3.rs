//! S3-compatible OBS client
//!
//! OBS speaks the S3 API, so listing goes through `aws-sdk-s3` with path-style
//! addressing against the configured endpoint. The signing region is taken
//! from the endpoint host (`obs.<region>.myhuaweicloud.com`).

use super::{Bucket, ListObjectsRequest, ObjectListing, ObjectSummary, ObsClient, ObsClientError};
use crate::connection::ObsConnectorConfig;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

/// Region used when the endpoint does not name one
pub const DEFAULT_REGION: &str = "cn-north-4";

/// Derive the signing region from an OBS endpoint
pub fn region_from_endpoint(endpoint: &str) -> Option<&str> {
    let host = endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint);
    let host = host.split(['/', ':']).next().unwrap_or(host);
    let labels: Vec<&str> = host.split('.').collect();
    labels
        .iter()
        .position(|label| label.eq_ignore_ascii_case("obs"))
        .filter(|i| i + 2 < labels.len())
        .map(|i| labels[i + 1])
        .filter(|region| !region.is_empty())
}

/// Prefix `https://` unless the endpoint already has a scheme
pub fn endpoint_url(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    }
}

fn to_chrono(ts: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

fn map_sdk_error<E, R>(err: SdkError<E, R>) -> ObsClientError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(ctx) => ObsClientError::Service {
            code: ctx.err().code().unwrap_or("Unknown").to_string(),
            message: ctx.err().message().unwrap_or_default().to_string(),
        },
        _ => ObsClientError::Request(DisplayErrorContext(&err).to_string()),
    }
}

/// OBS client backed by `aws-sdk-s3`
#[derive(Debug)]
pub struct S3CompatClient {
    client: RwLock<Option<S3Client>>,
}

impl S3CompatClient {
    /// Build a client for the connection.
    ///
    /// Access credentials are used as given, even when incomplete, so that
    /// validation can report them before any request is made. With IAM the
    /// default credential chain applies.
    pub async fn connect(config: &ObsConnectorConfig) -> Self {
        let endpoint = config.end_point.as_present().filter(|e| !e.is_empty());
        let region = endpoint
            .and_then(|e| region_from_endpoint(e))
            .unwrap_or(DEFAULT_REGION)
            .to_string();

        let mut aws_config_loader =
            aws_config::defaults(BehaviorVersion::latest()).region(aws_config::Region::new(region.clone()));

        if config.is_access_credentials() {
            let access_key = config
                .access_key
                .as_present()
                .map(|k| k.expose_secret())
                .unwrap_or_default();
            let secret_key = config
                .secret_key
                .as_present()
                .map(|k| k.expose_secret())
                .unwrap_or_default();
            let creds =
                aws_sdk_s3::config::Credentials::new(access_key, secret_key, None, None, "obs-storage");
            aws_config_loader = aws_config_loader.credentials_provider(creds);
        }

        let aws_config = aws_config_loader.load().await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&aws_config);
        if let Some(endpoint) = endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint_url(endpoint))
                .force_path_style(true);
        }

        info!(
            "Created OBS client (region: {}, endpoint: {})",
            region,
            endpoint.map(String::as_str).unwrap_or("<default>")
        );

        Self::from_client(S3Client::from_conf(s3_config_builder.build()))
    }

    /// Wrap an already configured SDK client
    pub fn from_client(client: S3Client) -> Self {
        Self {
            client: RwLock::new(Some(client)),
        }
    }

    fn client(&self) -> Result<S3Client, ObsClientError> {
        self.client.read().clone().ok_or(ObsClientError::Closed)
    }
}

#[async_trait]
impl ObsClient for S3CompatClient {
    async fn list_buckets(&self) -> Result<Vec<Bucket>, ObsClientError> {
        let output = self
            .client()?
            .list_buckets()
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|b| {
                b.name().map(|name| Bucket {
                    name: name.to_string(),
                    creation_date: b.creation_date().and_then(to_chrono),
                })
            })
            .collect())
    }

    async fn list_objects(
        &self,
        request: &ListObjectsRequest,
    ) -> Result<ObjectListing, ObsClientError> {
        debug!(
            bucket = %request.bucket,
            prefix = ?request.prefix,
            marker = ?request.marker,
            "Listing OBS objects"
        );

        let output = self
            .client()?
            .list_objects()
            .bucket(&request.bucket)
            .set_prefix(request.prefix.clone())
            .set_delimiter(request.delimiter.clone())
            .set_marker(request.marker.clone())
            .set_max_keys(request.max_keys)
            .send()
            .await
            .map_err(|err| {
                if let SdkError::ServiceError(ctx) = &err {
                    if ctx.err().is_no_such_bucket() {
                        return ObsClientError::NoSuchBucket(request.bucket.clone());
                    }
                }
                map_sdk_error(err)
            })?;

        let bucket = output.name().unwrap_or(&request.bucket).to_string();
        let objects = output
            .contents()
            .iter()
            .filter_map(|o| {
                o.key().map(|key| ObjectSummary {
                    bucket: bucket.clone(),
                    key: key.to_string(),
                    size: o.size().unwrap_or_default(),
                    last_modified: o.last_modified().and_then(to_chrono),
                })
            })
            .collect();
        let common_prefixes = output
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        Ok(ObjectListing {
            bucket,
            objects,
            common_prefixes,
            is_truncated: output.is_truncated().unwrap_or(false),
            next_marker: output.next_marker().map(str::to_string),
        })
    }

    async fn close(&self) -> Result<(), ObsClientError> {
        if self.client.write().take().is_some() {
            debug!("Closed OBS client");
        }
        Ok(())
    }
}
