//! S3-compatible object storage backend.
//!
//! Talks to AWS S3 or any S3-compatible service (MinIO, R2, ...) through the
//! AWS SDK. Connection settings are passed in explicitly; nothing here
//! touches process-wide session state.

use crate::{
    errors::{CleanupError, CleanupResult},
    models::object::{DeleteError, ObjectSummary},
    services::storage_client::{ListPage, StorageClient, StorageError, StorageResult},
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, retry::RetryConfig, timeout::TimeoutConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_s3::{
    Client,
    error::DisplayErrorContext,
    types::{Delete, ObjectIdentifier},
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Connection settings for [`S3StorageClient`].
#[derive(Clone, Debug)]
pub struct StorageSettings {
    pub region: String,
    /// Custom endpoint URL; switches the client to path-style addressing.
    pub endpoint: Option<String>,
    /// Named profile from the shared AWS config/credentials files.
    pub profile: Option<String>,
    /// Connect and read timeout.
    pub timeout: Duration,
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
}

pub struct S3StorageClient {
    client: Client,
}

impl S3StorageClient {
    /// Build a client from `settings`.
    ///
    /// When a profile is named its credentials are resolved here, so a
    /// missing or broken profile fails before any bucket is touched.
    pub async fn new(settings: &StorageSettings) -> CleanupResult<Self> {
        info!(
            region = %settings.region,
            endpoint = settings.endpoint.as_deref().unwrap_or("default"),
            "Initializing S3 client"
        );

        let timeouts = TimeoutConfig::builder()
            .connect_timeout(settings.timeout)
            .read_timeout(settings.timeout)
            .build();

        let mut sdk_config_builder = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .timeout_config(timeouts)
            .retry_config(RetryConfig::standard().with_max_attempts(settings.max_attempts));

        if let Some(profile) = &settings.profile {
            sdk_config_builder = sdk_config_builder.profile_name(profile);
        }

        let sdk_config = sdk_config_builder.load().await;

        if let Some(profile) = &settings.profile {
            let not_found = || {
                CleanupError::config(format!(
                    "AWS profile {profile} not found. Please provide a valid profile."
                ))
            };
            let provider = sdk_config.credentials_provider().ok_or_else(not_found)?;
            provider.provide_credentials().await.map_err(|err| {
                debug!(error = %DisplayErrorContext(&err), "Profile credential resolution failed");
                not_found()
            })?;
        }

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &settings.endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(s3_config_builder.build()),
        })
    }
}

fn request_error<E>(err: E) -> StorageError
where
    E: std::error::Error,
{
    StorageError::Request(DisplayErrorContext(&err).to_string())
}

/// Continuation token for the next page, checking the service's truncation flag.
fn next_token(is_truncated: Option<bool>, token: Option<&str>) -> StorageResult<Option<String>> {
    match (is_truncated.unwrap_or(false), token) {
        (false, _) => Ok(None),
        (true, Some(token)) => Ok(Some(token.to_string())),
        (true, None) => Err(StorageError::Malformed(
            "truncated listing without a continuation token".into(),
        )),
    }
}

fn to_utc(value: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

#[async_trait]
impl StorageClient for S3StorageClient {
    #[instrument(skip(self))]
    async fn list_common_prefixes(
        &self,
        bucket: &str,
        delimiter: &str,
        continuation_token: Option<String>,
    ) -> StorageResult<ListPage<String>> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .delimiter(delimiter)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(request_error)?;

        let items = output
            .common_prefixes()
            .iter()
            .map(|common| {
                common.prefix().map(str::to_string).ok_or_else(|| {
                    StorageError::Malformed("common prefix entry without a prefix".into())
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;

        debug!(count = items.len(), "Listed common prefixes");
        Ok(ListPage {
            items,
            next_token: next_token(output.is_truncated(), output.next_continuation_token())?,
        })
    }

    #[instrument(skip(self))]
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: Option<i32>,
        continuation_token: Option<String>,
    ) -> StorageResult<ListPage<ObjectSummary>> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_max_keys(max_keys)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(request_error)?;

        let items = output
            .contents()
            .iter()
            .map(|object| {
                let key = object
                    .key()
                    .ok_or_else(|| StorageError::Malformed("object entry without a key".into()))?;
                let last_modified = object.last_modified().and_then(to_utc).ok_or_else(|| {
                    StorageError::Malformed(format!("object `{key}` has no valid last-modified time"))
                })?;
                Ok(ObjectSummary {
                    key: key.to_string(),
                    last_modified,
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;

        debug!(count = items.len(), "Listed objects");
        Ok(ListPage {
            items,
            next_token: next_token(output.is_truncated(), output.next_continuation_token())?,
        })
    }

    #[instrument(skip(self, keys), fields(count = keys.len()))]
    async fn delete_objects(
        &self,
        bucket: &str,
        keys: Vec<String>,
    ) -> StorageResult<Vec<DeleteError>> {
        let objects = keys
            .into_iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| StorageError::BuildRequest(err.to_string()))?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|err| StorageError::BuildRequest(err.to_string()))?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(request_error)?;

        Ok(output
            .errors()
            .iter()
            .map(|error| {
                let message = error
                    .message()
                    .or(error.code())
                    .unwrap_or("unknown error");
                DeleteError::new(error.key().unwrap_or_default(), message)
            })
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
