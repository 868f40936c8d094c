//! Cloudflare R2 backend over the S3 API.

use super::ObjectStorage;
use super::errors::{Result, StorageError};
use crate::config::StorageConfig;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::{Client, config::Region, error::DisplayErrorContext, presigning::PresigningConfig, primitives::ByteStream};
use bytes::Bytes;
use std::time::Duration;
use tracing::instrument;

/// S3-compatible client bound to a single bucket
#[derive(Debug, Clone)]
pub struct R2Storage {
    client: Client,
    bucket: String,
}

impl R2Storage {
    /// Build a client from static credentials. No network traffic happens here.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "twiplo-config",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.as_str().trim_end_matches('/'));
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::info!(
            bucket = %config.bucket_name,
            endpoint = ?config.endpoint_url.as_ref().map(|u| u.as_str()),
            region = %config.region,
            "Object storage client initialized"
        );

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket_name.clone(),
        }
    }
}

#[async_trait]
impl ObjectStorage for R2Storage {
    #[instrument(skip(self, body), fields(bucket = %self.bucket, size = body.len()), err)]
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        let content_length = body.len() as i64;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(content_length)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket), err)]
    async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(expires_in).map_err(|e| StorageError::Presign {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(request.uri().to_string())
    }
}
