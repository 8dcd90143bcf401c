//! S3 object store backend

use super::SnippetBackend;
use crate::config::S3Config;
use crate::error::BackendError;
use crate::id::SnippetId;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

/// Snippets stored as objects keyed `<prefix><id>`
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Backend {
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Build a client from `config`, falling back to the SDK's default
    /// credential chain when no static keys are given
    pub async fn from_config(config: &S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(key), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key,
                secret,
                None,
                None,
                "joyplay-config",
            ));
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        Self::new(
            Client::from_conf(s3_config),
            config.bucket.clone(),
            config.prefix.clone(),
        )
    }

    fn key(&self, id: &SnippetId) -> String {
        format!("{}{}", self.prefix, id)
    }
}

#[async_trait]
impl SnippetBackend for S3Backend {
    async fn get(&self, id: &SnippetId) -> Result<Bytes, BackendError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.key(id))
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(service) if service.is_no_such_key() => BackendError::NotFound,
                _ => BackendError::ObjectStore(format!(
                    "error retrieving s3 object: {}",
                    DisplayErrorContext(&e)
                )),
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| BackendError::ObjectStore(format!("error reading s3 object: {}", e)))?;
        Ok(body.into_bytes())
    }

    async fn put(&self, id: &SnippetId, body: Bytes) -> Result<(), BackendError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.key(id))
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                BackendError::ObjectStore(format!(
                    "error sending s3 object: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    fn name(&self) -> &str {
        "s3"
    }
}
