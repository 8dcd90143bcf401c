//! Upstream snippet origin over HTTP

use super::SnippetBackend;
use crate::config::UpstreamConfig;
use crate::error::{BackendError, StoreError};
use crate::id::SnippetId;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use url::Url;

/// Read-only tier that fetches `GET <base_url><id><suffix>`
#[derive(Debug)]
pub struct UpstreamBackend {
    client: reqwest::Client,
    base_url: Url,
    suffix: String,
}

impl UpstreamBackend {
    pub fn new(config: &UpstreamConfig) -> Result<Self, StoreError> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| StoreError::Config(format!("upstream base_url {:?}: {}", base, e)))?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Config(format!("upstream client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            suffix: config.suffix.clone(),
        })
    }

    fn url(&self, id: &SnippetId) -> Result<Url, BackendError> {
        Ok(self.base_url.join(&format!("{}{}", id, self.suffix))?)
    }
}

#[async_trait]
impl SnippetBackend for UpstreamBackend {
    async fn get(&self, id: &SnippetId) -> Result<Bytes, BackendError> {
        let url = self.url(id)?;
        tracing::debug!(%url, "Fetching snippet from upstream");

        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::OK => Ok(response.bytes().await?),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound),
            other => Err(BackendError::UnexpectedStatus(other.as_u16())),
        }
    }

    async fn put(&self, _id: &SnippetId, _body: Bytes) -> Result<(), BackendError> {
        Err(BackendError::ReadOnly)
    }

    fn name(&self) -> &str {
        "upstream"
    }
}
