//! HTTP Snapshot Source
//!
//! Reads one collection from the dashboard's REST API, attaching the session
//! bearer token when one is configured.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ListPayload, SnapshotSource, SourceError};

pub struct HttpSource<T> {
    client: Client,
    url: Url,
    auth_token: Option<String>,
    _records: PhantomData<fn() -> T>,
}

impl<T> HttpSource<T> {
    /// `path` is resolved against `base_url`, which should end in `/`.
    pub fn new(client: Client, base_url: &Url, path: &str) -> crate::Result<Self> {
        let url = base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| crate::Error::Config(format!("Invalid source path {:?}: {}", path, e)))?;

        Ok(Self {
            client,
            url,
            auth_token: None,
            _records: PhantomData,
        })
    }

    /// Set the bearer token sent with every request
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl<T> SnapshotSource<T> for HttpSource<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch(&self) -> Result<Vec<T>, SourceError> {
        let mut request = self.client.get(self.url.clone());
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SourceError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;
        let payload: ListPayload<T> =
            serde_json::from_slice(&body).map_err(|e| SourceError::Decode(e.to_string()))?;

        let records = payload.into_records();
        debug!("Fetched {} records from {}", records.len(), self.url);
        Ok(records)
    }
}
