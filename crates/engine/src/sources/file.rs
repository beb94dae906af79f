//! JSON-file Snapshot Source
//!
//! Re-reads a JSON file on every fetch. Accepts the same payload shapes as the
//! HTTP source, which makes it useful for offline runs against captured data.

use std::marker::PhantomData;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::{ListPayload, SnapshotSource, SourceError};

pub struct FileSource<T> {
    path: PathBuf,
    _records: PhantomData<fn() -> T>,
}

impl<T> FileSource<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _records: PhantomData,
        }
    }
}

#[async_trait]
impl<T> SnapshotSource<T> for FileSource<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch(&self) -> Result<Vec<T>, SourceError> {
        let body = tokio::fs::read(&self.path)
            .await
            .map_err(|e| SourceError::Io(format!("{}: {}", self.path.display(), e)))?;
        let payload: ListPayload<T> =
            serde_json::from_slice(&body).map_err(|e| SourceError::Decode(e.to_string()))?;
        Ok(payload.into_records())
    }
}
