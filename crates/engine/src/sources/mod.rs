//! Snapshot Sources
//!
//! The three read-only collaborators the engine pulls from on every pass.
//! Timeouts are applied by the engine, authentication by the source.

pub mod file;
pub mod http;

pub use self::file::FileSource;
pub use self::http::HttpSource;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapshot::{DriverSnapshot, OrderSnapshot, TruckSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Orders,
    Drivers,
    Trucks,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Orders => "orders",
            SourceKind::Drivers => "drivers",
            SourceKind::Trucks => "trucks",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("unauthenticated: the API rejected the session token")]
    Unauthenticated,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed payload: {0}")]
    Decode(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("IO error: {0}")]
    Io(String),
}

/// A read-only provider of one snapshot category.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotSource<T: Send + Sync + 'static>: Send + Sync {
    /// Fetch the records as of now.
    async fn fetch(&self) -> Result<Vec<T>, SourceError>;
}

/// List payloads come either bare or wrapped in a `data` envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListPayload<T> {
    Bare(Vec<T>),
    Envelope { data: Vec<T> },
}

impl<T> ListPayload<T> {
    pub(crate) fn into_records(self) -> Vec<T> {
        match self {
            ListPayload::Bare(records) => records,
            ListPayload::Envelope { data } => data,
        }
    }
}

/// The three sources the engine fetches from.
#[derive(Clone)]
pub struct Sources {
    pub orders: Arc<dyn SnapshotSource<OrderSnapshot>>,
    pub drivers: Arc<dyn SnapshotSource<DriverSnapshot>>,
    pub trucks: Arc<dyn SnapshotSource<TruckSnapshot>>,
}

impl Sources {
    pub fn new(
        orders: Arc<dyn SnapshotSource<OrderSnapshot>>,
        drivers: Arc<dyn SnapshotSource<DriverSnapshot>>,
        trucks: Arc<dyn SnapshotSource<TruckSnapshot>>,
    ) -> Self {
        Self {
            orders,
            drivers,
            trucks,
        }
    }
}
