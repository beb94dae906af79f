pub mod ack;
pub mod aggregator;
pub mod alert;
pub mod clock;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod rules;
pub mod server;
pub mod snapshot;
pub mod sources;

pub use alert::{Alert, AlertCounts, AlertKind, Priority};
pub use engine::{AlertEngine, PassReport};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Engine has been stopped")]
    Stopped,
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
