//! Error handling for the application

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Price store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid sample for {product_key}: {reason}")]
    InvalidSample { product_key: String, reason: String },

    #[error("stale sample for {product_key}: {observed_at} is older than latest {latest}")]
    StaleSample {
        product_key: String,
        observed_at: DateTime<Utc>,
        latest: DateTime<Utc>,
    },

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Ingestion errors
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("ingestion failed for {product_key}: {source}")]
    Store {
        product_key: String,
        source: StoreError,
    },
}

impl IngestError {
    pub fn store(product_key: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            product_key: product_key.into(),
            source,
        }
    }
}

/// Price fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("http client setup failed: {0}")]
    Client(reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("unusable price payload from {url}: {reason}")]
    InvalidPayload { url: String, reason: String },
}

/// Notification errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("webhook delivery failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification payload encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("ingestion error: {0}")]
    IngestError(#[from] IngestError),

    #[error("fetch error: {0}")]
    FetchError(#[from] FetchError),

    #[error("notification error: {0}")]
    NotifyError(#[from] NotifyError),
}
