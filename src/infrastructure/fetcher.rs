//! Price fetch adapters

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::config::ProductCfg;
use crate::shared::errors::FetchError;

/// One fetched observation, before ingestion
#[derive(Debug, Clone)]
pub struct FetchedPrice {
    pub price: f64,
    pub currency: Option<String>,
    pub observed_at: DateTime<Utc>,
}

/// Supplies one price observation per product per cycle.
///
/// Adapters do not retry or rate-limit; cadence belongs to the caller.
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    async fn fetch(&self, product: &ProductCfg) -> Result<FetchedPrice, FetchError>;
}

/// Response body of a price endpoint
#[derive(Debug, Deserialize)]
struct PricePayload {
    price: f64,
    currency: Option<String>,
    success: Option<bool>,
}

/// Fetches prices from HTTP endpoints returning a JSON body like
/// `{"success": true, "price": 2950.0, "currency": "SGD"}`.
pub struct HttpPriceFetcher {
    client: reqwest::Client,
}

impl HttpPriceFetcher {
    pub fn new(timeout: std::time::Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PriceFetcher for HttpPriceFetcher {
    async fn fetch(&self, product: &ProductCfg) -> Result<FetchedPrice, FetchError> {
        debug!("fetching price for {} from {}", product.key, product.url);

        let response = self
            .client
            .get(&product.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| FetchError::Request {
                url: product.url.clone(),
                source,
            })?;

        let payload: PricePayload =
            response.json().await.map_err(|source| FetchError::Request {
                url: product.url.clone(),
                source,
            })?;

        parse_payload(&product.url, payload)
    }
}

fn parse_payload(url: &str, payload: PricePayload) -> Result<FetchedPrice, FetchError> {
    if payload.success == Some(false) {
        return Err(FetchError::InvalidPayload {
            url: url.to_string(),
            reason: "endpoint reported failure".to_string(),
        });
    }
    if !payload.price.is_finite() || payload.price <= 0.0 {
        return Err(FetchError::InvalidPayload {
            url: url.to_string(),
            reason: format!("price must be positive, got {}", payload.price),
        });
    }
    Ok(FetchedPrice {
        price: payload.price,
        currency: payload.currency,
        observed_at: Utc::now(),
    })
}
