//! Delivery of batches to the collector.
//!
//! One POST per batch with a JSON `BatchEnvelope` body. Any 2xx is success;
//! every other status, and every transport error, fails the whole batch.
//! Connect failures and timeouts surface as `BeaconError::Unreachable`.

use crate::config::BeaconConfig;
use crate::error::{BeaconError, BeaconResult};
use crate::types::BatchEnvelope;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Sends one batch to the collector.
#[async_trait]
pub trait CollectorTransport: Send + Sync {
    async fn deliver(&self, batch: &BatchEnvelope) -> BeaconResult<()>;
}

/// HTTP collector client.
pub struct HttpCollector {
    client: Client,
    endpoint: String,
}

impl HttpCollector {
    pub fn new(config: &BeaconConfig) -> BeaconResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            endpoint: config.collector_url.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CollectorTransport for HttpCollector {
    async fn deliver(&self, batch: &BatchEnvelope) -> BeaconResult<()> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(batch)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    BeaconError::Unreachable(e.to_string())
                } else {
                    BeaconError::Http(e)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BeaconError::Rejected {
                status: status.as_u16(),
            });
        }

        debug!("collector accepted {} events ({status})", batch.len());
        Ok(())
    }
}
