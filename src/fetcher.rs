use std::{future::Future, time::Duration};

use anyhow::{Context as _, Result};
use reqwest::Client;

/// Source of raw PDU status documents.
pub trait Fetch {
    /// Returns the response body, or an error when no document is available
    /// this cycle.
    fn fetch(&self) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct PduClient {
    client: Client,
    url: String,
}

impl PduClient {
    pub fn new(address: &str, port: u16, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            url: format!("http://{address}:{port}/data.xml"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Fetch for PduClient {
    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("failed to connect to PDU: {}", self.url))?
            .error_for_status()
            .with_context(|| format!("PDU returned an error status: {}", self.url))?;

        response
            .text()
            .await
            .context("failed to read PDU response body")
    }
}
