// src/fetch.rs

//! Page retrieval.
//!
//! The orchestrator depends on the [`PageFetcher`] trait rather than a
//! concrete client so poll cycles can run against canned markup in tests.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::HttpConfig;
use crate::error::Result;

/// Retrieves raw page markup for a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page body as text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// HTTP-backed page fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a configured HTTP fetcher.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let text = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}
