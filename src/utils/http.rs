// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, IF_MODIFIED_SINCE, LAST_MODIFIED};
use reqwest::{Client, StatusCode};

use crate::error::Result;
use crate::models::{CheckError, CheckerConfig, FetchOutcome, FetchedPage};

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &CheckerConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Retrieves a target's page.
///
/// Every failure (transport, timeout, non-success status) is reported as
/// [`CheckError::FetchFailed`] so it stays local to the target.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, sending `If-Modified-Since` when a value is given.
    async fn fetch(
        &self,
        url: &str,
        if_modified_since: Option<&str>,
    ) -> std::result::Result<FetchOutcome, CheckError>;
}

/// [`PageFetcher`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build the client from config.
    pub fn from_config(config: &CheckerConfig) -> Result<Self> {
        Ok(Self::new(create_client(config)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        if_modified_since: Option<&str>,
    ) -> std::result::Result<FetchOutcome, CheckError> {
        let mut request = self.client.get(url);
        let mut conditional = false;
        if let Some(since) = if_modified_since {
            match HeaderValue::from_str(since) {
                Ok(value) => {
                    request = request.header(IF_MODIFIED_SINCE, value);
                    conditional = true;
                }
                Err(_) => {
                    log::warn!("Not sending If-Modified-Since for {url}: invalid value {since:?}")
                }
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| CheckError::fetch_failed(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED && conditional {
            return Ok(FetchOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(CheckError::fetch_failed(url, format!("HTTP {status}")));
        }

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| CheckError::fetch_failed(url, e))?;

        log::debug!(
            "Fetched {} ({} bytes, last-modified: {:?})",
            url,
            body.len(),
            last_modified
        );

        Ok(FetchOutcome::Fetched(FetchedPage {
            body: body.to_vec(),
            last_modified,
        }))
    }
}
