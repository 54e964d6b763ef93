//! HTTP client for the upstream news feed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;

use super::{parse_detail, parse_list};
use super::ArticleFeed;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{FeedDetailItem, FeedListItem};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Feed client backed by `reqwest`.
pub struct HttpFeedClient {
    client: Client,
    list_url: String,
    detail_url: String,
}

impl HttpFeedClient {
    /// Create a client for the given list URL and detail base URL.
    pub fn new(
        list_url: impl Into<String>,
        detail_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/xml, text/xml;q=0.9, */*;q=0.8"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            list_url: list_url.into(),
            detail_url: detail_url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.list_url.clone(),
            config.detail_url.clone(),
            config.feed_timeout(),
        )
    }

    fn detail_url_for(&self, external_id: &str) -> String {
        format!("{}{}", self.detail_url, external_id)
    }

    /// GET a URL and return the whole body as text.
    async fn get_body(&self, url: &str) -> Result<String, AppError> {
        tracing::debug!("Fetching {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!("Request failed for {}: {}", url, e);
            AppError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch(format!("HTTP {} for URL: {}", status, url)));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ArticleFeed for HttpFeedClient {
    async fn fetch_list(&self) -> Result<Vec<FeedListItem>, AppError> {
        let body = self.get_body(&self.list_url).await?;
        parse_list(&body)
    }

    async fn fetch_detail(&self, external_id: &str) -> Result<FeedDetailItem, AppError> {
        let url = self.detail_url_for(external_id);
        let body = self.get_body(&url).await?;
        parse_detail(&body)
    }
}
