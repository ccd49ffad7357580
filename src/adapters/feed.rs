//! RSS feed source.
//!
//! Downloads the feed document over HTTP and maps each `<item>` to a
//! FeedItem (`link`, `title`, `description`).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::FeedSource;
use crate::domain::FeedItem;

/// Feed source reading an RSS 2.0 document from a URL
pub struct RssFeed {
    /// Feed URL
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl RssFeed {
    /// Create a feed source with a request timeout
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client for feed")?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedSource for RssFeed {
    fn name(&self) -> &str {
        "rss"
    }

    async fn fetch(&self) -> Result<Vec<FeedItem>> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to request feed {}", self.url))?
            .error_for_status()
            .with_context(|| format!("Feed {} returned an error status", self.url))?
            .bytes()
            .await
            .with_context(|| format!("Failed to read feed body from {}", self.url))?;

        parse_items(&body[..]).with_context(|| format!("Failed to parse feed {}", self.url))
    }
}

/// Parse an RSS document into feed items, keeping document order
pub fn parse_items(document: &[u8]) -> Result<Vec<FeedItem>> {
    let channel = ::rss::Channel::read_from(document)?;

    Ok(channel
        .items()
        .iter()
        .map(|item| FeedItem {
            link: item
                .link()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            title: item.title().unwrap_or_default().trim().to_string(),
            summary: item.description().unwrap_or_default().to_string(),
        })
        .collect())
}
