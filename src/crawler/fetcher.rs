//! HTTP fetcher implementation
//!
//! This module handles all page requests for the walker, including:
//! - Building the HTTP client with a proper user agent string
//! - GET requests to fetch page content
//! - Content-Type checks (only HTML is walked)
//! - Error classification
//!
//! Fetch problems never surface as `Err`: they come back as a
//! [`PageContent`] without HTML, carrying a [`FetchFailure`].

use crate::config::{CrawlerConfig, UserAgentConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{redirect::Policy, Client};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for one page
const MAX_REDIRECTS: usize = 10;

/// Content types treated as HTML
const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Why a page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Connection refused, DNS failure, TLS error, redirect loop...
    Network(String),

    /// Request exceeded the configured timeout
    Timeout,

    /// Non-2xx HTTP status
    Status(u16),

    /// The resource is not HTML
    ContentType(String),

    /// The body could not be read
    Body(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(error) => write!(f, "network error: {}", error),
            Self::Timeout => write!(f, "request timeout"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::ContentType(content_type) => {
                write!(f, "expected HTML, got {}", content_type)
            }
            Self::Body(error) => write!(f, "failed to read body: {}", error),
        }
    }
}

/// Result of fetching one page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Final URL after redirects; relative links resolve against it
    pub url: Url,

    /// Page HTML, absent when the fetch failed
    pub html: Option<String>,

    /// Why `html` is absent
    pub failure: Option<FetchFailure>,

    pub fetched_at: DateTime<Utc>,
}

impl PageContent {
    pub fn success(url: Url, html: String) -> Self {
        Self {
            url,
            html: Some(html),
            failure: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn failed(url: Url, failure: FetchFailure) -> Self {
        Self {
            url,
            html: None,
            failure: Some(failure),
            fetched_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.html.is_some()
    }
}

/// Retrieves the HTML of one page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` with a single attempt
    async fn fetch(&self, url: &Url) -> PageContent;
}

/// Builds an HTTP client with proper configuration
///
/// The user agent is formatted as `Name/Version (+ContactURL)`.
///
/// # Example
///
/// ```no_run
/// use doc_walker::config::{CrawlerConfig, UserAgentConfig};
/// use doc_walker::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `reqwest`-backed page fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, crawler)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> PageContent {
        tracing::debug!("Downloading {}", url);

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return PageContent::failed(url.clone(), classify_error(&e)),
        };

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return PageContent::failed(final_url, FetchFailure::Status(status.as_u16()));
        }

        // Check Content-Type; a missing header is given the benefit of the doubt
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        if let Some(content_type) = content_type {
            if !is_html(&content_type) {
                return PageContent::failed(final_url, FetchFailure::ContentType(content_type));
            }
        }

        match response.text().await {
            Ok(body) => PageContent::success(final_url, body),
            Err(e) if e.is_timeout() => PageContent::failed(final_url, FetchFailure::Timeout),
            Err(e) => PageContent::failed(final_url, FetchFailure::Body(e.to_string())),
        }
    }
}

/// Returns true if a Content-Type header value denotes HTML
pub fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    HTML_CONTENT_TYPES.contains(&mime.as_str())
}

fn classify_error(e: &reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_connect() {
        FetchFailure::Network(format!("connection failed: {}", e))
    } else {
        FetchFailure::Network(e.to_string())
    }
}
