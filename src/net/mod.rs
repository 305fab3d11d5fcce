//! Network utilities for HTTP requests and document fetching.
//!
//! This module provides the networking infrastructure for Yomu:
//!
//! - **HTTP Client**: A configured, cloneable client shared by every adapter
//! - **Fetcher Configuration**: Browser-like headers, timeouts and redirect limits
//! - **Request Options**: Custom headers, form bodies and per-call timeouts
//! - **Content Parsing**: HTML helpers in [`html`]
//!
//! The client is passed to adapters through their constructors. Nothing in
//! this module is looked up from global state.
//!
//! # Examples
//!
//! ```rust,no_run
//! use yomu::net::{FetcherConfigBuilder, HttpClient, RequestOptions};
//! use std::time::Duration;
//!
//! # async fn example() -> yomu::Result<()> {
//! let config = FetcherConfigBuilder::default()
//!     .timeout(Duration::from_secs(60))
//!     .build()
//!     .map_err(|e| yomu::Error::Other(e.to_string()))?;
//! let client = HttpClient::with_config(config)?;
//!
//! let html = client.get_text("https://example.com").await?;
//! let results = client
//!     .fetch_text(
//!         "https://example.com/search",
//!         RequestOptions::post().xhr().form("q", "sword"),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use derive_builder::Builder;
use reqwest::{
    Client, Method,
    header::{CONTENT_LANGUAGE, HeaderMap, HeaderValue, REFERER},
    redirect::Policy,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

pub mod html;

/// Desktop browser User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; U; Linux i586; en-US; rv:1.7.3) Gecko/20040924 Epiphany/1.4.4 (Ubuntu)";

/// Fetcher configuration shared by all adapters using one [`HttpClient`].
///
/// Build it with [`FetcherConfigBuilder`]; every field has a default.
///
/// # Fields
///
/// * `user_agent` - User-Agent header value
/// * `referrer` - Referer header value
/// * `content_language` - Content-Language header value
/// * `timeout` - Deadline for ordinary page fetches (2 minutes)
/// * `catalog_timeout` - Deadline for catalog page fetches (30 seconds)
/// * `max_redirects` - Redirects followed before giving up
///
/// ```rust
/// use yomu::net::{FetcherConfig, FetcherConfigBuilder};
/// use std::time::Duration;
///
/// let config = FetcherConfigBuilder::default()
///     .catalog_timeout(Duration::from_secs(45))
///     .build()
///     .unwrap();
/// assert_eq!(config.catalog_timeout, Duration::from_secs(45));
/// assert_eq!(config.timeout, FetcherConfig::default().timeout);
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), default)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub referrer: String,
    pub content_language: String,
    pub timeout: Duration,
    pub catalog_timeout: Duration,
    pub max_redirects: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referrer: "http://www.google.com".to_string(),
            content_language: "en-US".to_string(),
            timeout: Duration::from_secs(2 * 60),
            catalog_timeout: Duration::from_secs(30),
            max_redirects: 10,
        }
    }
}

/// Per-request options: method, extra headers, query and form parameters,
/// and an optional timeout override.
///
/// ```rust
/// use yomu::net::RequestOptions;
///
/// let options = RequestOptions::post()
///     .xhr()
///     .form("action", "nd_getchapters")
///     .form("mypostid", "1234");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    method: Method,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self {
            method: Method::POST,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Marks the request as an in-page AJAX call.
    pub fn xhr(self) -> Self {
        self.header("X-Requested-With", "XMLHttpRequest")
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Adds a `x-www-form-urlencoded` body field.
    pub fn form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP client wrapper used by every source and database adapter.
///
/// Cloning is cheap: the underlying connection pool and configuration are
/// shared. Each adapter keeps a [`scoped`](HttpClient::scoped) clone so
/// errors name the adapter that raised them.
///
/// # Errors
///
/// * [`Error::Timeout`] - The request exceeded its deadline
/// * [`Error::Source`] - The server answered with a non-success status
/// * [`Error::Network`] - Any other transport failure
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    config: Arc<FetcherConfig>,
    source_id: String,
}

impl HttpClient {
    /// Creates a client with [`FetcherConfig::default`].
    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    /// Creates a client from an explicit configuration.
    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, header_value(&config.referrer)?);
        headers.insert(CONTENT_LANGUAGE, header_value(&config.content_language)?);

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(Policy::limited(config.max_redirects))
            .pool_max_idle_per_host(10)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
            source_id: "http".to_string(),
        })
    }

    /// Returns a clone that labels its errors with `source_id`.
    pub fn scoped(&self, source_id: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            source_id: source_id.into(),
        }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Performs a GET request with the default timeout and returns the body.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.fetch_text(url, RequestOptions::get()).await
    }

    /// Performs a GET request with the catalog timeout.
    pub async fn get_catalog_text(&self, url: &str) -> Result<String> {
        self.fetch_text(
            url,
            RequestOptions::get().timeout(self.config.catalog_timeout),
        )
        .await
    }

    /// Performs a request described by `options` and returns the body text.
    pub async fn fetch_text(&self, url: &str, options: RequestOptions) -> Result<String> {
        let response = self.send(url, options).await?;
        response.text().await.map_err(|e| self.classify(url, e))
    }

    /// Performs a GET request and returns the raw body.
    pub async fn get_bytes(&self, url: &str) -> Result<Bytes> {
        let response = self.send(url, RequestOptions::get()).await?;
        response.bytes().await.map_err(|e| self.classify(url, e))
    }

    /// Follows redirects from `url` and returns the final URL.
    pub async fn resolve_redirects(&self, url: &str) -> Result<String> {
        let response = self.send(url, RequestOptions::get()).await?;
        let resolved = response.url().to_string();
        if resolved != url {
            debug!(source = %self.source_id, from = url, to = %resolved, "redirect resolved");
        }
        Ok(resolved)
    }

    async fn send(&self, url: &str, options: RequestOptions) -> Result<reqwest::Response> {
        let timeout = options.timeout.unwrap_or(self.config.timeout);
        debug!(source = %self.source_id, method = %options.method, url, "fetching");

        let mut request = self
            .client
            .request(options.method.clone(), url)
            .timeout(timeout);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if !options.form.is_empty() {
            request = request.form(&options.form);
        }

        let response = request.send().await.map_err(|e| self.classify(url, e))?;
        if !response.status().is_success() {
            return Err(Error::source(
                &self.source_id,
                format!("HTTP {} for {}", response.status(), url),
            ));
        }
        Ok(response)
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(format!("{}: {}", url, e))
        } else {
            Error::Network(e)
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::Other(format!("Invalid header value {:?}: {}", value, e)))
}

/// Resolves `href` against `base`, returning an absolute URL.
///
/// Already absolute hrefs are returned normalised; protocol-relative hrefs
/// take the base scheme. When `base` is not a URL the href is returned as is.
///
/// ```rust
/// use yomu::net::resolve_url;
///
/// assert_eq!(
///     resolve_url("https://www.royalroad.com/", "/fiction/21220"),
///     "https://www.royalroad.com/fiction/21220"
/// );
/// assert_eq!(
///     resolve_url("https://www.novelupdates.com/", "//www.novelupdates.com/extnu/1/"),
///     "https://www.novelupdates.com/extnu/1/"
/// );
/// ```
pub fn resolve_url(base: &str, href: &str) -> String {
    url::Url::parse(base)
        .and_then(|b| b.join(href.trim()))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
