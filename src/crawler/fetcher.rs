//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building HTTP clients with a contact-bearing user agent
//! - Attaching basic or bearer credentials
//! - Refusing out-of-scope URLs before any request is made
//! - Following redirects hop by hop, each hop checked against the scope
//! - Error classification
//!
//! The network itself sits behind the [`Transport`] trait so that tests can
//! substitute a counting or scripted transport.

use crate::config::UserAgentConfig;
use crate::model::Auth;
use crate::url::Scope;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// Per-page fetch failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection-level failure (DNS, refused, timeout, TLS, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// The URL is outside the crawl's domain scope; no request was made
    #[error("URL out of scope: {0}")]
    OutOfScope(String),

    /// The response is not an HTML document
    #[error("Expected HTML, got {content_type}")]
    ContentMismatch { content_type: String },

    /// A redirect chain looped or ran past the hop limit
    #[error("Redirect error: {0}")]
    Redirect(String),

    /// The page worker died before reporting an outcome
    #[error("Worker failed: {0}")]
    Worker(String),
}

/// A successfully retrieved response body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the response was served from
    pub url: Url,
    pub status: u16,
    /// Content-Type header value, if any
    pub content_type: Option<String>,
    pub body: String,
    /// Resolved `Location` of a 3xx response; the body is empty then
    pub location: Option<Url>,
}

impl FetchedPage {
    /// Returns true if the content type is HTML or was not declared
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml")
            }
            None => true,
        }
    }
}

/// Raw request/response exchange
///
/// Implementations perform exactly one request per call and never retry.
/// Redirects are not followed: a 3xx response comes back as a page whose
/// `location` names the next hop.
pub trait Transport: Send + Sync + 'static {
    fn get(
        &self,
        url: &Url,
        auth: Option<&Auth>,
    ) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn get(
        &self,
        url: &Url,
        auth: Option<&Auth>,
    ) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send {
        (**self).get(url, auth)
    }
}

/// Production transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &Url, auth: Option<&Auth>) -> Result<FetchedPage, FetchError> {
        let mut request = self.client.get(url.clone());
        request = match auth {
            Some(Auth::Basic { username, password }) => {
                request.basic_auth(username, password.as_ref())
            }
            Some(Auth::Bearer { token }) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(classify_error)?;
        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    FetchError::Redirect(format!("{} from {} has no Location", status, url))
                })?;
            let target = url.join(location).map_err(|e| {
                FetchError::Redirect(format!("Invalid Location '{}': {}", location, e))
            })?;

            return Ok(FetchedPage {
                url: url.clone(),
                status: status.as_u16(),
                content_type: None,
                body: String::new(),
                location: Some(target),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(classify_error)?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
            location: None,
        })
    }
}

fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Network("Request timeout".to_string())
    } else if e.is_connect() {
        FetchError::Network(format!("Connection failed: {}", e))
    } else if e.is_redirect() {
        FetchError::Redirect(e.to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use storefront_crawler::config::UserAgentConfig;
/// use storefront_crawler::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "ShelfBot".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Scope- and auth-aware page fetcher
#[derive(Debug)]
pub struct Fetcher<T> {
    transport: T,
    scope: Scope,
    auth: Option<Auth>,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, scope: Scope, auth: Option<Auth>) -> Self {
        Self {
            transport,
            scope,
            auth,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches an HTML page
    ///
    /// Out-of-scope URLs fail with [`FetchError::OutOfScope`] without the
    /// transport being called. The same holds for every redirect hop.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let page = self.follow(url).await?;

        if !page.is_html() {
            return Err(FetchError::ContentMismatch {
                content_type: page.content_type.unwrap_or_default(),
            });
        }

        Ok(page)
    }

    /// Fetches any text resource in scope without the HTML check
    pub async fn fetch_text(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.follow(url).await
    }

    /// Requests `url` and follows redirects while they stay in scope
    async fn follow(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut current = url.clone();
        let mut seen = HashSet::new();

        for _ in 0..=MAX_REDIRECTS {
            if !self.scope.contains(&current) {
                return Err(FetchError::OutOfScope(current.to_string()));
            }
            if !seen.insert(current.clone()) {
                return Err(FetchError::Redirect(format!("Redirect loop at {}", current)));
            }

            tracing::debug!("Fetching {}", current);
            let page = self.transport.get(&current, self.auth.as_ref()).await?;

            if let Some(next) = &page.location {
                tracing::debug!("{} redirects to {}", current, next);
                current = next.clone();
                continue;
            }
            if !self.scope.contains(&page.url) {
                return Err(FetchError::OutOfScope(page.url.to_string()));
            }
            return Ok(page);
        }

        Err(FetchError::Redirect(format!(
            "More than {} redirects from {}",
            MAX_REDIRECTS, url
        )))
    }
}
