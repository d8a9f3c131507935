//! HTTP link validator built on reqwest.
//!
//! Each link gets a lightweight `HEAD` request first. When that fails outright
//! or answers with a status of 400 or more, a single streaming `GET` follows,
//! since plenty of servers reject or mishandle `HEAD`. Only the first body
//! chunk of the `GET` is read before the transfer is dropped.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA, USER_AGENT,
};
use reqwest::{Client, Method};
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::check_outcome::CheckOutcome;
use crate::domain::entities::{ErrorKind, Link};
use crate::domain::link_validator::LinkValidator;

/// Browser-like user agent sent by default.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Settings for [`HttpLinkValidator`].
#[derive(Debug, Clone)]
pub struct HttpValidatorConfig {
    /// Upper bound for each of the two attempts.
    pub timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
    /// Treat hosts with broken certificates as reachable.
    pub accept_invalid_certs: bool,
}

impl Default for HttpValidatorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_redirects: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: true,
        }
    }
}

/// Transport-level failure of a single attempt.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Request timed out")]
    Timeout,

    #[error("SSL certificate verification failed: {0}")]
    Ssl(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("{0}")]
    Unknown(String),
}

impl ProbeError {
    /// Maps the failure onto the stored error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout => ErrorKind::Timeout,
            Self::Ssl(_) => ErrorKind::SslError,
            Self::Connection(_) => ErrorKind::ConnectionError,
            Self::TooManyRedirects => ErrorKind::TooManyRedirects,
            Self::Request(_) => ErrorKind::RequestError,
            Self::Unknown(_) => ErrorKind::UnknownError,
        }
    }

    /// Classifies a reqwest error.
    ///
    /// TLS problems surface as connect errors, so the source chain is
    /// inspected for TLS wording before the generic connect check.
    fn from_reqwest(error: reqwest::Error) -> Self {
        let error = error.without_url();

        if error.is_timeout() {
            return Self::Timeout;
        }
        if error.is_redirect() {
            return Self::TooManyRedirects;
        }

        let detail = error_chain(&error);

        if looks_like_tls_failure(&detail) {
            return Self::Ssl(detail);
        }
        if error.is_connect() {
            return Self::Connection(detail);
        }
        if error.is_builder()
            || error.is_request()
            || error.is_body()
            || error.is_decode()
            || error.is_status()
        {
            return Self::Request(detail);
        }

        Self::Unknown(detail)
    }
}

/// Joins an error with all of its sources.
fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn looks_like_tls_failure(detail: &str) -> bool {
    let detail = detail.to_lowercase();
    ["certificate", "tls", "ssl", "handshake"]
        .iter()
        .any(|needle| detail.contains(needle))
}

/// Validates links with a `HEAD` request and a `GET` fallback.
#[derive(Debug, Clone)]
pub struct HttpLinkValidator {
    client: Client,
    timeout: Duration,
}

impl HttpLinkValidator {
    /// Builds the validator and its shared connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the user agent is not a valid header value or the
    /// TLS backend cannot be initialized.
    pub fn new(config: HttpValidatorConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers(default_headers(&config.user_agent)?)
            .connect_timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    /// Runs the `HEAD` attempt and, when needed, the `GET` fallback.
    async fn probe(&self, url: &str, cancel: &CancellationToken) -> Result<u16, ProbeError> {
        let head = self.attempt(Method::HEAD, url).await;
        if let Ok(status) = &head
            && *status < 400
        {
            return head;
        }

        if cancel.is_cancelled() {
            debug!(url, "Stop requested, skipping GET fallback");
            return head;
        }

        match &head {
            Ok(status) => debug!(url, status, "HEAD rejected, retrying with GET"),
            Err(e) => debug!(url, error = %e, "HEAD failed, retrying with GET"),
        }

        self.attempt(Method::GET, url).await
    }

    /// Sends one request bounded by the attempt timeout and returns its status.
    async fn attempt(&self, method: Method, url: &str) -> Result<u16, ProbeError> {
        let deadline = tokio::time::Instant::now() + self.timeout;
        let is_get = method == Method::GET;

        let mut response =
            tokio::time::timeout_at(deadline, self.client.request(method, url).send())
                .await
                .map_err(|_| ProbeError::Timeout)?
                .map_err(ProbeError::from_reqwest)?;

        let status = response.status().as_u16();

        if is_get {
            // At most one chunk; the rest of the transfer is dropped with `response`.
            if let Ok(Err(e)) = tokio::time::timeout_at(deadline, response.chunk()).await {
                debug!(url, error = %e, "Ignoring body read error after status");
            }
        }

        Ok(status)
    }
}

fn default_headers(user_agent: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent).context("Invalid user agent")?,
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9,zh-CN;q=0.8"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(headers)
}

#[async_trait]
impl LinkValidator for HttpLinkValidator {
    async fn validate(&self, link: &Link, cancel: &CancellationToken) -> CheckOutcome {
        if !link.has_http_scheme() {
            debug!(link_id = link.id, url = %link.url, "Skipping link without HTTP scheme");
            return CheckOutcome::invalid_url(link);
        }

        let started = Instant::now();
        match self.probe(&link.url, cancel).await {
            Ok(status) => CheckOutcome::from_status(link, status, started.elapsed()),
            Err(e) => CheckOutcome::failed(link, e.kind(), e.to_string(), started.elapsed()),
        }
    }
}
