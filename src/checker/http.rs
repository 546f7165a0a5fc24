// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making HTTP requests.
//
// Key functionality:
// - Makes HTTP GET requests with browser-like headers (some hosts refuse
//   anything that looks like a bot)
// - Follows up to 10 redirects; giving up on a redirect chain still counts
//   as reachable
// - Detects failure modes (404, timeout, DNS, TLS errors, etc.)
//
// The Probe trait is the seam the worker pool talks to, so tests can swap
// in a probe that never touches the network.
// =============================================================================

use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::error::FetchError;

/// Per-probe timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_REDIRECTS: usize = 10;

// Redirect codes that count as reachable when they are where we ended up
const REDIRECT_CODES: [u16; 7] = [301, 302, 303, 304, 305, 307, 308];

// Represents the status of a link after checking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// Link is working (2xx)
    Ok,
    /// Link answered with a redirect code after we followed what we could
    Redirect(String),
    /// Link is broken (404, 410)
    Broken,
    /// Request timed out
    Timeout,
    /// SSL/TLS certificate error
    SslError,
    /// Too many redirects (we stopped following)
    TooManyRedirects,
    /// Could not resolve hostname
    DnsError,
    /// Other error
    Error,
}

// Represents the result of checking a single link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCheckResult {
    /// The URL that was checked
    pub url: String,
    /// The status of the link
    pub status: LinkStatus,
    /// Optional message with more details
    pub message: Option<String>,
}

impl LinkCheckResult {
    /// Whether the link counts as reachable.
    pub fn is_ok(&self) -> bool {
        matches!(
            self.status,
            LinkStatus::Ok | LinkStatus::Redirect(_) | LinkStatus::TooManyRedirects
        )
    }

    /// Short description for diagnostics, e.g. "HTTP 404".
    pub fn describe(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => format!("{:?}", self.status),
        }
    }
}

/// Anything that can tell whether a URL is reachable.
pub trait Probe: Send + Sync {
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, LinkCheckResult>;
}

/// Probes URLs over the network with reqwest.
#[derive(Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        // One client for every probe (connection pooling)
        let client = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .default_headers(headers)
            .build()
            .map_err(FetchError::Client)?;

        Ok(HttpProber { client })
    }
}

impl Probe for HttpProber {
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, LinkCheckResult> {
        Box::pin(check_single_link(&self.client, url))
    }
}

// Checks a single link; the body is never read
async fn check_single_link(client: &Client, url: &str) -> LinkCheckResult {
    match client.get(url).send().await {
        Ok(response) => {
            let location = response
                .headers()
                .get("location")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            analyze_status(url.to_string(), response.status(), location)
        }
        Err(e) => categorize_error(url.to_string(), e),
    }
}

// Analyzes the final HTTP status to determine link status
//
// HTTP status codes:
// - 200-299: Success
// - 301-308: Redirect we were left with, still reachable
// - 404/410: Definitely broken
// - anything else: Error
fn analyze_status(url: String, status_code: StatusCode, location: Option<String>) -> LinkCheckResult {
    let code = status_code.as_u16();

    if status_code.is_success() {
        LinkCheckResult {
            url,
            status: LinkStatus::Ok,
            message: Some(format!("HTTP {code}")),
        }
    } else if REDIRECT_CODES.contains(&code) {
        let redirect_target = location.unwrap_or_else(|| "unknown".to_string());
        LinkCheckResult {
            url,
            status: LinkStatus::Redirect(redirect_target.clone()),
            message: Some(format!("HTTP {code} -> {redirect_target}")),
        }
    } else if matches!(status_code, StatusCode::NOT_FOUND | StatusCode::GONE) {
        LinkCheckResult {
            url,
            status: LinkStatus::Broken,
            message: Some(format!("HTTP {code}")),
        }
    } else {
        LinkCheckResult {
            url,
            status: LinkStatus::Error,
            message: Some(format!("HTTP {code}")),
        }
    }
}

// Categorizes different error types from reqwest
fn categorize_error(url: String, error: reqwest::Error) -> LinkCheckResult {
    let error_string = error.to_string();

    let (status, message) = if error.is_timeout() {
        (LinkStatus::Timeout, "Request timed out".to_string())
    } else if error.is_redirect() {
        (LinkStatus::TooManyRedirects, "Too many redirects".to_string())
    } else if error.is_connect() {
        // Connection errors often mean DNS issues or host unreachable
        if error_string.contains("dns") {
            (LinkStatus::DnsError, "Could not resolve hostname".to_string())
        } else {
            (LinkStatus::Error, "Connection failed".to_string())
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        (LinkStatus::SslError, "SSL certificate error".to_string())
    } else {
        (LinkStatus::Error, error_string)
    };

    LinkCheckResult {
        url,
        status,
        message: Some(message),
    }
}
