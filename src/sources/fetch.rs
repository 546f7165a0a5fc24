// src/sources/fetch.rs
// =============================================================================
// This module downloads remote files: intersphinx inventories, shared
// include fragments, the role specification and the GitHub tag listing.
//
// Everything goes through the RemoteSource trait so a run can be driven by
// an in-memory source in tests. HttpFetcher is the real implementation and
// wraps one reqwest Client (connection pooling, 5 second timeout).
// =============================================================================

use futures::future::BoxFuture;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::FetchError;

/// Per-request timeout for every remote file.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Anything that can hand back the bytes behind a URL.
pub trait RemoteSource: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

/// Fetches remote files over HTTP(S).
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        // The GitHub API rejects requests without a User-Agent
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(HttpFetcher { client })
    }
}

impl RemoteSource for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(fetch_file(&self.client, url))
    }
}

// Fetches content from a URL, treating any non-2xx answer as a failure
async fn fetch_file(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    debug!(url, "fetching remote file");
    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let body = response.bytes().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })?;
    Ok(body.to_vec())
}
