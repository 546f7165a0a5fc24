// src/error.rs
// =============================================================================
// Typed errors for the parts of a run that can fail as a whole.
//
// Per-reference and per-link problems are never errors: they become
// diagnostics in the report. Only what stops a run lives here.
// =============================================================================

use std::path::PathBuf;

/// Problems with the project configuration or the bypass list.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid project config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid bypass list {}: {source}", path.display())]
    BypassList {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A constant expands back into itself, e.g. `a = "{+b+}"`, `b = "{+a+}"`.
    #[error("constant cycle: {}", chain.join(" -> "))]
    ConstantCycle { chain: Vec<String> },

    #[error("{0} is missing from the project root")]
    MissingProjectFile(PathBuf),
}

/// Failures fetching a remote file.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Failures loading the role specification.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("role specification is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("role specification is not UTF-8")]
    Encoding,

    #[error("could not determine the latest role specification release: {0}")]
    LatestTag(String),
}
