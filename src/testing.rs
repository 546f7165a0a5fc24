// src/testing.rs
// =============================================================================
// In-memory stand-ins for the network, shared by the test suites.
//
// - FakeRemote: a RemoteSource serving fixed bytes per URL
// - FakeProbe: a Probe that answers from a set of "broken" URLs
// - inventory_bytes: builds an objects.inv file around some records
// =============================================================================

use flate2::write::ZlibEncoder;
use flate2::Compression;
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Mutex;

use crate::checker::{LinkCheckResult, LinkStatus, Probe};
use crate::error::FetchError;
use crate::sources::intersphinx::MARKER;
use crate::sources::RemoteSource;

#[derive(Default)]
pub struct FakeRemote {
    files: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(url.to_string(), bytes.into());
        self
    }

    pub fn requests(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl RemoteSource for FakeRemote {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        self.requests.lock().unwrap().push(url.to_string());
        let result = self.files.get(url).cloned().ok_or(FetchError::Status {
            url: url.to_string(),
            status: 404,
        });
        Box::pin(async move { result })
    }
}

#[derive(Default)]
pub struct FakeProbe {
    broken: HashSet<String>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broken(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl Probe for FakeProbe {
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, LinkCheckResult> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        let result = if self.broken.contains(url) {
            LinkCheckResult {
                url: url.to_string(),
                status: LinkStatus::Broken,
                message: Some("HTTP 404".to_string()),
            }
        } else {
            LinkCheckResult {
                url: url.to_string(),
                status: LinkStatus::Ok,
                message: Some("HTTP 200".to_string()),
            }
        };
        Box::pin(async move { result })
    }
}

/// A complete objects.inv file whose body is `records`, zlib-compressed.
pub fn inventory_bytes(records: &str) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(records.as_bytes()).unwrap();
    let body = encoder.finish().unwrap();

    let mut bytes = b"# Sphinx inventory version 2\n# Project: test\n# Version:\n".to_vec();
    bytes.extend_from_slice(MARKER);
    bytes.extend_from_slice(&body);
    bytes
}
