// src/checker/mod.rs
// =============================================================================
// This module contains all link reachability logic.
//
// Submodules:
// - candidate: URLs waiting to be probed, folded by URL with their origins
// - http: Makes HTTP requests to check if links are alive
// - rate: Token bucket shared by every worker
// - pool: Bounded queue + N workers, deduplicating submissions
// =============================================================================

mod candidate;
mod http;
mod pool;
mod rate;

pub use candidate::{CandidateSet, LinkSource, Origin};
pub use http::{HttpProber, Probe};
#[cfg(test)]
pub use http::{LinkCheckResult, LinkStatus};
pub use pool::CheckPool;
