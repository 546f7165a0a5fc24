// src/checker/pool.rs
// =============================================================================
// This module runs link checks on a fixed pool of workers.
//
// How it works:
// 1. submit() checks-and-inserts the URL into the "already submitted" set;
//    a URL seen before is dropped right there
// 2. The check is packed into a job (a closure over its candidate) and sent
//    into a bounded queue; submit() waits when the queue is full
// 3. N workers share the queue receiver. Before each job a worker takes a
//    token from the shared RateLimiter
// 4. finish() closes the queue and joins every worker
//
// A failed probe sends one diagnostic per origin of the candidate.
// =============================================================================

use futures::future::BoxFuture;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinSet;
use tracing::{debug, error, trace, warn};

use super::candidate::Candidate;
use super::http::Probe;
use super::rate::RateLimiter;
use crate::report::DiagnosticsSink;

/// A unit of work: no arguments, everything it needs is captured.
pub type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

// Completed checks between two progress lines
const PROGRESS_EVERY: usize = 100;

/// Counts for one pool's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub submitted: usize,
    pub completed: usize,
}

pub struct CheckPool {
    tx: mpsc::Sender<Job>,
    workers: JoinSet<()>,
    submitted: Arc<Mutex<HashSet<String>>>,
    completed: Arc<AtomicUsize>,
    prober: Arc<dyn Probe>,
    sink: DiagnosticsSink,
}

impl CheckPool {
    /// Spawns `workers` workers sharing a budget of `requests_per_second`.
    pub fn start(
        workers: usize,
        requests_per_second: u32,
        prober: Arc<dyn Probe>,
        sink: DiagnosticsSink,
    ) -> Self {
        let workers_count = workers.max(1);
        let (tx, rx) = mpsc::channel::<Job>(workers_count * 2);
        let rx = Arc::new(AsyncMutex::new(rx));
        let limiter = Arc::new(RateLimiter::per_second(requests_per_second));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut set = JoinSet::new();
        for id in 0..workers_count {
            set.spawn(worker(id, rx.clone(), limiter.clone(), completed.clone()));
        }
        debug!(workers = workers_count, requests_per_second, "started link check pool");

        CheckPool {
            tx,
            workers: set,
            submitted: Arc::new(Mutex::new(HashSet::new())),
            completed,
            prober,
            sink,
        }
    }

    /// Queues a candidate unless its URL was submitted before.
    ///
    /// Returns whether a job was queued.
    pub async fn submit(&self, candidate: Candidate) -> bool {
        if !self.mark_submitted(&candidate.url) {
            trace!(url = candidate.url.as_str(), "already submitted");
            return false;
        }

        let prober = self.prober.clone();
        let sink = self.sink.clone();
        let job: Job = Box::new(move || {
            Box::pin(async move { check_candidate(prober.as_ref(), &sink, candidate).await })
        });

        if self.tx.send(job).await.is_err() {
            warn!("link check queue closed before all jobs were queued");
            return false;
        }
        true
    }

    // Check-and-insert under one lock
    fn mark_submitted(&self, url: &str) -> bool {
        let mut seen = match self.submitted.lock() {
            Ok(seen) => seen,
            Err(poisoned) => poisoned.into_inner(),
        };
        seen.insert(url.to_string())
    }

    /// Closes the queue and waits for every queued job to finish.
    pub async fn finish(self) -> PoolStats {
        let CheckPool {
            tx,
            mut workers,
            submitted,
            completed,
            ..
        } = self;
        drop(tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "link check worker failed");
            }
        }

        let submitted = match submitted.lock() {
            Ok(seen) => seen.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        };
        PoolStats {
            submitted,
            completed: completed.load(Ordering::Relaxed),
        }
    }
}

async fn worker(
    id: usize,
    rx: Arc<AsyncMutex<mpsc::Receiver<Job>>>,
    limiter: Arc<RateLimiter>,
    completed: Arc<AtomicUsize>,
) {
    loop {
        // Only hold the receiver while waiting for the next job
        let job = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(job) = job else { break };

        limiter.acquire().await;
        job().await;

        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(worker = id, done, "link check finished");
        if done % PROGRESS_EVERY == 0 {
            debug!(done, "link checks completed");
        }
    }
}

async fn check_candidate(prober: &dyn Probe, sink: &DiagnosticsSink, candidate: Candidate) {
    let result = prober.probe(&candidate.url).await;
    if result.is_ok() {
        debug!(url = result.url.as_str(), response = %result.describe(), "link ok");
        return;
    }

    for origin in &candidate.origins {
        sink.report(origin.unreachable(&candidate.url, &result));
    }
}
