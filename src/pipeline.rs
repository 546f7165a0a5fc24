// src/pipeline.rs
// =============================================================================
// This module runs one complete check of a corpus.
//
// Stages, each finishing before the next starts:
// 1. Setup: role spec and every intersphinx inventory, fetched concurrently
// 2. Gather: extract findings from every document, then shared includes
// 3. Resolve: substitute constants, build the reference index, classify
// 4. Check: drop bypassed URLs, probe the rest on the worker pool
// 5. Report: wait for the diagnostics collector and hand back the Report
// =============================================================================

use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::checker::{CandidateSet, CheckPool, Probe};
use crate::config::{BypassList, ProjectConfig, Settings};
use crate::error::SpecError;
use crate::report::{Collector, Report};
use crate::resolve::{
    add_links, check_constants, load_shared, merge_shared, resolve_anchors, substitute_roles,
    Classifier, Findings, ReferenceIndex,
};
use crate::sources::intersphinx::{inventory_domain, parse_inventory};
use crate::sources::{rstspec, Corpus, Inventory, InventoryIndex, RemoteSource};

/// Everything a run is configured with.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: ProjectConfig,
    pub bypass: BypassList,
    pub settings: Settings,
    /// Where to load rstspec.toml from
    pub spec_url: String,
}

pub async fn run(
    ctx: &Context,
    corpus: &Corpus,
    remote: Arc<dyn RemoteSource>,
    prober: Arc<dyn Probe>,
) -> Result<Report, SpecError> {
    // Stage 1
    let (spec, inventory) = tokio::join!(
        rstspec::load(remote.as_ref(), &ctx.spec_url),
        load_inventories(remote.clone(), &ctx.config.intersphinx),
    );
    let spec = spec?;

    // Stage 2
    let mut findings = Findings::gather(corpus);
    if let Some(root) = ctx.config.sharedinclude_root.as_deref() {
        let paths: Vec<String> = findings
            .shared_includes
            .iter()
            .map(|(include, _)| include.path.clone())
            .collect();
        let shared = load_shared(remote.as_ref(), root, paths).await;
        merge_shared(&mut findings, &shared);
    } else if !findings.shared_includes.is_empty() {
        warn!("documents use sharedinclude but the project has no sharedinclude_root");
    }
    findings.select(&ctx.settings);

    // Stage 3
    let collector = Collector::start(ctx.settings.echo);
    let sink = collector.sink();

    let roles = substitute_roles(&findings.roles, &ctx.config, &sink);
    let index = ReferenceIndex {
        inventory,
        anchors: resolve_anchors(&findings.anchors, &ctx.config),
        documents: corpus.paths(),
    };
    info!(
        documents = corpus.len(),
        roles = roles.len(),
        anchors = index.anchors.len(),
        inventory = index.inventory.len(),
        link_roles = spec.link_count(),
        "resolving references"
    );

    let mut candidates = CandidateSet::default();
    Classifier::new(&index, &spec, &ctx.settings).classify_all(&roles, &sink, &mut candidates);
    check_constants(&findings.constants, &ctx.config, &sink, &mut candidates);
    add_links(&findings.links, &mut candidates);

    // Stage 4
    info!(urls = candidates.len(), "checking links");
    let pool = CheckPool::start(
        ctx.settings.workers,
        ctx.settings.requests_per_second,
        prober,
        sink,
    );
    let mut queued = 0;
    for candidate in candidates.into_candidates() {
        if let Some(entry) = ctx.bypass.find(&candidate.url) {
            info!(
                url = candidate.url.as_str(),
                reason = entry.reason.as_str(),
                "skipping bypassed link"
            );
            continue;
        }
        if pool.submit(candidate).await {
            queued += 1;
        }
    }
    debug!(queued, "all links queued");

    let stats = pool.finish().await;
    debug!(submitted = stats.submitted, completed = stats.completed, "link checks done");

    // Stage 5
    Ok(collector.finish().await)
}

// One task per inventory; a failed one only costs its own domain
async fn load_inventories(remote: Arc<dyn RemoteSource>, urls: &[String]) -> InventoryIndex {
    let mut tasks: JoinSet<Option<(String, Inventory)>> = JoinSet::new();
    for url in urls {
        let remote = remote.clone();
        let url = url.clone();
        tasks.spawn(async move {
            let domain = inventory_domain(&url).to_string();
            match remote.fetch(&url).await {
                Ok(bytes) => parse_inventory(&bytes, &domain).map(|inventory| (domain, inventory)),
                Err(e) => {
                    warn!(url = url.as_str(), error = %e, "could not fetch inventory");
                    None
                }
            }
        });
    }

    let mut inventories = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(inventory)) => inventories.push(inventory),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "inventory task failed"),
        }
    }

    let index = InventoryIndex::join(inventories);
    for (domain, inventory) in index.domains() {
        debug!(domain, symbols = inventory.len(), "loaded inventory");
    }
    index
}
