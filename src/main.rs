// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Load the project: snooty.toml, the documents, the bypass list
// 3. Work out where the role spec lives and run the pipeline
// 4. Print the report
// 5. Exit with proper code (0 = clean, 1 = problems found, 2 = error)
// =============================================================================

mod checker;
mod cli;
mod config;
mod error;
mod pipeline;
mod report;
mod resolve;
mod rst;
mod sources;
#[cfg(test)]
mod testing;

use anyhow::{Context as _, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use checker::HttpProber;
use cli::Cli;
use config::{BypassList, ProjectConfig, Settings};
use pipeline::Context;
use report::Report;
use sources::{rstspec, Corpus, HttpFetcher};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins; otherwise -v raises the level step by step
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let config = ProjectConfig::load(&cli.path)
        .with_context(|| format!("loading project config from {}", cli.path.display()))?;
    let corpus = Corpus::load(&cli.path).context("reading project documents")?;
    let bypass = BypassList::load(&cli.bypass_path()).context("loading bypass list")?;
    info!(
        project = config.name.as_str(),
        title = config.title.as_str(),
        documents = corpus.len(),
        bypassed = bypass.len(),
        "loaded project"
    );
    if corpus.is_empty() {
        warn!(root = %cli.path.display(), "no documents found");
    }

    let remote = Arc::new(HttpFetcher::new()?);
    let spec_url = match cli.rstspec.clone() {
        Some(url) => url,
        None => rstspec::latest_spec_url(remote.as_ref())
            .await
            .context("locating the role specification")?,
    };

    let ctx = Context {
        config,
        bypass,
        settings: Settings {
            workers: cli.workers,
            requests_per_second: cli.rate,
            check_refs: !cli.no_refs,
            check_docs: !cli.no_docs,
            changed: cli.changes.clone(),
            echo: cli.verbose > 0,
        },
        spec_url,
    };

    let prober = Arc::new(HttpProber::new()?);
    let report = pipeline::run(&ctx, &corpus, remote, prober).await?;

    print_report(&report, cli.json)?;
    Ok(report.exit_code())
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for diagnostic in report.diagnostics() {
        println!("{diagnostic}");
    }
    if report.is_success() {
        println!("No problems found");
    } else {
        println!("Found {} problem(s)", report.count());
    }
    Ok(())
}
