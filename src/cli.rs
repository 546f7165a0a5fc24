// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// A run always targets one project directory (snooty.toml + source/).
// Everything else is a knob with a sensible default, so
// `rst-link-checker --path docs-golang` checks the whole project.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_BYPASS_FILE;

#[derive(Parser, Debug)]
#[command(
    name = "rst-link-checker",
    version,
    about = "Check refs, roles and links in a reStructuredText docs project",
    long_about = "rst-link-checker resolves every :ref:, :doc: and role of a snooty docs project \
                  against its anchors, intersphinx inventories and the published role spec, \
                  then probes every link it finds. It exits 1 when anything is broken, \
                  so it drops straight into CI."
)]
pub struct Cli {
    /// Project root holding snooty.toml and source/
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Skip checking :ref: (and py:meth / py:class) targets
    #[arg(long)]
    pub no_refs: bool,

    /// Skip checking :doc: targets
    #[arg(long)]
    pub no_docs: bool,

    /// Number of concurrent link-checking workers
    #[arg(long, default_value_t = 100)]
    pub workers: usize,

    /// Maximum requests per second across all workers
    #[arg(long, default_value_t = 100)]
    pub rate: u32,

    /// Only check documents whose path contains one of these (comma separated)
    ///
    /// Example: --changes source/fundamentals/crud.txt,source/index.txt
    #[arg(long, value_delimiter = ',')]
    pub changes: Vec<String>,

    /// Bypass list JSON, relative to the project root unless absolute
    #[arg(long, default_value = DEFAULT_BYPASS_FILE)]
    pub bypass: PathBuf,

    /// Role specification URL (defaults to the latest snooty-parser release)
    #[arg(long)]
    pub rstspec: Option<String>,

    /// Output results in JSON format instead of text
    #[arg(long)]
    pub json: bool,

    /// More logging; -v also prints each problem as it is found
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The bypass list location with the project root applied.
    pub fn bypass_path(&self) -> PathBuf {
        if self.bypass.is_absolute() {
            self.bypass.clone()
        } else {
            self.path.join(&self.bypass)
        }
    }
}
