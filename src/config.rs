// src/config.rs
// =============================================================================
// This module loads everything a run is configured with:
//
// - ProjectConfig: the project's snooty.toml (name, constants, intersphinx
//   inventories, shared include root)
// - BypassList: URL substrings that are never checked
// - Settings: knobs for a single run (workers, rate, which checks run)
//
// Constants may reference each other with {+name+} placeholders. They are
// expanded once, at load time, so the rest of the program only ever sees
// final values. A cycle is a configuration error.
// =============================================================================

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, error, warn};

use crate::error::ConfigError;

/// Project configuration file name, expected at the project root.
pub const PROJECT_FILE: &str = "snooty.toml";

/// Where the bypass list lives unless the CLI says otherwise.
pub const DEFAULT_BYPASS_FILE: &str = "config/link_checker_bypass_list.json";

// Depth past which constant expansion gets noisy in the logs
const WARN_DEPTH: usize = 4;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\+([\w.\-]+)\+\}").expect("placeholder pattern"));

/// The parts of snooty.toml the checker cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub constants: BTreeMap<String, String>,
    /// URLs of objects.inv files of other documentation sets
    #[serde(default)]
    pub intersphinx: Vec<String>,
    /// Base URL that `.. sharedinclude::` paths are relative to
    #[serde(default)]
    pub sharedinclude_root: Option<String>,
}

impl ProjectConfig {
    /// Parses snooty.toml text and expands every constant.
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let mut config: ProjectConfig = toml::from_str(input)?;
        config.constants = resolve_constants(&config.constants)?;
        Ok(config)
    }

    /// Reads `<root>/snooty.toml`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(PROJECT_FILE);
        let input = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&input)
    }

    pub fn constant(&self, name: &str) -> Option<&str> {
        self.constants.get(name).map(String::as_str)
    }
}

/// Expands `{+name+}` placeholders in every constant until none remain.
///
/// `{a: "{+b+}", b: "X"}` resolves `a` to `"X"`. A placeholder naming an
/// unknown constant is logged and replaced with nothing. A cycle fails with
/// [`ConfigError::ConstantCycle`].
pub fn resolve_constants(
    raw: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut resolved = BTreeMap::new();
    for name in raw.keys() {
        let mut stack = Vec::new();
        expand_constant(name, raw, &mut resolved, &mut stack)?;
    }
    Ok(resolved)
}

fn expand_constant(
    name: &str,
    raw: &BTreeMap<String, String>,
    resolved: &mut BTreeMap<String, String>,
    stack: &mut Vec<String>,
) -> Result<String, ConfigError> {
    if let Some(done) = resolved.get(name) {
        return Ok(done.clone());
    }

    if let Some(start) = stack.iter().position(|n| n == name) {
        let mut chain = stack[start..].to_vec();
        chain.push(name.to_string());
        return Err(ConfigError::ConstantCycle { chain });
    }

    if stack.len() > WARN_DEPTH {
        warn!(
            constant = name,
            depth = stack.len(),
            "constant interpolation is nesting unusually deep"
        );
    }

    let Some(value) = raw.get(name) else {
        error!(constant = name, "could not find constant");
        return Ok(String::new());
    };

    stack.push(name.to_string());
    let expanded = substitute_with(value, |inner| expand_constant(inner, raw, resolved, stack))?;
    stack.pop();

    resolved.insert(name.to_string(), expanded.clone());
    Ok(expanded)
}

/// Replaces every `{+name+}` in `text` with whatever `lookup` returns.
pub fn substitute_with<E>(
    text: &str,
    mut lookup: impl FnMut(&str) -> Result<String, E>,
) -> Result<String, E> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        out.push_str(&lookup(name.as_str())?);
        last = whole.end();
    }

    out.push_str(&text[last..]);
    Ok(out)
}

/// Whether `text` still contains a `{+name+}` placeholder.
pub fn has_placeholder(text: &str) -> bool {
    PLACEHOLDER.is_match(text)
}

/// One entry of the bypass list JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BypassEntry {
    pub exclude: String,
    #[serde(default)]
    pub reason: String,
}

/// URL substrings that must never be checked or reported.
#[derive(Debug, Clone, Default)]
pub struct BypassList {
    entries: Vec<BypassEntry>,
}

impl BypassList {
    pub fn new(entries: Vec<BypassEntry>) -> Self {
        // An empty exclude would match every URL
        let entries = entries.into_iter().filter(|e| !e.exclude.is_empty()).collect();
        BypassList { entries }
    }

    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<BypassEntry> = serde_json::from_str(input)?;
        Ok(Self::new(entries))
    }

    /// Loads the list from disk. A missing file is an empty list.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = match std::fs::read_to_string(path) {
            Ok(input) => input,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no bypass list found");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::from_json(&input).map_err(|source| ConfigError::BypassList {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns the first entry whose `exclude` appears in `url`.
    pub fn find(&self, url: &str) -> Option<&BypassEntry> {
        self.entries.iter().find(|e| url.contains(&e.exclude))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Number of link-checking workers
    pub workers: usize,
    /// Aggregate probe budget across all workers
    pub requests_per_second: u32,
    pub check_refs: bool,
    pub check_docs: bool,
    /// When non-empty, only findings from documents matching one of these
    pub changed: Vec<String>,
    /// Log each diagnostic as it is produced
    pub echo: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            workers: 100,
            requests_per_second: 100,
            check_refs: true,
            check_docs: true,
            changed: Vec::new(),
            echo: false,
        }
    }
}

impl Settings {
    /// Whether findings from `path` should be evaluated this run.
    pub fn is_selected(&self, path: &str) -> bool {
        self.changed.is_empty() || self.changed.iter().any(|c| path.contains(c.as_str()))
    }
}
