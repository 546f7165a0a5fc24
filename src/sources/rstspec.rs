// src/sources/rstspec.rs
// =============================================================================
// This module loads the role specification (rstspec.toml) published with
// each snooty-parser release and turns it into three lookups:
//
// - links:   roles that expand to a URL, e.g. rfc -> https://tools.ietf.org/html/%s
// - raw:     every role name the spec knows about
// - objects: object types (`[rstobject."mongodb:setting"]` -> `setting`)
//
// The TOML is decoded into a generic tree first and each role entry is
// classified by its shape, rather than poking at untyped values later.
// =============================================================================

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use toml::{Table, Value};
use tracing::{debug, info};

use super::fetch::RemoteSource;
use crate::error::SpecError;

/// GitHub API listing of snooty-parser tags, newest first.
pub const TAGS_URL: &str = "https://api.github.com/repos/mongodb/snooty-parser/tags";

const SPEC_BASE: &str = "https://raw.githubusercontent.com/mongodb/snooty-parser/";

/// What a `[role.<name>]` entry turns out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RoleShape {
    /// `type = {link = "https://.../%s"}`
    Link(String),
    /// Any other `type`, or none at all
    Plain,
}

fn role_shape(entry: &Value) -> RoleShape {
    match entry.get("type") {
        Some(Value::Table(kind)) => match kind.get("link") {
            Some(Value::String(template)) => RoleShape::Link(template.clone()),
            _ => RoleShape::Plain,
        },
        _ => RoleShape::Plain,
    }
}

/// Every role and object type the markup may use.
#[derive(Debug, Clone, Default)]
pub struct RoleSpec {
    links: HashMap<String, String>,
    raw: HashSet<String>,
    objects: HashSet<String>,
}

impl RoleSpec {
    pub fn from_toml(input: &str) -> Result<Self, SpecError> {
        let tree: Table = input.parse()?;
        let mut spec = RoleSpec::default();

        if let Some(Value::Table(roles)) = tree.get("role") {
            for (name, entry) in roles {
                spec.raw.insert(name.clone());
                if let RoleShape::Link(template) = role_shape(entry) {
                    spec.links.insert(name.clone(), template);
                }
            }
        }

        if let Some(Value::Table(objects)) = tree.get("rstobject") {
            for key in objects.keys() {
                let name = key.split_once(':').map_or(key.as_str(), |(_, name)| name);
                spec.objects.insert(name.to_string());
            }
        }

        debug!(
            links = spec.links.len(),
            roles = spec.raw.len(),
            objects = spec.objects.len(),
            "loaded role specification"
        );
        Ok(spec)
    }

    /// URL template of a linkable role.
    pub fn link_template(&self, name: &str) -> Option<&str> {
        self.links.get(name).map(String::as_str)
    }

    pub fn is_raw_role(&self, name: &str) -> bool {
        self.raw.contains(name)
    }

    pub fn is_object(&self, name: &str) -> bool {
        self.objects.contains(name)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

/// Puts `target` where the template's `%s` is, or on the end if it has none.
pub fn interpolate(template: &str, target: &str) -> String {
    if template.contains("%s") {
        template.replacen("%s", target, 1)
    } else {
        format!("{template}{target}")
    }
}

/// Downloads and decodes the role specification.
pub async fn load(remote: &dyn RemoteSource, url: &str) -> Result<RoleSpec, SpecError> {
    info!(url, "loading role specification");
    let bytes = remote.fetch(url).await?;
    let text = String::from_utf8(bytes).map_err(|_| SpecError::Encoding)?;
    RoleSpec::from_toml(&text)
}

#[derive(Deserialize)]
struct Tag {
    name: String,
}

/// Location of rstspec.toml for the newest snooty-parser tag.
pub async fn latest_spec_url(remote: &dyn RemoteSource) -> Result<String, SpecError> {
    let bytes = remote.fetch(TAGS_URL).await?;
    let tags: Vec<Tag> =
        serde_json::from_slice(&bytes).map_err(|e| SpecError::LatestTag(e.to_string()))?;

    let latest = tags
        .first()
        .ok_or_else(|| SpecError::LatestTag("no tags published".to_string()))?;
    Ok(format!("{SPEC_BASE}{}/snooty/rstspec.toml", latest.name))
}
