// src/rst/mod.rs
// =============================================================================
// This module holds the typed findings we pull out of reStructuredText
// source: roles, local anchors, constants, bare links and shared includes.
//
// Submodules:
// - parse: Regex-driven extractors that turn raw text into findings
//
// Every finding type derives Hash + Eq + Ord so it can be used as a map key.
// The same role written in two documents is one finding with two origins.
// =============================================================================

mod parse;

use std::fmt;

pub use parse::{
    is_http_link, parse_constants, parse_http_links, parse_local_anchors, parse_roles,
    parse_shared_includes,
};

/// Whether a role is the special `:ref:` role or any other named role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoleKind {
    Ref,
    Role,
}

/// One `:name:`content`` occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Role {
    pub target: String,
    pub kind: RoleKind,
    pub name: String,
}

impl Role {
    pub fn new(name: &str, target: &str) -> Self {
        // :ref: is the only role that gets its own kind
        let kind = if name == "ref" {
            RoleKind::Ref
        } else {
            RoleKind::Role
        };
        Role {
            target: target.to_string(),
            kind,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}:`{}`", self.name, self.target)
    }
}

/// A `.. _name:` anchor declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalAnchor {
    pub name: String,
}

/// A `<{+name+}/path>`` link built on a project constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Constant {
    pub name: String,
    pub target: String,
}

impl Constant {
    /// Builds the full link by prefixing the constant's configured value.
    pub fn expand(&self, value: &str) -> String {
        format!("{}{}", value, self.target)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{+{}+}}{}", self.name, self.target)
    }
}

/// A URL found in the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HttpLink(pub String);

impl HttpLink {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HttpLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `.. sharedinclude:: path` directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SharedInclude {
    pub path: String,
}
