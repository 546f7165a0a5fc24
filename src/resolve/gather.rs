// src/resolve/gather.rs
// =============================================================================
// This module runs the extractors over a whole corpus.
//
// Each finding is stored once, together with the set of documents it was
// found in. A role written in ten documents is classified once and, if it
// is wrong, reported ten times, once per document.
// =============================================================================

use std::collections::{BTreeMap, BTreeSet};

use crate::config::Settings;
use crate::rst::{
    parse_constants, parse_http_links, parse_local_anchors, parse_roles, parse_shared_includes,
    Constant, HttpLink, Role, SharedInclude,
};
use crate::sources::Corpus;

/// Finding -> paths of the documents it occurs in.
#[derive(Debug, Clone)]
pub struct Occurrences<T: Ord> {
    by_item: BTreeMap<T, BTreeSet<String>>,
}

impl<T: Ord> Default for Occurrences<T> {
    fn default() -> Self {
        Occurrences {
            by_item: BTreeMap::new(),
        }
    }
}

impl<T: Ord> Occurrences<T> {
    pub fn insert(&mut self, item: T, origin: &str) {
        self.by_item.entry(item).or_default().insert(origin.to_string());
    }

    pub fn insert_all<'a>(&mut self, item: T, origins: impl IntoIterator<Item = &'a String>) {
        self.by_item.entry(item).or_default().extend(origins.into_iter().cloned());
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>, origin: &str) {
        for item in items {
            self.insert(item, origin);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, &BTreeSet<String>)> {
        self.by_item.iter()
    }

    pub fn origins(&self, item: &T) -> Option<&BTreeSet<String>> {
        self.by_item.get(item)
    }

    /// Drops origins failing `keep`, then findings left with no origin.
    pub fn retain_origins(&mut self, keep: impl Fn(&str) -> bool) {
        for origins in self.by_item.values_mut() {
            origins.retain(|o| keep(o));
        }
        self.by_item.retain(|_, origins| !origins.is_empty());
    }

    pub fn len(&self) -> usize {
        self.by_item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_item.is_empty()
    }
}

/// Everything extracted from a corpus.
#[derive(Debug, Default)]
pub struct Findings {
    pub roles: Occurrences<Role>,
    pub constants: Occurrences<Constant>,
    pub links: Occurrences<HttpLink>,
    pub shared_includes: Occurrences<SharedInclude>,
    /// Anchor names declared anywhere in the corpus
    pub anchors: BTreeSet<String>,
}

impl Findings {
    pub fn gather(corpus: &Corpus) -> Self {
        let mut findings = Findings::default();

        for doc in corpus.documents() {
            let text = doc.content.as_str();
            findings.roles.extend(parse_roles(text), &doc.path);
            findings.constants.extend(parse_constants(text), &doc.path);
            findings.links.extend(parse_http_links(text), &doc.path);
            findings
                .shared_includes
                .extend(parse_shared_includes(text), &doc.path);
            findings
                .anchors
                .extend(parse_local_anchors(text).into_iter().map(|a| a.name));
        }

        findings
    }

    /// Narrows roles, constants and links to the changed documents.
    ///
    /// Anchors stay untouched: a changed document may point at an anchor
    /// declared in one that did not change.
    pub fn select(&mut self, settings: &Settings) {
        if settings.changed.is_empty() {
            return;
        }
        let keep = |path: &str| settings.is_selected(path);
        self.roles.retain_origins(keep);
        self.constants.retain_origins(keep);
        self.links.retain_origins(keep);
    }
}
