// src/checker/candidate.rs
// =============================================================================
// URLs waiting to be probed, and where each one came from.
//
// One URL can be reached from many places: the same bare link in two
// documents, or a role and a constant that expand to the same address.
// CandidateSet folds all of those into one Candidate per URL, so the URL
// is probed once and a failure is reported once per origin.
// =============================================================================

use std::collections::BTreeMap;

use super::http::LinkCheckResult;
use crate::report::{Diagnostic, Problem};
use crate::rst::{Constant, Role};

/// How a URL was written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSource {
    /// A literal http(s) URL
    Bare,
    /// A linkable role expanded through its URL template
    Role(Role),
    /// A `{+name+}/path` constant link
    Constant(Constant),
}

/// A document that mentions a candidate URL, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub file: String,
    pub source: LinkSource,
}

impl Origin {
    pub fn new(file: &str, source: LinkSource) -> Self {
        Origin {
            file: file.to_string(),
            source,
        }
    }

    /// The diagnostic for this origin when `url` failed its probe.
    pub fn unreachable(&self, url: &str, result: &LinkCheckResult) -> Diagnostic {
        let problem = Problem::Unreachable {
            url: url.to_string(),
            response: result.describe(),
        };
        match &self.source {
            LinkSource::Bare => Diagnostic::new(&self.file, url, problem),
            LinkSource::Role(role) => Diagnostic::new(&self.file, role, problem),
            LinkSource::Constant(constant) => Diagnostic::new(&self.file, constant, problem),
        }
    }
}

/// A URL to probe along with every place it appears.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub url: String,
    pub origins: Vec<Origin>,
}

/// Candidates keyed by URL.
#[derive(Debug, Default)]
pub struct CandidateSet {
    by_url: BTreeMap<String, Vec<Origin>>,
}

impl CandidateSet {
    pub fn add(&mut self, url: &str, origin: Origin) {
        let origins = self.by_url.entry(url.to_string()).or_default();
        if !origins.contains(&origin) {
            origins.push(origin);
        }
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    pub fn into_candidates(self) -> impl Iterator<Item = Candidate> {
        self.by_url
            .into_iter()
            .map(|(url, origins)| Candidate { url, origins })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::http::LinkStatus;

    #[test]
    fn test_same_url_folds_origins() {
        let mut set = CandidateSet::default();
        set.add("https://a.bad.url", Origin::new("source/one.txt", LinkSource::Bare));
        set.add("https://a.bad.url", Origin::new("source/two.txt", LinkSource::Bare));
        set.add("https://a.bad.url", Origin::new("source/two.txt", LinkSource::Bare));

        let candidates: Vec<_> = set.into_candidates().collect();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].origins.len(), 2);
    }

    #[test]
    fn test_role_origin_names_the_role() {
        let origin = Origin::new("source/index.txt", LinkSource::Role(Role::new("rfc", "99999")));
        let result = LinkCheckResult {
            url: "https://tools.ietf.org/html/99999".to_string(),
            status: LinkStatus::Broken,
            message: Some("HTTP 404".to_string()),
        };
        let diagnostic = origin.unreachable(&result.url, &result);
        assert_eq!(diagnostic.subject, ":rfc:`99999`");
        assert_eq!(diagnostic.file, "source/index.txt");
    }
}
