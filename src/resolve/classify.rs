// src/resolve/classify.rs
// =============================================================================
// This module decides what each role is and whether it holds up.
//
// Keyed on the role name:
//   ref, py:meth, py:class -> must name an inventory symbol or an anchor
//   doc                    -> must name a document of the corpus
//   linkable role          -> becomes a URL for the reachability checker
//   raw role / object type -> fine as written
//   anything else          -> unknown role
//
// Constants and bare links never need classifying; they are turned into
// candidates (or diagnostics) here as well so the checker gets one set.
// =============================================================================

use tracing::debug;

use super::gather::Occurrences;
use super::merge::ReferenceIndex;
use crate::checker::{CandidateSet, LinkSource, Origin};
use crate::config::{ProjectConfig, Settings};
use crate::report::{Diagnostic, DiagnosticsSink, Problem};
use crate::rst::{is_http_link, Constant, HttpLink, Role};
use crate::sources::rstspec::{interpolate, RoleSpec};

/// Outcome for one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// Resolves to this URL, which still has to be probed
    Link(String),
    Invalid(Problem),
    /// The check for this role is turned off
    Skipped,
}

pub struct Classifier<'a> {
    index: &'a ReferenceIndex,
    spec: &'a RoleSpec,
    check_refs: bool,
    check_docs: bool,
}

impl<'a> Classifier<'a> {
    pub fn new(index: &'a ReferenceIndex, spec: &'a RoleSpec, settings: &Settings) -> Self {
        Classifier {
            index,
            spec,
            check_refs: settings.check_refs,
            check_docs: settings.check_docs,
        }
    }

    pub fn classify(&self, role: &Role) -> Verdict {
        match role.name.as_str() {
            "ref" | "py:meth" | "py:class" => {
                if !self.check_refs {
                    Verdict::Skipped
                } else if self.index.is_valid_ref(&role.target) {
                    Verdict::Valid
                } else {
                    Verdict::Invalid(Problem::InvalidRef)
                }
            }
            "doc" => {
                if !self.check_docs {
                    Verdict::Skipped
                } else if self.index.is_valid_doc(&role.target) {
                    Verdict::Valid
                } else {
                    Verdict::Invalid(Problem::InvalidDoc)
                }
            }
            name => {
                if let Some(template) = self.spec.link_template(name) {
                    Verdict::Link(interpolate(template, &role.target))
                } else if self.spec.is_raw_role(name) || self.spec.is_object(name) {
                    Verdict::Valid
                } else {
                    Verdict::Invalid(Problem::UnknownRole)
                }
            }
        }
    }

    /// Classifies every role, reporting failures and queueing linkable ones.
    pub fn classify_all(
        &self,
        roles: &Occurrences<Role>,
        sink: &DiagnosticsSink,
        candidates: &mut CandidateSet,
    ) {
        let mut invalid = 0;
        for (role, origins) in roles.iter() {
            match self.classify(role) {
                Verdict::Invalid(problem) => {
                    invalid += 1;
                    for origin in origins {
                        sink.report(Diagnostic::new(origin, role, problem.clone()));
                    }
                }
                Verdict::Link(url) => {
                    for origin in origins {
                        candidates.add(&url, Origin::new(origin, LinkSource::Role(role.clone())));
                    }
                }
                Verdict::Valid | Verdict::Skipped => {}
            }
        }
        debug!(roles = roles.len(), invalid, "classified roles");
    }
}

/// Expands constant links; undefined names are reported.
pub fn check_constants(
    constants: &Occurrences<Constant>,
    config: &ProjectConfig,
    sink: &DiagnosticsSink,
    candidates: &mut CandidateSet,
) {
    for (constant, origins) in constants.iter() {
        let Some(value) = config.constant(&constant.name) else {
            for origin in origins {
                sink.report(Diagnostic::new(
                    origin,
                    constant,
                    Problem::UndefinedConstant {
                        constant: constant.name.clone(),
                    },
                ));
            }
            continue;
        };

        let url = constant.expand(value);
        if !is_http_link(&url) {
            continue;
        }
        for origin in origins {
            candidates.add(&url, Origin::new(origin, LinkSource::Constant(constant.clone())));
        }
    }
}

pub fn add_links(links: &Occurrences<HttpLink>, candidates: &mut CandidateSet) {
    for (link, origins) in links.iter() {
        for origin in origins {
            candidates.add(link.as_str(), Origin::new(origin, LinkSource::Bare));
        }
    }
}
