// src/resolve/merge.rs
// =============================================================================
// This module builds the namespaces roles are resolved against.
//
// - AnchorSet: local anchors plus anchors from shared includes, constants
//   substituted, with a tls spelling added for every ssl anchor
// - ReferenceIndex: the anchor set, the joined intersphinx inventories and
//   the corpus paths, read-only once built
// - substitute_roles: swaps {+name+} placeholders in role targets for the
//   project's constant values
// - load_shared: fetches each shared include once
// =============================================================================

use futures::future::join_all;
use std::collections::{BTreeSet, HashSet};
use std::convert::Infallible;
use tracing::{debug, trace, warn};
use url::Url;

use super::gather::{Findings, Occurrences};
use crate::config::{has_placeholder, substitute_with, ProjectConfig};
use crate::report::{Diagnostic, DiagnosticsSink, Problem};
use crate::rst::{parse_local_anchors, parse_roles, Role, SharedInclude};
use crate::sources::{InventoryIndex, RemoteSource};

/// Every anchor name a `:ref:` may point at.
#[derive(Debug, Clone, Default)]
pub struct AnchorSet {
    names: HashSet<String>,
}

impl AnchorSet {
    /// Adds `foo-tls-bar` for every `foo-ssl-bar`. Only the first `ssl` is
    /// replaced and the original stays.
    pub fn with_tls_synonyms(mut self) -> Self {
        let synonyms: Vec<String> = self
            .names
            .iter()
            .filter(|name| name.contains("ssl"))
            .map(|name| name.replacen("ssl", "tls", 1))
            .collect();
        self.names.extend(synonyms);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

impl FromIterator<String> for AnchorSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        AnchorSet {
            names: iter.into_iter().collect(),
        }
    }
}

/// What roles are checked against.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    pub inventory: InventoryIndex,
    pub anchors: AnchorSet,
    /// Corpus paths, for `:doc:`
    pub documents: Vec<String>,
}

impl ReferenceIndex {
    /// Inventory first, then anchors.
    pub fn is_valid_ref(&self, target: &str) -> bool {
        if let Some(entry) = self.inventory.get(target) {
            trace!(
                key = target,
                url = entry.target.as_str(),
                kind = entry.kind.as_str(),
                "ref found in inventory"
            );
            return true;
        }
        self.anchors.contains(target)
    }

    pub fn is_valid_doc(&self, target: &str) -> bool {
        let target = target.trim_end_matches('/');
        if target.is_empty() {
            return false;
        }
        self.documents.iter().any(|path| path.contains(target))
    }
}

/// Resolves constants in every role target.
///
/// A role naming a constant the project does not define is reported once per
/// origin and left out of the result.
pub fn substitute_roles(
    roles: &Occurrences<Role>,
    config: &ProjectConfig,
    sink: &DiagnosticsSink,
) -> Occurrences<Role> {
    let mut resolved = Occurrences::default();

    for (role, origins) in roles.iter() {
        if !has_placeholder(&role.target) {
            resolved.insert_all(role.clone(), origins);
            continue;
        }

        let target = substitute_with(&role.target, |name| {
            config.constant(name).map(str::to_string).ok_or_else(|| name.to_string())
        });
        match target {
            Ok(target) => resolved.insert_all(Role::new(&role.name, &target), origins),
            Err(missing) => {
                for origin in origins {
                    sink.report(Diagnostic::new(
                        origin,
                        role,
                        Problem::UndefinedConstant {
                            constant: missing.clone(),
                        },
                    ));
                }
            }
        }
    }

    resolved
}

/// The anchor set roles are resolved against.
pub fn resolve_anchors(names: &BTreeSet<String>, config: &ProjectConfig) -> AnchorSet {
    let anchors: AnchorSet = names
        .iter()
        .map(|name| substitute_known(name, config))
        .collect();
    anchors.with_tls_synonyms()
}

/// Substitutes known constants, leaving unknown placeholders as written.
pub fn substitute_known(text: &str, config: &ProjectConfig) -> String {
    substitute_with(text, |name| {
        Ok::<_, Infallible>(
            config
                .constant(name)
                .map_or_else(|| format!("{{+{name}+}}"), str::to_string),
        )
    })
    .unwrap_or_else(|never| match never {})
}

/// Where a shared include path lives.
pub fn shared_url(root: &str, path: &str) -> Result<Url, url::ParseError> {
    let root = if root.ends_with('/') {
        Url::parse(root)?
    } else {
        Url::parse(&format!("{root}/"))?
    };
    root.join(path.trim_start_matches('/'))
}

/// Fetches every distinct shared include, concurrently.
///
/// Returns (include path, text) for the ones that could be fetched.
pub async fn load_shared(
    remote: &dyn RemoteSource,
    root: &str,
    paths: impl IntoIterator<Item = String>,
) -> Vec<(String, String)> {
    let fetches = paths.into_iter().map(|path| async move {
        let url = match shared_url(root, &path) {
            Ok(url) => url,
            Err(e) => {
                warn!(path = path.as_str(), error = %e, "invalid shared include path");
                return None;
            }
        };
        match remote.fetch(url.as_str()).await {
            Ok(bytes) => Some((path, String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) => {
                warn!(path = path.as_str(), error = %e, "could not fetch shared include");
                None
            }
        }
    });

    join_all(fetches).await.into_iter().flatten().collect()
}

/// Folds fetched shared content into the findings.
///
/// Roles count as written in every document including the fragment;
/// anchors join the corpus-wide anchor set.
pub fn merge_shared(findings: &mut Findings, shared: &[(String, String)]) {
    for (path, text) in shared {
        let include = SharedInclude { path: path.clone() };
        let includers: Vec<String> = findings
            .shared_includes
            .origins(&include)
            .map(|origins| origins.iter().cloned().collect())
            .unwrap_or_default();

        let roles = parse_roles(text);
        let anchors = parse_local_anchors(text);
        debug!(
            path = path.as_str(),
            roles = roles.len(),
            anchors = anchors.len(),
            "merging shared include"
        );

        for role in roles {
            findings.roles.insert_all(role, &includers);
        }
        findings.anchors.extend(anchors.into_iter().map(|anchor| anchor.name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Collector;
    use crate::sources::Corpus;
    use crate::testing::FakeRemote;

    fn config() -> ProjectConfig {
        ProjectConfig::from_toml(
            r#"
[constants]
version = "v1.8.0"
api = "https://pkg.go.dev/go.mongodb.org/mongo-driver@{+version+}"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ssl_anchor_gets_tls_synonym() {
        let anchors: AnchorSet = ["connect-ssl-options".to_string(), "plain".to_string()]
            .into_iter()
            .collect();
        let anchors = anchors.with_tls_synonyms();

        assert!(anchors.contains("connect-ssl-options"));
        assert!(anchors.contains("connect-tls-options"));
        assert_eq!(anchors.len(), 3);
    }

    #[test]
    fn test_only_first_ssl_is_replaced() {
        let anchors: AnchorSet = ["ssl-and-ssl".to_string()].into_iter().collect();
        let anchors = anchors.with_tls_synonyms();
        assert!(anchors.contains("tls-and-ssl"));
        assert!(!anchors.contains("tls-and-tls"));
    }

    #[test]
    fn test_ref_prefers_inventory_then_anchors() {
        let index = ReferenceIndex {
            anchors: ["local".to_string()].into_iter().collect(),
            documents: vec!["source/fundamentals/crud.txt".to_string()],
            ..ReferenceIndex::default()
        };
        assert!(index.is_valid_ref("local"));
        assert!(!index.is_valid_ref("elsewhere"));
        assert!(index.is_valid_doc("/fundamentals/crud/"));
        assert!(!index.is_valid_doc("/fundamentals/aggregation"));
    }

    #[test]
    fn test_doc_root_matches_nothing() {
        let index = ReferenceIndex {
            documents: vec!["source/index.txt".to_string()],
            ..ReferenceIndex::default()
        };
        assert!(!index.is_valid_doc("/"));
        assert!(!index.is_valid_doc(""));
        assert!(index.is_valid_doc("/index"));
    }

    #[tokio::test]
    async fn test_roles_get_constants_substituted() {
        let mut roles = Occurrences::default();
        roles.insert(Role::new("ref", "{+version+}-notes"), "source/index.txt");
        roles.insert(Role::new("ref", "{+missing+}-notes"), "source/index.txt");
        roles.insert(Role::new("ref", "{+missing+}-notes"), "source/other.txt");

        let collector = Collector::start(false);
        let resolved = substitute_roles(&roles, &config(), &collector.sink());
        let report = collector.finish().await;

        assert_eq!(resolved.len(), 1);
        assert!(resolved.origins(&Role::new("ref", "v1.8.0-notes")).is_some());
        assert_eq!(report.count(), 2);
        assert!(matches!(
            &report.diagnostics()[0].problem,
            Problem::UndefinedConstant { constant } if constant == "missing"
        ));
    }

    #[test]
    fn test_local_anchor_constants_are_substituted() {
        let names: BTreeSet<String> = ["notes-{+version+}-ssl".to_string()].into_iter().collect();
        let anchors = resolve_anchors(&names, &config());
        assert!(anchors.contains("notes-v1.8.0-ssl"));
        assert!(anchors.contains("notes-v1.8.0-tls"));
        assert_eq!(anchors.len(), 2);
    }

    #[test]
    fn test_substitute_known_keeps_unknown_placeholders() {
        assert_eq!(substitute_known("notes-{+version+}", &config()), "notes-v1.8.0");
        assert_eq!(substitute_known("notes-{+nope+}", &config()), "notes-{+nope+}");
    }

    #[test]
    fn test_shared_url_joins_root_and_path() {
        let root = "https://raw.githubusercontent.com/10gen/docs-shared/master";
        assert_eq!(
            shared_url(root, "dbx/intro.rst").unwrap().as_str(),
            "https://raw.githubusercontent.com/10gen/docs-shared/master/dbx/intro.rst"
        );
        assert_eq!(
            shared_url(&format!("{root}/"), "/dbx/intro.rst").unwrap().as_str(),
            "https://raw.githubusercontent.com/10gen/docs-shared/master/dbx/intro.rst"
        );
    }

    #[tokio::test]
    async fn test_shared_roles_belong_to_every_includer() {
        let corpus = Corpus::from_pairs([
            ("source/a.txt", ".. sharedinclude:: dbx/intro.rst\n"),
            ("source/b.txt", ".. sharedinclude:: dbx/intro.rst\n"),
        ]);
        let mut findings = Findings::gather(&corpus);

        let remote = FakeRemote::new().with(
            "https://shared.example/dbx/intro.rst",
            ".. _shared-{+version+}:\n\n:ref:`somewhere`\n",
        );
        let shared = load_shared(
            &remote,
            "https://shared.example/",
            ["dbx/intro.rst".to_string(), "dbx/missing.rst".to_string()],
        )
        .await;
        assert_eq!(shared.len(), 1);

        merge_shared(&mut findings, &shared);
        let origins = findings.roles.origins(&Role::new("ref", "somewhere")).unwrap();
        assert_eq!(origins.len(), 2);

        let anchors = resolve_anchors(&findings.anchors, &config());
        assert!(anchors.contains("shared-v1.8.0"));
    }
}
