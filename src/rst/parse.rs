// src/rst/parse.rs
// =============================================================================
// This module extracts findings from raw reStructuredText.
//
// All patterns are compiled once (LazyLock) and every extractor is a pure
// function: text in, Vec of findings out, in order of appearance.
// A capture that is empty or only whitespace is never turned into a finding.
// =============================================================================

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use super::{Constant, HttpLink, LocalAnchor, Role, SharedInclude};

// :name:`content` - names may carry a domain, e.g. :py:meth:
static ROLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":([A-Za-z0-9][A-Za-z0-9._\-:]*):`([^`]+)`").expect("role pattern")
});

// <{+name+}/path>` as used in `link text <{+api+}/path>`__
static CONSTANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\{\+([\w.\-]+)\+\}(/[^>`\s]*)>`").expect("constant pattern")
});

static HTTP_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9]{1,6}\b[-a-zA-Z0-9@:%_+.~#?&/=]*",
    )
    .expect("http link pattern")
});

// An explicit RST target; the URL inside may be wrapped over several lines
static BRACKETED_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(https?://[^<>`]+)>").expect("bracketed link pattern"));

static LOCAL_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\. +_([^_:\n`][^:\n`]*):").expect("local anchor pattern"));

static SHARED_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.\.\s+sharedinclude::[ \t]+(\S+)").expect("shared include pattern")
});

/// Extracts every role occurrence.
///
/// `:manual:`limits </reference/limits>`` gives target `/reference/limits`;
/// `:ref:`fantastic`` gives target `fantastic`.
pub fn parse_roles(text: &str) -> Vec<Role> {
    ROLE.captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            let target = role_target(caps.get(2)?.as_str())?;
            Some(Role::new(name, &target))
        })
        .collect()
}

// Picks the <target> out of "title <target>" or falls back to the whole content
fn role_target(content: &str) -> Option<String> {
    let content = content.trim();

    let target = match content.strip_suffix('>').and_then(|s| s.rfind('<').map(|i| &s[i + 1..])) {
        // Bracketed targets never contain whitespace; a line break is a wrap
        Some(inner) => inner.split_whitespace().collect::<String>(),
        None => content.split_whitespace().collect::<Vec<_>>().join(" "),
    };

    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}

/// Extracts `<{+name+}/path>`` constant links.
pub fn parse_constants(text: &str) -> Vec<Constant> {
    CONSTANT
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().trim();
            let target = caps.get(2)?.as_str().trim();
            if name.is_empty() || target.is_empty() {
                return None;
            }
            Some(Constant {
                name: name.to_string(),
                target: target.to_string(),
            })
        })
        .collect()
}

/// Extracts bare and markup-embedded http(s) links.
pub fn parse_http_links(text: &str) -> Vec<HttpLink> {
    let mut links = Vec::new();
    let mut bracketed: Vec<Range<usize>> = Vec::new();

    // Pass 1: explicit <...> targets, joining lines the author wrapped
    for caps in BRACKETED_LINK.captures_iter(text) {
        let Some(inner) = caps.get(1) else { continue };
        let joined: String = inner.as_str().split_whitespace().collect();

        match HTTP_LINK.find(&joined) {
            Some(m) if m.start() == 0 => {
                links.push(HttpLink(m.as_str().to_string()));
                bracketed.push(inner.range());
            }
            _ => continue,
        }
    }

    // Pass 2: everything else, skipping what pass 1 already took
    for m in HTTP_LINK.find_iter(text) {
        if bracketed.iter().any(|r| r.contains(&m.start())) {
            continue;
        }
        let url = m.as_str().trim_end_matches(['.', ',']);
        if is_http_link(url) {
            links.push(HttpLink(url.to_string()));
        }
    }

    links
}

/// Whether the string contains something URL-shaped.
pub fn is_http_link(text: &str) -> bool {
    HTTP_LINK.is_match(text)
}

/// Extracts `.. _name:` anchor declarations.
pub fn parse_local_anchors(text: &str) -> Vec<LocalAnchor> {
    LOCAL_ANCHOR
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().trim();
            if name.is_empty() {
                return None;
            }
            Some(LocalAnchor {
                name: name.to_string(),
            })
        })
        .collect()
}

/// Extracts `.. sharedinclude:: path` directives.
pub fn parse_shared_includes(text: &str) -> Vec<SharedInclude> {
    SHARED_INCLUDE
        .captures_iter(text)
        .filter_map(|caps| {
            let path = caps.get(1)?.as_str().trim();
            if path.is_empty() {
                return None;
            }
            Some(SharedInclude {
                path: path.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rst::RoleKind;

    #[test]
    fn test_empty_input_finds_nothing() {
        assert!(parse_roles("").is_empty());
        assert!(parse_constants("").is_empty());
        assert!(parse_http_links("").is_empty());
        assert!(parse_local_anchors("").is_empty());
        assert!(parse_shared_includes("").is_empty());
    }

    #[test]
    fn test_parse_ref_role() {
        let roles = parse_roles("here is a :ref:`fantastic`");
        assert_eq!(
            roles,
            vec![Role {
                target: "fantastic".to_string(),
                kind: RoleKind::Ref,
                name: "ref".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_role_with_bracketed_target() {
        let roles = parse_roles("Some :manual:`limitations </core/aggregation-pipeline-limits/>`:");
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "manual");
        assert_eq!(roles[0].kind, RoleKind::Role);
        assert_eq!(roles[0].target, "/core/aggregation-pipeline-limits/");
    }

    #[test]
    fn test_parse_role_wrapped_over_lines() {
        let text = "The :manual:`$graphLookup\n</reference/operator/aggregation/graphLookup/>` stage";
        let roles = parse_roles(text);
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].target, "/reference/operator/aggregation/graphLookup/");
    }

    #[test]
    fn test_parse_domain_role() {
        let roles = parse_roles("call :py:meth:`pymongo.collection.Collection.find` now");
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "py:meth");
        assert_eq!(roles[0].target, "pymongo.collection.Collection.find");
    }

    #[test]
    fn test_parse_several_roles() {
        let text = "- :rfc:`7231`\n- :ref:`some-anchor`\n- :doc:`/fundamentals/crud`";
        let names: Vec<_> = parse_roles(text).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["rfc", "ref", "doc"]);
    }

    #[test]
    fn test_blank_role_content_is_skipped() {
        assert!(parse_roles(":ref:`   `").is_empty());
        assert!(parse_roles(":ref:`title <>`").is_empty());
    }

    #[test]
    fn test_parse_constants() {
        let text = "Here is one `constant link <{+api+}/One.html>`__ and a second `constant link <{+api+}/Two.html>`__";
        let constants = parse_constants(text);
        assert_eq!(
            constants,
            vec![
                Constant { name: "api".to_string(), target: "/One.html".to_string() },
                Constant { name: "api".to_string(), target: "/Two.html".to_string() },
            ]
        );
    }

    #[test]
    fn test_constants_ignore_refs_and_anchors() {
        assert!(parse_constants("here is a :ref:`fantastic`").is_empty());
        assert!(parse_constants(".. _: foo").is_empty());
    }

    #[test]
    fn test_parse_markdown_and_rst_links() {
        let text = "[some markdown link](https://www.google.com)\n\
                    this is a bad `url <https://www.flibbertypip.com>`__";
        let links = parse_http_links(text);
        assert_eq!(
            links,
            vec![
                HttpLink("https://www.flibbertypip.com".to_string()),
                HttpLink("https://www.google.com".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_links_in_plain_words() {
        assert!(parse_http_links("we can say http and www without any links being found").is_empty());
        assert!(parse_http_links("\n\n\n").is_empty());
    }

    #[test]
    fn test_wrapped_bracketed_link_is_joined() {
        let text = "see `the docs <https://www.mongodb.com/docs/\n   manual/reference/>`__";
        let links = parse_http_links(text);
        assert_eq!(
            links,
            vec![HttpLink("https://www.mongodb.com/docs/manual/reference/".to_string())]
        );
    }

    #[test]
    fn test_bare_link_drops_trailing_period() {
        let links = parse_http_links("Read more at https://example.com/guide.");
        assert_eq!(links, vec![HttpLink("https://example.com/guide".to_string())]);
    }

    #[test]
    fn test_is_http_link() {
        assert!(is_http_link("https://www.google.com"));
        assert!(!is_http_link("v1.8.0"));
    }

    #[test]
    fn test_parse_local_anchors() {
        let anchors = parse_local_anchors(".. _foo:\n.. _bar:\n\n\n\n.. _version-4.1:");
        let names: Vec<_> = anchors.into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["foo", "bar", "version-4.1"]);
    }

    #[test]
    fn test_empty_anchor_is_skipped() {
        assert!(parse_local_anchors(".. _:").is_empty());
        assert!(parse_local_anchors(".. _ :").is_empty());
    }

    #[test]
    fn test_anonymous_target_is_not_an_anchor() {
        assert!(parse_local_anchors(".. __: https://example.com").is_empty());
        let anchors = parse_local_anchors(".. __: https://example.com\n.. _real:\n");
        let names: Vec<_> = anchors.into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["real"]);
    }

    #[test]
    fn test_parse_shared_includes() {
        let text = ".. sharedinclude:: dbx/jira-issues.rst\n\nBody text";
        assert_eq!(
            parse_shared_includes(text),
            vec![SharedInclude { path: "dbx/jira-issues.rst".to_string() }]
        );
    }
}
