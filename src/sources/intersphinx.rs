// src/sources/intersphinx.rs
// =============================================================================
// This module reads Sphinx `objects.inv` inventories published by other
// documentation sets, so `:ref:` can point into them.
//
// File layout:
//   # Sphinx inventory version 2
//   # Project: ...
//   # The remainder of this file is compressed using zlib.
//   <zlib stream of "<key> <type> <priority> <relative-path> <display-name>">
//
// A broken inventory never stops a run: parse_inventory logs and returns
// None, and the run carries on without that domain.
// =============================================================================

use flate2::read::ZlibDecoder;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Line that separates the plain-text header from the compressed body.
pub const MARKER: &[u8] = b"# The remainder of this file is compressed using zlib.\n";

// Same shape Sphinx itself accepts: names and display names may hold spaces
static RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s+(\S+)\s+(-?\d+)\s+?(\S*)\s+(.*)$").expect("inventory record pattern")
});

/// One documented object of a foreign documentation set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    /// `<domain><relative-path>%s`; `%s` is left for an in-page anchor
    pub target: String,
    /// Sphinx object type, e.g. `std:label` or `py:method`
    pub kind: String,
}

/// Symbol name -> entry, for a single domain.
pub type Inventory = HashMap<String, InventoryEntry>;

/// The domain prefix of an inventory URL: everything before `objects.inv`.
pub fn inventory_domain(url: &str) -> &str {
    url.split("objects.inv").next().unwrap_or(url)
}

/// Decodes one inventory file.
///
/// Returns None when the marker line is missing, nothing follows it, or the
/// body is not a zlib stream.
pub fn parse_inventory(bytes: &[u8], domain: &str) -> Option<Inventory> {
    let Some(start) = bytes.windows(MARKER.len()).position(|w| w == MARKER) else {
        warn!(domain, "no marker line found in inventory header");
        return None;
    };

    let payload = &bytes[start + MARKER.len()..];
    if payload.is_empty() {
        warn!(domain, "inventory has a header but no data");
        return None;
    }

    let mut body = String::new();
    if let Err(e) = ZlibDecoder::new(payload).read_to_string(&mut body) {
        warn!(domain, error = %e, "could not decompress inventory");
        return None;
    }

    let mut inventory = Inventory::new();
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let Some(caps) = RECORD.captures(line) else {
            debug!(domain, line, "skipping malformed inventory record");
            continue;
        };
        let key = &caps[1];
        let mut path = caps[4].to_string();
        // Sphinx shorthand: a trailing $ stands for the key itself
        if path.ends_with('$') {
            path.pop();
            path.push_str(key);
        }
        inventory.insert(
            key.to_string(),
            InventoryEntry {
                target: format!("{domain}{path}%s"),
                kind: caps[2].to_string(),
            },
        );
    }

    Some(inventory)
}

/// All inventories of a run, keyed by domain and then by symbol.
#[derive(Debug, Default)]
pub struct InventoryIndex {
    domains: BTreeMap<String, Inventory>,
    symbols: HashMap<String, InventoryEntry>,
}

impl InventoryIndex {
    /// Joins per-domain inventories into one read-only index.
    ///
    /// Domains are expected to be disjoint; when two publish the same key the
    /// later domain (in sorted order) wins.
    pub fn join(inventories: impl IntoIterator<Item = (String, Inventory)>) -> Self {
        let mut domains: BTreeMap<String, Inventory> = BTreeMap::new();
        for (domain, inventory) in inventories {
            domains.entry(domain).or_default().extend(inventory);
        }

        let mut symbols = HashMap::new();
        for (domain, inventory) in &domains {
            for (key, entry) in inventory {
                if symbols.insert(key.clone(), entry.clone()).is_some() {
                    debug!(domain = domain.as_str(), key = key.as_str(), "inventory key shadowed");
                }
            }
        }

        InventoryIndex { domains, symbols }
    }

    pub fn get(&self, key: &str) -> Option<&InventoryEntry> {
        self.symbols.get(key)
    }

    pub fn domains(&self) -> impl Iterator<Item = (&str, &Inventory)> {
        self.domains.iter().map(|(domain, inventory)| (domain.as_str(), inventory))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::inventory_bytes;

    const HEADER: &str = "# Sphinx inventory version 2\n# Project: golang\n# Version:\n";

    const RECORDS: &str = "whats-new std:doc -1 whats-new/ What's New\n\
                           compatibility std:doc -1 compatibility/ Compatibility\n\
                           fundamentals std:doc -1 fundamentals/ Fundamentals\n\
                           usage-examples std:doc -1 usage-examples/ Usage Examples";

    #[test]
    fn test_empty_bytes() {
        assert!(parse_inventory(b"", "test").is_none());
    }

    #[test]
    fn test_header_without_marker() {
        assert!(parse_inventory(HEADER.as_bytes(), "test").is_none());
    }

    #[test]
    fn test_marker_without_payload() {
        let bytes = [HEADER.as_bytes(), MARKER].concat();
        assert!(parse_inventory(&bytes, "test").is_none());
    }

    #[test]
    fn test_marker_followed_by_plain_text() {
        let bytes = [HEADER.as_bytes(), MARKER, RECORDS.as_bytes()].concat();
        assert!(parse_inventory(&bytes, "test").is_none());
    }

    #[test]
    fn test_records_become_entries() {
        let inventory = parse_inventory(&inventory_bytes(RECORDS), "https://test.com/").unwrap();
        assert_eq!(inventory.len(), 4);
        assert_eq!(
            inventory["whats-new"],
            InventoryEntry {
                target: "https://test.com/whats-new/%s".to_string(),
                kind: "std:doc".to_string(),
            }
        );
        assert_eq!(inventory["usage-examples"].target, "https://test.com/usage-examples/%s");
    }

    #[test]
    fn test_dollar_expands_to_key() {
        let records = "pymongo.collection.Collection py:class 1 api/pymongo/collection.html#$ -";
        let inventory = parse_inventory(&inventory_bytes(records), "https://pymongo.readthedocs.io/en/stable/").unwrap();
        assert_eq!(
            inventory["pymongo.collection.Collection"].target,
            "https://pymongo.readthedocs.io/en/stable/api/pymongo/collection.html#pymongo.collection.Collection%s"
        );
    }

    #[test]
    fn test_inventory_domain() {
        assert_eq!(
            inventory_domain("https://docs.mongodb.com/manual/objects.inv"),
            "https://docs.mongodb.com/manual/"
        );
    }

    #[test]
    fn test_join_keeps_domains_apart() {
        let one = parse_inventory(&inventory_bytes(RECORDS), "https://test1.com/").unwrap();
        let two = parse_inventory(
            &inventory_bytes("aggregation std:label -1 aggregation/ Aggregation"),
            "https://test2.com/",
        )
        .unwrap();

        let index = InventoryIndex::join(vec![
            ("https://test1.com/".to_string(), one),
            ("https://test2.com/".to_string(), two),
        ]);

        assert_eq!(index.len(), 5);
        assert!(index.get("fundamentals").is_some());
        assert_eq!(
            index.get("aggregation").map(|e| e.target.as_str()),
            Some("https://test2.com/aggregation/%s")
        );
        let sizes: Vec<_> = index.domains().map(|(domain, inv)| (domain, inv.len())).collect();
        assert_eq!(sizes, vec![("https://test1.com/", 4), ("https://test2.com/", 1)]);
    }
}
