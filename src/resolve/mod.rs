// src/resolve/mod.rs
// =============================================================================
// This module turns raw findings into verdicts and link candidates.
//
// Submodules:
// - gather: Runs the extractors over the corpus, tracking origins
// - merge: Builds the anchor/inventory namespaces and substitutes constants
// - classify: Checks each role against those namespaces and the role spec
// =============================================================================

mod classify;
mod gather;
mod merge;

pub use classify::{add_links, check_constants, Classifier};
pub use gather::Findings;
pub use merge::{load_shared, merge_shared, resolve_anchors, substitute_roles, ReferenceIndex};
