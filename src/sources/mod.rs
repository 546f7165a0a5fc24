// src/sources/mod.rs
// =============================================================================
// This module gathers everything a run reads before it can check anything.
//
// Submodules:
// - fetch: Downloads remote files (RemoteSource trait + reqwest implementation)
// - intersphinx: Decodes objects.inv inventories of other documentation sets
// - rstspec: Loads the role specification from the snooty-parser release
// - corpus: Walks the project tree and reads the source documents
// =============================================================================

mod corpus;
mod fetch;
pub mod intersphinx;
pub mod rstspec;

pub use corpus::Corpus;
pub use fetch::{HttpFetcher, RemoteSource};
pub use intersphinx::{Inventory, InventoryIndex};
