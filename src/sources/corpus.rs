// src/sources/corpus.rs
// =============================================================================
// This module collects the documents of a project into a Corpus.
//
// A project root must hold snooty.toml and a source/ directory. Every .rst,
// .txt, .yml and .yaml file under the root is read, except anything inside
// a `draft` directory. Paths are kept relative to the root with `/`
// separators, e.g. `source/fundamentals/crud.txt`.
// =============================================================================

use std::path::Path;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::PROJECT_FILE;
use crate::error::ConfigError;

const EXTENSIONS: &[&str] = &["rst", "txt", "yml", "yaml"];

/// One source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: String,
    pub content: String,
}

/// All documents of a run.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// Builds a corpus from (path, content) pairs.
    #[cfg(test)]
    pub fn from_pairs<P, C>(pairs: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: Into<String>,
        C: Into<String>,
    {
        let documents = pairs
            .into_iter()
            .map(|(path, content)| Document {
                path: path.into(),
                content: content.into(),
            })
            .collect();
        Corpus { documents }
    }

    /// Walks a project root and reads every candidate document.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        for required in [PROJECT_FILE, "source"] {
            if !root.join(required).exists() {
                return Err(ConfigError::MissingProjectFile(root.join(required)));
            }
        }

        let mut documents = Vec::new();
        let walker = WalkDir::new(root).into_iter().filter_entry(|e| !is_draft_dir(e));

        for entry in walker {
            let entry = entry.map_err(|e| ConfigError::Read {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() || !has_document_extension(entry.path()) {
                continue;
            }

            let bytes = std::fs::read(entry.path()).map_err(|source| ConfigError::Read {
                path: entry.path().to_path_buf(),
                source,
            })?;
            documents.push(Document {
                path: relative_path(root, entry.path()),
                content: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        documents.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(count = documents.len(), "collected documents");
        Ok(Corpus { documents })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn paths(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn is_draft_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == "draft"
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
