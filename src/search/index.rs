//! Token index over the documents of a dataset.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::data::{Document, FileLister};

pub const INDEX_FILE: &str = "search_index.json";

/// A sentence that matched a lookup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SearchRef {
    pub filename: String,
    pub sentence: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub term: String,
    pub refs: Vec<SearchRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchIndex {
    documents: usize,
    /// Lower-cased token -> sentences containing it, kept sorted.
    terms: BTreeMap<String, BTreeSet<SearchRef>>,
}

impl SearchIndex {
    /// Index every listed document. Unreadable files are skipped.
    pub fn build(files: &FileLister) -> Self {
        let mut index = SearchIndex::default();

        for filename in files.files() {
            let document = match Document::read(&files.path(&filename)) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("Not indexing {}: {:#}", filename, e);
                    continue;
                }
            };
            index.add_document(&filename, &document);
        }

        info!(
            "Indexed {} documents ({} terms)",
            index.documents,
            index.terms.len()
        );
        index
    }

    pub fn add_document(&mut self, filename: &str, document: &Document) {
        self.documents += 1;
        for (sentence_idx, sentence) in document.sentences.iter().enumerate() {
            for token in sentence {
                let key = token.text.to_lowercase();
                if key.is_empty() {
                    continue;
                }
                self.terms.entry(key).or_default().insert(SearchRef {
                    filename: filename.to_string(),
                    sentence: sentence_idx,
                });
            }
        }
    }

    /// Sentences containing every whitespace-separated word of `term`.
    pub fn lookup(&self, term: &str) -> SearchResults {
        let mut words = term.split_whitespace().map(str::to_lowercase);

        let refs = match words.next() {
            None => Vec::new(),
            Some(first) => {
                let mut matches = self.terms.get(&first).cloned().unwrap_or_default();
                for word in words {
                    match self.terms.get(&word) {
                        Some(refs) => matches.retain(|r| refs.contains(r)),
                        None => matches.clear(),
                    }
                }
                matches.into_iter().collect()
            }
        };

        SearchResults {
            term: term.to_string(),
            refs,
        }
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn index_path(local_md_dir: &Path) -> PathBuf {
        local_md_dir.join(INDEX_FILE)
    }

    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let index = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(index))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self).context("Failed to serialize search index")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }
}
