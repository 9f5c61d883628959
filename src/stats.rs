//! Corpus statistics over saved annotation records.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::data::output::{record_sentences, AnnotatedToken, ANNOTATION_EXTENSION};

const OUTSIDE: &str = "O";

#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityStats {
    #[serde(rename = "type")]
    pub kind: String,
    pub num_entities: usize,
    pub num_unique_entities: usize,
    /// Surface string -> number of mentions.
    pub entities: BTreeMap<String, usize>,
}

impl EntityStats {
    fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Default::default()
        }
    }

    /// Entities by descending count, ties by name.
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<_> = self
            .entities
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        entries
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub num_files: usize,
    pub num_tokens: usize,
    pub num_tagged_tokens: usize,
    pub num_entities: usize,
    pub num_unique_entities: usize,
    pub entities: BTreeMap<String, EntityStats>,
}

impl Stats {
    /// Walk every annotation record in `dir` and accumulate counts.
    pub fn collect(dir: &Path) -> Self {
        let mut stats = Stats::default();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read annotations in {}: {}", dir.display(), e);
                return stats;
            }
        };

        let mut paths: Vec<_> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == ANNOTATION_EXTENSION))
            .collect();
        paths.sort();

        for path in paths {
            let record: Result<serde_json::Value, String> = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| serde_json::from_str(&c).map_err(|e| e.to_string()));
            match record {
                Ok(record) => {
                    stats.num_files += 1;
                    for sentence in record_sentences(&record) {
                        stats.add_sentence(&sentence);
                    }
                }
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        for entity in stats.entities.values_mut() {
            entity.num_unique_entities = entity.entities.len();
        }
        stats.num_unique_entities = stats.entities.values().map(|e| e.num_unique_entities).sum();
        stats
    }

    fn add_sentence(&mut self, sentence: &[AnnotatedToken]) {
        self.num_tokens += sentence.len();
        self.num_tagged_tokens += sentence.iter().filter(|t| t.tag != OUTSIDE).count();

        for (kind, text) in mentions(sentence) {
            self.num_entities += 1;
            let entry = self
                .entities
                .entry(kind.clone())
                .or_insert_with(|| EntityStats::new(&kind));
            entry.num_entities += 1;
            *entry.entities.entry(text).or_insert(0) += 1;
        }
    }
}

/// Decode BIO tags into `(type, surface text)` mentions. An `I-` tag that
/// does not continue a mention of the same type starts a new one.
fn mentions(sentence: &[AnnotatedToken]) -> Vec<(String, String)> {
    let mut found = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for token in sentence {
        let (prefix, kind) = match token.tag.split_once('-') {
            Some((prefix, kind)) => (prefix, kind),
            None => ("", token.tag.as_str()),
        };

        let continues = prefix == "I"
            && current.as_ref().is_some_and(|(open, _)| open == kind);
        if continues {
            if let Some((_, words)) = current.as_mut() {
                words.push(token.token.as_str());
            }
            continue;
        }

        if let Some((open, words)) = current.take() {
            found.push((open, words.join(" ")));
        }
        if kind != OUTSIDE && !kind.is_empty() {
            current = Some((kind.to_string(), vec![token.token.as_str()]));
        }
    }
    if let Some((open, words)) = current {
        found.push((open, words.join(" ")));
    }

    found
}
