use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const MARKERS_FILE: &str = "markers.json";

type Markers = BTreeMap<String, BTreeSet<String>>;

/// Per-dataset sentence markers, kept in the local metadata directory.
pub struct SentenceMarkerManager {
    path: PathBuf,
}

impl SentenceMarkerManager {
    pub fn new(local_md_dir: impl AsRef<Path>) -> Self {
        Self {
            path: local_md_dir.as_ref().join(MARKERS_FILE),
        }
    }

    /// Flip the marker on `sentence` of `document`; returns whether it is now set.
    pub fn toggle(&self, document: &str, sentence: &str) -> Result<bool> {
        let mut markers = self.load()?;
        let entry = markers.entry(document.to_string()).or_default();

        let marked = if entry.remove(sentence) {
            false
        } else {
            entry.insert(sentence.to_string());
            true
        };
        if entry.is_empty() {
            markers.remove(document);
        }

        self.store(&markers)?;
        Ok(marked)
    }

    pub fn get(&self, document: &str) -> Result<BTreeSet<String>> {
        Ok(self.load()?.remove(document).unwrap_or_default())
    }

    fn load(&self) -> Result<Markers> {
        if !self.path.exists() {
            return Ok(Markers::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content).context("Failed to parse sentence markers")
    }

    fn store(&self, markers: &Markers) -> Result<()> {
        let json = serde_json::to_string_pretty(markers).context("Failed to serialize markers")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}
