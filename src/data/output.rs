//! Persistence of annotation records.
//!
//! A record is an arbitrary JSON object with a `filename` field. It is stored
//! verbatim as `<stem>.anno` in the output directory; the `sentences` field
//! is only interpreted by readers such as the stats collector.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const ANNOTATION_EXTENSION: &str = "anno";

/// One tagged token of a saved record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    pub token: String,
    #[serde(default = "outside_tag")]
    pub tag: String,
}

fn outside_tag() -> String {
    "O".to_string()
}

/// Extract the tagged sentences of a record, skipping anything malformed.
pub fn record_sentences(record: &Value) -> Vec<Vec<AnnotatedToken>> {
    record
        .get("sentences")
        .and_then(Value::as_array)
        .map(|sentences| {
            sentences
                .iter()
                .filter_map(|s| serde_json::from_value::<Vec<AnnotatedToken>>(s.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Write a record and return the path it was stored at.
    pub fn write(&self, record: &Value) -> Result<PathBuf> {
        let filename = record
            .get("filename")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Annotation record has no filename"))?;

        let path = annotation_path(&self.dir, filename)?;
        let json = serde_json::to_string_pretty(record).context("Failed to serialize annotations")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write annotations to {}", path.display()))?;

        Ok(path)
    }

    pub fn read(&self, filename: &str) -> Result<Option<Value>> {
        Self::read_from(&self.dir, filename)
    }

    /// Read the record for `filename` from any annotation directory.
    pub fn read_from(dir: &Path, filename: &str) -> Result<Option<Value>> {
        let path = annotation_path(dir, filename)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(record))
    }
}

/// Map a document name onto its `.anno` file, refusing anything that would
/// escape `dir`.
fn annotation_path(dir: &Path, filename: &str) -> Result<PathBuf> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        bail!("Invalid filename: {:?}", filename);
    }

    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    Ok(dir.join(format!("{}.{}", stem, ANNOTATION_EXTENSION)))
}
