//! Per-language translation dictionaries stored under the global metadata
//! directory, one JSON file per language.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const TRANSLATIONS_DIR: &str = "translations";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub translation: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

pub type TranslationDict = BTreeMap<String, TranslationEntry>;

/// Values accepted when importing a dictionary file.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImportValue {
    Plain(String),
    Entry(TranslationEntry),
}

pub struct TranslationDictManager {
    dir: PathBuf,
}

impl TranslationDictManager {
    pub fn new(global_md_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: global_md_dir.as_ref().join(TRANSLATIONS_DIR),
        }
    }

    pub fn get_filename(&self, lang: &str) -> Result<PathBuf> {
        Ok(self.dir.join(format!("{}.json", normalize_lang(lang)?)))
    }

    pub fn get(&self, lang: &str) -> Result<TranslationDict> {
        let path = self.get_filename(lang)?;
        if !path.exists() {
            return Ok(TranslationDict::new());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn add(&self, lang: &str, source: &str, translation: &str, kind: &str) -> Result<()> {
        let mut dict = self.get(lang)?;
        dict.insert(
            source.to_string(),
            TranslationEntry {
                translation: translation.to_string(),
                kind: kind.to_string(),
            },
        );
        self.store(lang, &dict)
    }

    /// Remove `source`; returns false when it was not in the dictionary.
    pub fn delete(&self, lang: &str, source: &str) -> Result<bool> {
        let mut dict = self.get(lang)?;
        if dict.remove(source).is_none() {
            return Ok(false);
        }
        self.store(lang, &dict)?;
        Ok(true)
    }

    /// Merge an imported dictionary; returns how many sources were new.
    pub fn import_json(&self, lang: &str, data: Value) -> Result<usize> {
        let imported: BTreeMap<String, ImportValue> =
            serde_json::from_value(data).context("Unrecognized format")?;

        let mut dict = self.get(lang)?;
        let mut added = 0;
        for (source, value) in imported {
            let entry = match value {
                ImportValue::Plain(translation) => TranslationEntry {
                    translation,
                    kind: String::new(),
                },
                ImportValue::Entry(entry) => entry,
            };
            if dict.insert(source, entry).is_none() {
                added += 1;
            }
        }

        self.store(lang, &dict)?;
        Ok(added)
    }

    fn store(&self, lang: &str, dict: &TranslationDict) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.get_filename(lang)?;
        let json = serde_json::to_string_pretty(dict).context("Failed to serialize dictionary")?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
    }
}

fn normalize_lang(lang: &str) -> Result<String> {
    let valid = !lang.is_empty()
        && lang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        bail!("Invalid language code: {:?}", lang);
    }
    Ok(lang.to_lowercase())
}
