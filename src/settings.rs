//! User settings, persisted in the global metadata directory.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

fn default_settings() -> Map<String, Value> {
    let mut settings = Map::new();
    settings.insert("Column Width".into(), Value::from("120"));
    settings.insert("Font Size".into(), Value::from("14"));
    settings.insert("Auto Scrolling Sentence IDs".into(), Value::Bool(true));
    settings.insert("Display Row Labels".into(), Value::Bool(true));
    settings.insert("Show Translations".into(), Value::Bool(true));
    settings
}

pub struct SettingsManager {
    path: PathBuf,
    settings: Map<String, Value>,
}

impl SettingsManager {
    pub fn new(global_md_dir: impl AsRef<Path>) -> Self {
        Self {
            path: global_md_dir.as_ref().join(SETTINGS_FILE),
            settings: default_settings(),
        }
    }

    /// Reload from disk: defaults first, stored values on top.
    pub fn load(&mut self) -> Result<()> {
        let mut settings = default_settings();
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read {}", self.path.display()))?;
            let stored: Map<String, Value> =
                serde_json::from_str(&content).context("Failed to parse settings")?;
            settings.extend(stored);
        }
        self.settings = settings;
        Ok(())
    }

    /// Merge `new_settings` into the current values and persist them.
    pub fn save(&mut self, new_settings: Value) -> Result<()> {
        let Value::Object(new_settings) = new_settings else {
            bail!("Settings must be a JSON object");
        };

        self.load()?;
        self.settings.extend(new_settings);

        let json = serde_json::to_string_pretty(&self.settings)
            .context("Failed to serialize settings")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    pub fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    pub fn text_settings(&self) -> Map<String, Value> {
        self.filtered(|v| !v.is_boolean())
    }

    pub fn bool_settings(&self) -> Map<String, Value> {
        self.filtered(Value::is_boolean)
    }

    fn filtered(&self, keep: impl Fn(&Value) -> bool) -> Map<String, Value> {
        self.settings
            .iter()
            .filter(|(_, v)| keep(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
