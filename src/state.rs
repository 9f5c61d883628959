//! Shared application state handed to every handler.

use anyhow::{anyhow, Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use crate::config::RunConfiguration;
use crate::data::FileLister;
use crate::render::Renderer;
use crate::search::IndexWorker;
use crate::settings::SettingsManager;

/// Name of the metadata directory, both under the home and the data directory.
pub const METADATA_DIR: &str = ".dragonfly";

/// Overrides the global metadata directory, e.g. to run isolated instances.
pub const HOME_ENV: &str = "DRAGONFLY_HOME";

#[derive(Debug, Clone)]
pub struct MetadataDirs {
    /// Per-user settings and translation dictionaries.
    pub global: PathBuf,
    /// Per-dataset search index and sentence markers.
    pub local: PathBuf,
}

impl MetadataDirs {
    pub fn new(global: impl Into<PathBuf>, local: impl Into<PathBuf>) -> Self {
        Self {
            global: global.into(),
            local: local.into(),
        }
    }

    /// `$DRAGONFLY_HOME` or `~/.dragonfly`, plus `<data>/.dragonfly`.
    pub fn resolve(data_dir: &Path) -> Result<Self> {
        let global = match std::env::var_os(HOME_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .ok_or_else(|| anyhow!("Could not determine the home directory"))?
                .join(METADATA_DIR),
        };
        Ok(Self::new(global, data_dir.join(METADATA_DIR)))
    }

    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.global, &self.local] {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        Ok(())
    }
}

/// Crate version, with a random suffix so debug pages never hit stale assets.
pub fn version_string(debug: bool) -> String {
    let version = env!("CARGO_PKG_VERSION");
    if debug {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("{}.{}", version, suffix[..8].to_uppercase())
    } else {
        version.to_string()
    }
}

pub struct AppState {
    pub config: Arc<RunConfiguration>,
    pub files: FileLister,
    pub dirs: MetadataDirs,
    pub renderer: Renderer,
    pub search: IndexWorker,
}

impl AppState {
    /// Version string shown in pages; debug runs get a cache-busting suffix.
    pub fn version(&self) -> String {
        version_string(self.config.debug)
    }

    /// Script root used to build links, empty when served at `/`.
    pub fn root(&self) -> &str {
        self.config.prefix.as_deref().unwrap_or("")
    }

    pub fn settings(&self) -> SettingsManager {
        let mut manager = SettingsManager::new(&self.dirs.global);
        if let Err(e) = manager.load() {
            warn!("Using default settings: {:#}", e);
        }
        manager
    }

    /// Values every template can rely on.
    pub fn template_context(&self) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert("version", &self.version());
        context.insert("root", self.root());
        context.insert("lang", &self.config.lang);
        context.insert("rtl", &self.config.rtl);
        context.insert("settings", self.settings().settings());
        context
    }
}
