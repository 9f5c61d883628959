use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Lists the documents of a data directory that carry the configured
/// extension. The directory is re-scanned on every call so files dropped in
/// while the server runs show up without a restart.
#[derive(Debug, Clone)]
pub struct FileLister {
    root: PathBuf,
    extension: String,
}

impl FileLister {
    pub fn new(root: impl AsRef<Path>, extension: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sorted file names (not paths) of the matching documents.
    pub fn files(&self) -> Vec<String> {
        let walker = WalkBuilder::new(&self.root)
            .max_depth(Some(1))
            .hidden(true)
            .parents(false)
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .build();

        let mut files = Vec::new();
        for result in walker {
            match result {
                Ok(entry) => {
                    if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                        continue;
                    }
                    let name = entry.file_name().to_string_lossy();
                    if name.ends_with(&self.extension) {
                        files.push(name.into_owned());
                    }
                }
                Err(err) => {
                    warn!("Error listing {}: {}", self.root.display(), err);
                }
            }
        }

        files.sort();
        files
    }

    pub fn get(&self, index: usize) -> Option<String> {
        self.files().into_iter().nth(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.files().iter().position(|f| f == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}
