use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hint {
    pub text: String,
    pub hint: String,
}

/// Loads the optional hints file shown next to transliterations.
///
/// The file is tab separated, `text<TAB>hint` per line; `#` starts a comment.
pub struct HintLoader {
    path: PathBuf,
}

impl HintLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn hints(&self) -> Vec<Hint> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => parse_hints(&content),
            Err(e) => {
                warn!("Failed to read hints from {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }
}

fn parse_hints(content: &str) -> Vec<Hint> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once('\t') {
            Some((text, hint)) => Hint {
                text: text.trim().to_string(),
                hint: hint.trim().to_string(),
            },
            None => Hint {
                text: String::new(),
                hint: line.to_string(),
            },
        })
        .collect()
}
