//! Token-per-line document reader.
//!
//! Each non-blank line is one token row with tab-separated columns, the first
//! column being the token itself. Blank lines end a sentence.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    /// Remaining columns (transliteration, gloss, ...), possibly empty.
    pub columns: Vec<String>,
}

pub type Sentence = Vec<Token>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    pub sentences: Vec<Sentence>,
}

impl Document {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut sentences = Vec::new();
        let mut current: Sentence = Vec::new();

        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                if !current.is_empty() {
                    sentences.push(std::mem::take(&mut current));
                }
                continue;
            }

            let mut fields = line.split('\t');
            let text = fields.next().unwrap_or_default().trim().to_string();
            let columns = fields.map(|f| f.trim().to_string()).collect();
            current.push(Token { text, columns });
        }
        if !current.is_empty() {
            sentences.push(current);
        }

        Self { sentences }
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.iter().all(|s| s.is_empty())
    }

    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(Vec::len).sum()
    }
}
