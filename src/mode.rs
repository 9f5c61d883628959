//! Document views for the annotate and adjudicate modes.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::config::Mode;
use crate::data::{record_sentences, AnnotatedToken, Document, OutputWriter, SentenceMarkerManager};
use crate::state::AppState;

const OUTSIDE: &str = "O";

#[derive(Serialize)]
struct TokenView<'a> {
    text: &'a str,
    columns: &'a [String],
    tag: &'a str,
}

/// One annotator's tags for a sentence, shown while adjudicating.
#[derive(Serialize)]
struct RowView<'a> {
    name: &'a str,
    tags: Vec<&'a str>,
}

#[derive(Serialize)]
struct SentenceView<'a> {
    index: usize,
    marked: bool,
    tokens: Vec<TokenView<'a>>,
    rows: Vec<RowView<'a>>,
}

struct AnnotatorTags {
    name: String,
    sentences: Vec<Vec<AnnotatedToken>>,
}

pub struct ModeManager<'a> {
    state: &'a AppState,
}

impl<'a> ModeManager<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn mode(&self) -> &Mode {
        &self.state.config.mode
    }

    /// Render the selected document, or `None` when there is nothing to show.
    ///
    /// `index` wins over `filename`; with neither, the first document is shown.
    pub fn render(&self, filename: Option<&str>, index: Option<&str>) -> Result<Option<String>> {
        let files = self.state.files.files();

        let position = match (index.and_then(|i| i.trim().parse::<usize>().ok()), filename) {
            (Some(i), _) => (i < files.len()).then_some(i),
            (None, Some(name)) => files.iter().position(|f| f == name),
            (None, None) => (!files.is_empty()).then_some(0),
        };
        let Some(position) = position else {
            return Ok(None);
        };
        let name = files[position].as_str();

        let document = match Document::read(&self.state.files.path(name)) {
            Ok(doc) if !doc.is_empty() => doc,
            Ok(_) => return Ok(None),
            Err(e) => {
                warn!("{:#}", e);
                return Ok(None);
            }
        };

        let saved = tags_of(self.read_record(&self.state.config.output_dir, name));
        let annotators: Vec<AnnotatorTags> = self
            .mode()
            .annotation_dirs()
            .iter()
            .map(|dir| AnnotatorTags {
                name: dir_label(dir),
                sentences: tags_of(self.read_record(dir, name)),
            })
            .collect();

        let markers = SentenceMarkerManager::new(&self.state.dirs.local)
            .get(name)
            .unwrap_or_else(|e| {
                warn!("Ignoring sentence markers: {:#}", e);
                Default::default()
            });

        let sentences: Vec<SentenceView> = document
            .sentences
            .iter()
            .enumerate()
            .map(|(s_idx, sentence)| SentenceView {
                index: s_idx,
                marked: markers.contains(&s_idx.to_string()),
                tokens: sentence
                    .iter()
                    .enumerate()
                    .map(|(t_idx, token)| TokenView {
                        text: &token.text,
                        columns: &token.columns,
                        tag: tag_at(&saved, s_idx, t_idx),
                    })
                    .collect(),
                rows: annotators
                    .iter()
                    .map(|a| RowView {
                        name: &a.name,
                        tags: (0..sentence.len())
                            .map(|t_idx| tag_at(&a.sentences, s_idx, t_idx))
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        let annotator_names: Vec<&str> = annotators.iter().map(|a| a.name.as_str()).collect();

        let mut context = self.state.template_context();
        context.insert("title", name);
        context.insert("mode", self.mode().name());
        context.insert("filename", name);
        context.insert("index", &position);
        context.insert("position", &(position + 1));
        context.insert("total", &files.len());
        context.insert("prev", &position.checked_sub(1).map(|i| link_to(&files[i])));
        context.insert("next", &files.get(position + 1).map(|f| link_to(f)));
        context.insert("tags", &self.state.config.tags);
        context.insert("sentences", &sentences);
        context.insert("annotators", &annotator_names);

        self.state.renderer.render("document.html", &context).map(Some)
    }

    fn read_record(&self, dir: &Path, name: &str) -> Option<Value> {
        OutputWriter::read_from(dir, name).unwrap_or_else(|e| {
            warn!("Ignoring annotations for {}: {:#}", name, e);
            None
        })
    }
}

fn tags_of(record: Option<Value>) -> Vec<Vec<AnnotatedToken>> {
    record.as_ref().map(record_sentences).unwrap_or_default()
}

fn tag_at(sentences: &[Vec<AnnotatedToken>], sentence: usize, token: usize) -> &str {
    sentences
        .get(sentence)
        .and_then(|s| s.get(token))
        .map(|t| t.tag.as_str())
        .unwrap_or(OUTSIDE)
}

/// Path segment for a document link; names may hold `#`, `?` or `%`.
fn link_to(filename: &str) -> String {
    urlencoding::encode(filename).into_owned()
}

fn dir_label(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}
