//! Dataset-side collaborators: documents, listings, saved annotations,
//! hints and sentence markers.

pub mod document;
pub mod files;
pub mod hints;
pub mod markers;
pub mod output;

pub use document::{Document, Sentence, Token};
pub use files::FileLister;
pub use hints::{Hint, HintLoader};
pub use markers::SentenceMarkerManager;
pub use output::{record_sentences, AnnotatedToken, OutputWriter};
