pub mod annotations;
pub mod documents;
pub mod panels;
pub mod search;
pub mod settings;
pub mod translations;

use axum::{http::StatusCode, response::Html};
use serde::Serialize;
use tracing::error;

use crate::state::AppState;

pub use annotations::{hints, save, toggle_marker};
pub use documents::{document, index};
pub use panels::{stats, tools};
pub use search::{build_index, index_status, search};
pub use settings::{get_settings, update_settings};
pub use translations::{
    add_translation, delete_translation, export_translations, get_translations,
    import_translations,
};

/// Body of every mutating endpoint. Failures are reported here rather than
/// through the status code.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

pub(crate) fn render(
    state: &AppState,
    name: &str,
    context: &tera::Context,
) -> Result<Html<String>, (StatusCode, String)> {
    state.renderer.render(name, context).map(Html).map_err(|e| {
        error!("Template error: {:#}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Template error: {:#}", e),
        )
    })
}
