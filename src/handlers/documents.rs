use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

use super::render;
use crate::mode::ModeManager;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DocumentQuery {
    /// Position in the document listing; kept as text so junk is ignored.
    pub index: Option<String>,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DocumentQuery>,
) -> Response {
    render_document(&state, None, query.index.as_deref())
}

pub async fn document(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    Query(query): Query<DocumentQuery>,
) -> Response {
    render_document(&state, Some(&filename), query.index.as_deref())
}

fn render_document(state: &AppState, filename: Option<&str>, index: Option<&str>) -> Response {
    match ModeManager::new(state).render(filename, index) {
        Ok(Some(html)) => axum::response::Html(html).into_response(),
        Ok(None) => not_found(state),
        Err(e) => {
            error!("Failed to render document: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render document: {:#}", e),
            )
                .into_response()
        }
    }
}

fn not_found(state: &AppState) -> Response {
    let mut context = state.template_context();
    context.insert("title", "Error");
    match render(state, "404.html", &context) {
        Ok(html) => (StatusCode::NOT_FOUND, html).into_response(),
        Err(err) => err.into_response(),
    }
}
