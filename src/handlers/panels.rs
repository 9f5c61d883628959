use axum::{extract::State, http::StatusCode, response::Html};
use std::sync::Arc;

use super::render;
use crate::state::AppState;
use crate::stats::Stats;

pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let stats = Stats::collect(&state.config.output_dir);

    let mut context = state.template_context();
    context.insert("stats", &stats);
    render(&state, "modals/stats.html", &context)
}

pub async fn tools(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, (StatusCode, String)> {
    render(&state, "modals/tools.html", &state.template_context())
}
