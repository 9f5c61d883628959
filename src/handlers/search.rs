use axum::{extract::State, Form, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::ActionResponse;
use crate::search::{IndexState, SearchResults};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub term: String,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SearchForm>,
) -> Json<SearchResults> {
    let results = state.search.lookup(&form.term).await;
    info!("Returned {} results for {}", results.refs.len(), form.term);
    Json(results)
}

pub async fn build_index(State(state): State<Arc<AppState>>) -> Json<ActionResponse> {
    state.search.build_index();
    Json(ActionResponse::ok("Command queued"))
}

pub async fn index_status(State(state): State<Arc<AppState>>) -> Json<IndexState> {
    Json(state.search.state())
}
