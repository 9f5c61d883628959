use axum::{extract::State, Form, Json};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use super::ActionResponse;
use crate::data::{Hint, HintLoader, OutputWriter, SentenceMarkerManager};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveForm {
    #[serde(default)]
    pub json: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkerForm {
    #[serde(default)]
    pub document: String,
    #[serde(default)]
    pub sentence: String,
}

/// Persist the annotations posted by the page.
pub async fn save(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SaveForm>,
) -> Json<ActionResponse> {
    if form.json.trim().is_empty() {
        return Json(ActionResponse::failed("The server did not receive any data."));
    }

    let record: Value = match serde_json::from_str(&form.json) {
        Ok(record) => record,
        Err(e) => return Json(ActionResponse::failed(format!("Invalid annotations: {}", e))),
    };

    let writer = OutputWriter::new(&state.config.output_dir);
    match writer.write(&record) {
        Ok(path) => {
            info!("Saving annotations for {}", path.display());
            Json(ActionResponse::ok("Annotations saved."))
        }
        Err(e) => {
            error!("Failed to save annotations: {:#}", e);
            Json(ActionResponse::failed(e.to_string()))
        }
    }
}

pub async fn hints(State(state): State<Arc<AppState>>) -> Json<Vec<Hint>> {
    let hints = match &state.config.hints {
        Some(path) => HintLoader::new(path).hints(),
        None => Vec::new(),
    };
    Json(hints)
}

pub async fn toggle_marker(
    State(state): State<Arc<AppState>>,
    Form(form): Form<MarkerForm>,
) -> Json<ActionResponse> {
    let manager = SentenceMarkerManager::new(&state.dirs.local);
    match manager.toggle(&form.document, &form.sentence) {
        Ok(_) => Json(ActionResponse::ok("Marker saved.")),
        Err(e) => {
            error!("Failed to toggle marker: {:#}", e);
            Json(ActionResponse::failed(e.to_string()))
        }
    }
}
