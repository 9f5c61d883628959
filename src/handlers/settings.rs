use axum::{extract::State, http::StatusCode, response::Html, Form, Json};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use super::{render, ActionResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub json: String,
}

/// Settings panel, text fields and checkboxes listed separately.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let manager = state.settings();

    let mut context = state.template_context();
    context.insert("text_settings", &manager.text_settings());
    context.insert("bool_settings", &manager.bool_settings());
    render(&state, "modals/settings.html", &context)
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SettingsForm>,
) -> Json<ActionResponse> {
    let new_settings: Value = match serde_json::from_str(&form.json) {
        Ok(value) => value,
        Err(e) => return Json(ActionResponse::failed(format!("Invalid settings: {}", e))),
    };

    let mut manager = state.settings();
    match manager.save(new_settings) {
        Ok(()) => {
            info!("Saved settings");
            Json(ActionResponse::ok("Settings saved."))
        }
        Err(e) => {
            error!("Failed to save settings: {:#}", e);
            Json(ActionResponse::failed(e.to_string()))
        }
    }
}
