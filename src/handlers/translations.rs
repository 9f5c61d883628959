use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::ActionResponse;
use crate::state::AppState;
use crate::translations::{TranslationDict, TranslationDictManager};

const UNRECOGNIZED_FORMAT: &str = "Unrecognized format";

#[derive(Debug, Deserialize)]
pub struct TranslationRequest {
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub translation: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTranslationRequest {
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub source: String,
}

fn manager(state: &AppState) -> TranslationDictManager {
    TranslationDictManager::new(&state.dirs.global)
}

/// Bodies are parsed as JSON whatever their content type.
fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, Json<ActionResponse>> {
    serde_json::from_slice(body)
        .map_err(|e| Json(ActionResponse::failed(format!("Invalid request: {}", e))))
}

pub async fn add_translation(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<ActionResponse> {
    let request: TranslationRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match manager(&state).add(
        &request.lang,
        &request.source,
        &request.translation,
        &request.kind,
    ) {
        Ok(()) => Json(ActionResponse::ok("Translation saved.")),
        Err(e) => {
            error!("Failed to save translation: {:#}", e);
            Json(ActionResponse::failed(e.to_string()))
        }
    }
}

pub async fn delete_translation(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<ActionResponse> {
    let request: DeleteTranslationRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match manager(&state).delete(&request.lang, &request.source) {
        Ok(true) => Json(ActionResponse::ok("Translation deleted.")),
        Ok(false) => Json(ActionResponse::failed("Not in dictionary.")),
        Err(e) => {
            error!("Failed to delete translation: {:#}", e);
            Json(ActionResponse::failed(e.to_string()))
        }
    }
}

pub async fn get_translations(
    State(state): State<Arc<AppState>>,
    Path(lang): Path<String>,
) -> Json<TranslationDict> {
    let dict = manager(&state).get(&lang).unwrap_or_else(|e| {
        warn!("Serving an empty dictionary: {:#}", e);
        TranslationDict::new()
    });
    Json(dict)
}

/// Download the dictionary as `<lang>.json`; `{}` when none exists yet.
pub async fn export_translations(
    State(state): State<Arc<AppState>>,
    Path(lang): Path<String>,
) -> Response {
    let path = match manager(&state).get_filename(&lang) {
        Ok(path) => path,
        Err(e) => return Json(ActionResponse::failed(e.to_string())).into_response(),
    };

    let body = match tokio::fs::read(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => b"{}".to_vec(),
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            return Json(ActionResponse::failed(format!(
                "Failed to read dictionary: {}",
                e
            )))
            .into_response();
        }
    };

    let disposition = format!("attachment; filename=\"{}.json\"", lang.to_lowercase());
    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::CACHE_CONTROL,
                "no-cache, no-store, must-revalidate, max-age=0".to_string(),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn import_translations(
    State(state): State<Arc<AppState>>,
    Path(lang): Path<String>,
    mut multipart: Multipart,
) -> Json<ActionResponse> {
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("dict") {
                    continue;
                }
                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some(bytes);
                        break;
                    }
                    Err(e) => {
                        return Json(ActionResponse::failed(format!("Upload failed: {}", e)))
                    }
                }
            }
            Ok(None) => break,
            Err(e) => return Json(ActionResponse::failed(format!("Upload failed: {}", e))),
        }
    }

    let Some(upload) = upload else {
        return Json(ActionResponse::failed("No file uploaded."));
    };

    let data: Value = match serde_json::from_slice(&upload) {
        Ok(data) => data,
        Err(_) => return Json(ActionResponse::failed(UNRECOGNIZED_FORMAT)),
    };

    match manager(&state).import_json(&lang, data) {
        Ok(added) => {
            info!("Imported {} translations for {}", added, lang);
            Json(ActionResponse::ok(format!("{} items added", added)))
        }
        Err(e) => {
            warn!("Import failed: {:#}", e);
            Json(ActionResponse::failed(e.to_string()))
        }
    }
}
