//! End-to-end tests of the HTTP routes against a temporary corpus.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use dragonfly::data::SentenceMarkerManager;
use dragonfly::{build_app, prepare, AppState, LaunchOptions, MetadataDirs, RunConfiguration};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "dragonfly-test-boundary";

struct TestServer {
    _temp: TempDir,
    data: PathBuf,
    state: Arc<AppState>,
    app: Router,
}

impl TestServer {
    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> Response {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn post_json(&self, uri: &str, value: Value) -> Response {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn upload(&self, uri: &str, content: &str) -> Response {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"dict\"; filename=\"dict.json\"\r\n\
             Content-Type: application/json\r\n\r\n{content}\r\n--{b}--\r\n",
            b = BOUNDARY,
            content = content
        );
        self.send(
            Request::post(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn write_corpus(data: &std::path::Path) {
    fs::create_dir_all(data).unwrap();
    fs::write(
        data.join("doc1.txt"),
        "Abebe\tabebe\nwent\tdehed\n\nAddis\tadis\nAbeba\tabeba\n",
    )
    .unwrap();
    fs::write(data.join("doc2.txt"), "Kebede\nstayed\n").unwrap();
    fs::write(data.join("empty.txt"), "\n\n").unwrap();
}

async fn server_with(configure: impl FnOnce(&mut LaunchOptions, &std::path::Path)) -> TestServer {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    write_corpus(&data);

    let mut options = LaunchOptions {
        lang: "amh".to_string(),
        data: data.clone(),
        ..Default::default()
    };
    configure(&mut options, temp.path());

    let config = RunConfiguration::resolve(options).unwrap();
    let dirs = MetadataDirs::new(temp.path().join("home"), data.join(".dragonfly"));
    let state = prepare(config, dirs).unwrap();
    let app = build_app(state.clone());

    TestServer {
        _temp: temp,
        data,
        state,
        app,
    }
}

async fn server() -> TestServer {
    server_with(|_, _| {}).await
}

#[tokio::test]
async fn test_first_document_is_rendered() {
    let server = server().await;

    let response = server.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Abebe"));
    assert!(html.contains("doc1.txt"));
}

#[tokio::test]
async fn test_document_by_name_and_index() {
    let server = server().await;

    let html = body_text(server.get("/doc2.txt").await).await;
    assert!(html.contains("Kebede"));

    let html = body_text(server.get("/doc1.txt?index=1").await).await;
    assert!(html.contains("Kebede"));
}

#[tokio::test]
async fn test_unknown_or_empty_document_is_404() {
    let server = server().await;

    let response = server.get("/missing.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Error"));

    let response = server.get("/empty.txt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_without_data_fails() {
    let server = server().await;

    let body = body_json(server.post_form("/save", &[("json", "")]).await).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("The server did not receive any data."));

    let body = body_json(server.post_form("/save", &[]).await).await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_save_writes_record_and_tags_show_up() {
    let server = server().await;
    let record = json!({
        "filename": "doc1.txt",
        "sentences": [
            [{"token": "Abebe", "tag": "B-PER"}, {"token": "went", "tag": "O"}],
            [{"token": "Addis", "tag": "B-GPE"}, {"token": "Abeba", "tag": "I-GPE"}]
        ]
    });

    let body = body_json(
        server
            .post_form("/save", &[("json", &record.to_string())])
            .await,
    )
    .await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Annotations saved."));

    let saved = server.data.join("annotations").join("doc1.anno");
    let stored: Value = serde_json::from_str(&fs::read_to_string(saved).unwrap()).unwrap();
    assert_eq!(stored, record);

    let html = body_text(server.get("/doc1.txt").await).await;
    assert!(html.contains("tag-B-PER"));

    let stats = body_text(server.get("/stats").await).await;
    assert!(stats.contains("GPE"));
    assert!(stats.contains("PER"));
}

#[tokio::test]
async fn test_save_rejects_path_like_filename() {
    let server = server().await;
    let record = json!({"filename": "..", "sentences": []});

    let body = body_json(
        server
            .post_form("/save", &[("json", &record.to_string())])
            .await,
    )
    .await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn test_hints_empty_without_file() {
    let server = server().await;
    let body = body_json(server.get("/hints").await).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_hints_from_file() {
    let server = server_with(|options, root| {
        let path = root.join("hints.tsv");
        fs::write(&path, "# comment\nAddis Abeba\tcapital\n").unwrap();
        options.hints = Some(path);
    })
    .await;

    let body = body_json(server.get("/hints").await).await;
    assert_eq!(body, json!([{"text": "Addis Abeba", "hint": "capital"}]));
}

#[tokio::test]
async fn test_marker_toggles() {
    let server = server().await;
    let markers = SentenceMarkerManager::new(&server.state.dirs.local);

    let body = body_json(
        server
            .post_form("/marker", &[("document", "doc1.txt"), ("sentence", "1")])
            .await,
    )
    .await;
    assert_eq!(body["success"], json!(true));
    assert!(markers.get("doc1.txt").unwrap().contains("1"));

    server
        .post_form("/marker", &[("document", "doc1.txt"), ("sentence", "1")])
        .await;
    assert!(markers.get("doc1.txt").unwrap().is_empty());
}

#[tokio::test]
async fn test_settings_round_trip() {
    let server = server().await;

    let html = body_text(server.get("/settings").await).await;
    assert!(html.contains("Column Width"));
    assert!(html.contains("Show Translations"));

    let body = body_json(
        server
            .post_form("/settings", &[("json", r#"{"Font Size": "18"}"#)])
            .await,
    )
    .await;
    assert_eq!(body["message"], json!("Settings saved."));
    assert_eq!(server.state.settings().settings()["Font Size"], json!("18"));
}

#[tokio::test]
async fn test_translation_add_get_delete() {
    let server = server().await;

    let body = body_json(
        server
            .post_json(
                "/translation",
                json!({
                    "lang": "amh",
                    "source": "ሰላም",
                    "translation": "peace",
                    "type": "noun"
                }),
            )
            .await,
    )
    .await;
    assert_eq!(body["message"], json!("Translation saved."));

    let dict = body_json(server.get("/translations/amh").await).await;
    assert_eq!(dict["ሰላም"], json!({"translation": "peace", "type": "noun"}));

    let body = body_json(
        server
            .post_json("/translation/delete", json!({"lang": "amh", "source": "ሰላም"}))
            .await,
    )
    .await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Translation deleted."));
}

#[tokio::test]
async fn test_translation_delete_missing() {
    let server = server().await;

    let body = body_json(
        server
            .post_json("/translation/delete", json!({"lang": "amh", "source": "nothing"}))
            .await,
    )
    .await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Not in dictionary."));
}

#[tokio::test]
async fn test_translation_import() {
    let server = server().await;

    let body = body_json(server.upload("/translations/import/amh", "not json").await).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Unrecognized format"));

    let body = body_json(server.upload("/translations/import/amh", r#"{"a":"b"}"#).await).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("1 items added"));

    let dict = body_json(server.get("/translations/amh").await).await;
    assert_eq!(dict["a"]["translation"], json!("b"));
}

#[tokio::test]
async fn test_translation_export() {
    let server = server().await;

    let response = server.get("/translations/export/amh").await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("amh.json"));
    assert!(response.headers()[header::CACHE_CONTROL]
        .to_str()
        .unwrap()
        .contains("no-cache"));
    assert_eq!(body_text(response).await, "{}");

    server
        .post_json(
            "/translation",
            json!({"lang": "amh", "source": "x", "translation": "y", "type": ""}),
        )
        .await;
    let exported = body_json(server.get("/translations/export/amh").await).await;
    assert_eq!(exported["x"]["translation"], json!("y"));
}

#[tokio::test]
async fn test_search_after_index_is_ready() {
    let server = server().await;
    server.state.search.settled().await;

    let status = body_json(server.get("/search/status").await).await;
    assert_eq!(status["state"], json!("ready"));
    assert_eq!(status["documents"], json!(3));

    let body = body_json(server.post_form("/search", &[("term", "addis abeba")]).await).await;
    assert_eq!(body["term"], json!("addis abeba"));
    assert_eq!(body["refs"], json!([{"filename": "doc1.txt", "sentence": 1}]));

    let body = body_json(server.post_form("/search/build", &[]).await).await;
    assert_eq!(body["message"], json!("Command queued"));
}

#[tokio::test]
async fn test_tools_panel_uses_language() {
    let server = server().await;
    let html = body_text(server.get("/tools").await).await;
    assert!(html.contains("/translations/export/amh"));
}

#[tokio::test]
async fn test_prefix_is_stripped_before_routing() {
    let server = server_with(|options, _| options.prefix = Some("prefix".to_string())).await;

    let response = server.get("/prefix/hints").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));

    let html = body_text(server.get("/prefix/doc2.txt").await).await;
    assert!(html.contains("Kebede"));
    // the root is escaped by the template engine, the separator is literal
    assert!(html.contains(r#"href="&#x2F;prefix/doc1.txt""#));

    let response = server.get("/prefix").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_navigation_links_encode_filenames() {
    let server = server_with(|options, _| {
        fs::write(options.data.join("b#c.txt"), "Almaz\n").unwrap();
        options.prefix = Some("p".to_string());
    })
    .await;

    let html = body_text(server.get("/p/doc1.txt").await).await;
    assert!(html.contains(r#"href="&#x2F;p/b%23c.txt""#));
    assert!(!html.contains("b#c.txt\""));

    let response = server.get("/p/b%23c.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Almaz"));
}

#[tokio::test]
async fn test_paths_outside_prefix_are_rejected() {
    let server = server_with(|options, _| options.prefix = Some("/prefix/".to_string())).await;

    let response = server.get("/other/hints").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Bad request. Check configuration.");

    let response = server.get("/prefixed/hints").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_adjudication_shows_each_annotator() {
    let server = server_with(|options, root| {
        let mut dirs = Vec::new();
        for (name, tag) in [("alice", "B-PER"), ("bob", "B-ORG")] {
            let dir = root.join(name);
            fs::create_dir_all(&dir).unwrap();
            let record = json!({
                "filename": "doc2.txt",
                "sentences": [[{"token": "Kebede", "tag": tag}, {"token": "stayed", "tag": "O"}]]
            });
            fs::write(dir.join("doc2.anno"), record.to_string()).unwrap();
            dirs.push(dir);
        }
        options.annotation_dirs = Some(dirs);
        options.output = Some(root.join("consensus"));
    })
    .await;

    let html = body_text(server.get("/doc2.txt").await).await;
    assert!(html.contains("alice"));
    assert!(html.contains("bob"));
    assert!(html.contains("B-PER"));
    assert!(html.contains("B-ORG"));
}
