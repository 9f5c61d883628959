//! Serving the application below a URL prefix, e.g. behind a reverse proxy.

use axum::{
    extract::{Request, State},
    http::{uri::PathAndQuery, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use tracing::warn;

const MISMATCH_MESSAGE: &str = "Bad request. Check configuration.";

/// Strip `prefix` from `path` on a segment boundary. The bare prefix maps to `/`.
pub fn strip_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Wrap the whole router so paths are rewritten before routing happens.
pub fn with_prefix(app: Router, prefix: &str) -> Router {
    let prefix: Arc<str> = Arc::from(prefix);
    Router::new()
        .fallback_service(app)
        .layer(middleware::from_fn_with_state(prefix, prefix_middleware))
}

async fn prefix_middleware(
    State(prefix): State<Arc<str>>,
    mut req: Request,
    next: Next,
) -> Response {
    let rewritten = {
        let uri = req.uri();
        let Some(path) = strip_prefix(uri.path(), &prefix) else {
            warn!("Path {} is outside of prefix {}", uri.path(), prefix);
            return (StatusCode::NOT_FOUND, MISMATCH_MESSAGE).into_response();
        };
        let path_and_query = match uri.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        };

        let mut parts = uri.clone().into_parts();
        path_and_query
            .parse::<PathAndQuery>()
            .map_err(|e| format!("{}", e))
            .and_then(|pq| {
                parts.path_and_query = Some(pq);
                Uri::from_parts(parts).map_err(|e| format!("{}", e))
            })
    };

    match rewritten {
        Ok(uri) => *req.uri_mut() = uri,
        Err(e) => {
            warn!("Failed to rewrite request path: {}", e);
            return (StatusCode::NOT_FOUND, MISMATCH_MESSAGE).into_response();
        }
    }

    next.run(req).await
}
