// Download links API - the transport boundary of the resolution engine
// The identifier must be present and non-blank before the core is invoked
// (400 otherwise). A failed canonical-title lookup is surfaced uniformly
// as 404 with an empty result; everything below that is best-effort and
// always answers 200.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::resolver::{ResolutionResult, ResolveError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:imdb_id", get(resolve_links))
        .route("/:imdb_id/:mirror_id", get(resolve_single_mirror))
}

/// GET /api/download/:imdb_id - resolve download links across every
/// configured mirror
async fn resolve_links(
    State(state): State<Arc<AppState>>,
    Path(imdb_id): Path<String>,
) -> (StatusCode, Json<ResolutionResult>) {
    let imdb_id = imdb_id.trim();
    if imdb_id.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ResolutionResult::empty(400)));
    }

    match state.resolver.resolve(imdb_id).await {
        Ok(links) => (StatusCode::OK, Json(ResolutionResult::ok(links))),
        Err(e) => failure_response(imdb_id, e),
    }
}

/// GET /api/download/:imdb_id/:mirror_id - single-mirror fast path
async fn resolve_single_mirror(
    State(state): State<Arc<AppState>>,
    Path((imdb_id, mirror_id)): Path<(String, String)>,
) -> (StatusCode, Json<ResolutionResult>) {
    let imdb_id = imdb_id.trim();
    if imdb_id.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ResolutionResult::empty(400)));
    }

    match state.resolver.resolve_single(imdb_id, &mirror_id).await {
        Ok(links) => (StatusCode::OK, Json(ResolutionResult::ok(links))),
        Err(e) => failure_response(imdb_id, e),
    }
}

fn failure_response(imdb_id: &str, err: ResolveError) -> (StatusCode, Json<ResolutionResult>) {
    match err {
        ResolveError::Lookup(e) => {
            tracing::warn!(imdb_id = %imdb_id, error = %e, "canonical title lookup failed");
            (StatusCode::NOT_FOUND, Json(ResolutionResult::empty(404)))
        }
        ResolveError::UnknownMirror(id) => {
            tracing::warn!(mirror = %id, "unknown mirror requested");
            (StatusCode::NOT_FOUND, Json(ResolutionResult::empty(404)))
        }
    }
}
