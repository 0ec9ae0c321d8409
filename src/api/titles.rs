// Titles API - catalog passthrough composition
// Composes several catalog resources into one response; individual
// sub-fetches degrade to null fields rather than failing the request.
// When the external ids carry an IMDb id, resolved download links are
// embedded alongside the catalog data.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/title/:media_type/:id", get(get_title))
        .route("/episode/:id/:season/:episode", get(get_episode))
}

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub season: Option<i32>,
}

/// GET /api/title/:media_type/:id - composed title details, with download
/// links embedded when the catalog knows the title's IMDb id
async fn get_title(
    State(state): State<Arc<AppState>>,
    Path((media_type, id)): Path<(String, String)>,
    Query(query): Query<TitleQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if media_type != "movie" && media_type != "tv" {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("unknown media type `{}`", media_type),
        ));
    }

    let catalog = &state.catalog;
    let (details, ids, credits, videos) = tokio::join!(
        catalog.title_details(&media_type, &id),
        catalog.external_ids(&media_type, &id),
        catalog.credits(&media_type, &id),
        catalog.trailer_keys(&media_type, &id),
    );

    let details = or_null(details, "details");
    let ids = or_null(ids, "external_ids");
    let credits = trim_credits(or_null(credits, "credits"));
    let videos = videos.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "catalog videos fetch failed");
        Vec::new()
    });

    let season = match query.season {
        Some(season) => or_null(state.catalog.season_details(&id, season).await, "season"),
        None => Value::Array(Vec::new()),
    };

    let download_links = match ids.get("imdb_id").and_then(Value::as_str) {
        Some(imdb_id) => match state.resolver.resolve(imdb_id).await {
            Ok(links) => Some(links),
            Err(e) => {
                tracing::warn!(imdb_id = %imdb_id, error = %e, "download-link resolution failed");
                None
            }
        },
        None => None,
    };

    Ok(Json(json!({
        "details": details,
        "ids": ids,
        "credits": credits,
        "videos": videos,
        "season": season,
        "downloadLinks": download_links,
    })))
}

/// GET /api/episode/:id/:season/:episode - episode details joined with its
/// season
async fn get_episode(
    State(state): State<Arc<AppState>>,
    Path((id, season, episode)): Path<(String, i32, i32)>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let (episode_data, season_data) = tokio::join!(
        state.catalog.episode_details(&id, season, episode),
        state.catalog.season_details(&id, season),
    );

    let mut body = episode_data.map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;
    let season_data = season_data.map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;

    if let Some(object) = body.as_object_mut() {
        object.insert("seasonData".to_string(), season_data);
    }
    for key in ["crew", "guest_stars"] {
        if let Some(list) = body.get_mut(key).and_then(Value::as_array_mut) {
            list.truncate(20);
        }
    }

    Ok(Json(body))
}

fn or_null(result: anyhow::Result<Value>, resource: &str) -> Value {
    result.unwrap_or_else(|e| {
        tracing::warn!(resource = resource, error = %e, "catalog sub-fetch failed");
        Value::Null
    })
}

/// Cast and crew lists can run to hundreds of entries; keep the top 20.
fn trim_credits(mut credits: Value) -> Value {
    for key in ["cast", "crew"] {
        if let Some(list) = credits.get_mut(key).and_then(Value::as_array_mut) {
            list.truncate(20);
        }
    }
    credits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_credits_caps_lists() {
        let credits = json!({
            "cast": (0..30).map(|i| json!({ "name": format!("actor-{}", i) })).collect::<Vec<_>>(),
            "crew": [{ "name": "director" }],
        });
        let trimmed = trim_credits(credits);
        assert_eq!(trimmed["cast"].as_array().unwrap().len(), 20);
        assert_eq!(trimmed["crew"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_trim_credits_tolerates_null() {
        assert_eq!(trim_credits(Value::Null), Value::Null);
    }
}
