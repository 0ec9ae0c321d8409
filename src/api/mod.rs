use axum::Router;
use std::sync::Arc;

use crate::AppState;

mod download;
mod titles;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api/download", download::routes())
        .nest("/api", titles::routes())
}
