pub mod handlers;
pub mod repo;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/food", get(handlers::list))
        .route("/food/summary", get(handlers::summary))
}
