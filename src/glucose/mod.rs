pub mod dto;
pub mod handlers;
pub mod reminder;
pub mod repo;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/glucose/summary", get(handlers::today_summary))
        .route("/glucose/readings", get(handlers::today_readings))
        .route(
            "/glucose/:id",
            patch(handlers::update_log).delete(handlers::delete_log),
        )
}
