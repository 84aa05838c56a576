pub mod dto;
pub mod handlers;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/history/glucose/chart", get(handlers::glucose_chart))
        .route("/history/glucose/list", get(handlers::glucose_list))
        .route("/history/summary", get(handlers::health_summary))
}
