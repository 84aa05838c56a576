pub mod handlers;
pub mod jwt;
pub mod liff;

use axum::{routing::post, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/line-verify", post(handlers::line_verify))
        // refresh is the same exchange: a still-valid ID token mints a new JWT
        .route("/auth/refresh-token", post(handlers::line_verify))
        .route("/auth/check-token", post(handlers::check_token))
}
