pub mod client;
pub mod events;
pub mod flex;
pub mod mapper;
pub mod replies;
pub mod signature;
pub mod types;
pub mod webhook;

use axum::{routing::post, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/line/webhook", post(webhook::webhook))
}
