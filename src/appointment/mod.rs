pub mod dto;
pub mod handlers;
pub mod notify;
pub mod repo;

use axum::{routing::get, Router};

use crate::state::AppState;

/// The two appointment reminder kinds a NotificationLog row can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    ThreeDay,
    SameDay,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::ThreeDay => "3_DAY_REMINDER",
            ReminderKind::SameDay => "SAME_DAY_REMINDER",
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(handlers::list))
        .route("/appointments/summary", get(handlers::summary))
}
