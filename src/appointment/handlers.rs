use axum::{extract::State, http::StatusCode, Json};
use tracing::{error, instrument};

use super::dto::{summarize, AppointmentItem, AppointmentSummary};
use super::repo;
use crate::auth::jwt::AuthUser;
use crate::clock::today_bangkok;
use crate::state::AppState;
use crate::users::User;

async fn list_items(
    state: &AppState,
    line_user_id: &str,
) -> Result<Vec<AppointmentItem>, (StatusCode, String)> {
    let user = User::find_by_line_id(&state.db, line_user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
    let today = today_bangkok();
    let rows = repo::list_by_user(&state.db, user.id).await.map_err(internal)?;
    Ok(rows
        .into_iter()
        .map(|(appointment, media)| AppointmentItem::from_row(appointment, media, today))
        .collect())
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(line_user_id): AuthUser,
) -> Result<Json<Vec<AppointmentItem>>, (StatusCode, String)> {
    Ok(Json(list_items(&state, &line_user_id).await?))
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    AuthUser(line_user_id): AuthUser,
) -> Result<Json<AppointmentSummary>, (StatusCode, String)> {
    let items = list_items(&state, &line_user_id).await?;
    Ok(Json(summarize(&items)))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "appointment handler failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
