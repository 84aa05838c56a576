use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{error, instrument};
use uuid::Uuid;

use super::dto::{summarize, GlucoseReading, TodaySummary, UpdateGlucoseRequest};
use super::repo;
use crate::auth::jwt::AuthUser;
use crate::clock::{day_bounds, today_bangkok};
use crate::gemini::types::MealPeriod;
use crate::state::AppState;
use crate::users::User;

const USER_NOT_FOUND: (StatusCode, &str) = (StatusCode::NOT_FOUND, "User not found");

async fn resolve_user(
    state: &AppState,
    line_user_id: &str,
) -> Result<User, (StatusCode, String)> {
    match User::find_by_line_id(&state.db, line_user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err((USER_NOT_FOUND.0, USER_NOT_FOUND.1.into())),
        Err(e) => {
            error!(error = %e, "user lookup failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[instrument(skip(state))]
pub async fn today_summary(
    State(state): State<AppState>,
    AuthUser(line_user_id): AuthUser,
) -> Result<Json<TodaySummary>, (StatusCode, String)> {
    let user = resolve_user(&state, &line_user_id).await?;
    let today = today_bangkok();
    let (start, end) = day_bounds(today);
    let logs = repo::list_between(&state.db, user.id, start, end)
        .await
        .map_err(internal)?;
    let (target_min, target_max) = User::glucose_targets(&state.db, user.id)
        .await
        .map_err(internal)?;
    Ok(Json(summarize(&logs, target_min, target_max, today.to_string())))
}

#[instrument(skip(state))]
pub async fn today_readings(
    State(state): State<AppState>,
    AuthUser(line_user_id): AuthUser,
) -> Result<Json<Vec<GlucoseReading>>, (StatusCode, String)> {
    let user = resolve_user(&state, &line_user_id).await?;
    let (start, end) = day_bounds(today_bangkok());
    let logs = repo::list_between(&state.db, user.id, start, end)
        .await
        .map_err(internal)?;
    let (target_min, target_max) = User::glucose_targets(&state.db, user.id)
        .await
        .map_err(internal)?;
    let readings = logs
        .into_iter()
        .map(|log| GlucoseReading::from_log(log, target_min, target_max))
        .collect();
    Ok(Json(readings))
}

#[instrument(skip(state, body))]
pub async fn update_log(
    State(state): State<AppState>,
    AuthUser(line_user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateGlucoseRequest>,
) -> Result<Json<GlucoseReading>, (StatusCode, String)> {
    let user = resolve_user(&state, &line_user_id).await?;

    if let Some(period) = body.period.as_deref() {
        if MealPeriod::from_str(period).is_none() {
            return Err((StatusCode::BAD_REQUEST, format!("invalid period {period}")));
        }
    }

    let updated = repo::update(
        &state.db,
        id,
        user.id,
        body.value,
        body.period.as_deref(),
        body.note.as_deref(),
    )
    .await
    .map_err(internal)?
    // an existing log owned by someone else reads the same as no log at all
    .ok_or((StatusCode::NOT_FOUND, "Glucose log not found".to_string()))?;

    let (target_min, target_max) = User::glucose_targets(&state.db, user.id)
        .await
        .map_err(internal)?;
    Ok(Json(GlucoseReading::from_log(updated, target_min, target_max)))
}

#[instrument(skip(state))]
pub async fn delete_log(
    State(state): State<AppState>,
    AuthUser(line_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user = resolve_user(&state, &line_user_id).await?;
    let deleted = repo::delete(&state.db, id, user.id).await.map_err(internal)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Glucose log not found".to_string()))
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "glucose handler failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
