use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, instrument};
use uuid::Uuid;

use super::repo::{self, FoodAnalysis};
use crate::auth::jwt::AuthUser;
use crate::clock::{day_bounds, today_bangkok, week_start};
use crate::media::Media;
use crate::state::AppState;
use crate::users::User;

#[derive(Debug, Serialize)]
pub struct FoodItem {
    pub id: Uuid,
    pub food_name: Option<String>,
    pub carbs_gram: Option<f64>,
    pub sugar_gram: Option<f64>,
    pub advice: Option<String>,
    pub media: Vec<Media>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl FoodItem {
    fn from_row(analysis: FoodAnalysis, media: Vec<Media>) -> Self {
        Self {
            id: analysis.id,
            food_name: analysis.food_name,
            carbs_gram: analysis.carbs_gram,
            sugar_gram: analysis.sugar_gram,
            advice: analysis.advice,
            media,
            created_at: analysis.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSummary {
    pub total: i64,
    pub today: i64,
    pub this_week: i64,
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(line_user_id): AuthUser,
) -> Result<Json<Vec<FoodItem>>, (StatusCode, String)> {
    let user = resolve_user(&state, &line_user_id).await?;
    let rows = repo::list_by_user(&state.db, user.id).await.map_err(internal)?;
    Ok(Json(
        rows.into_iter()
            .map(|(analysis, media)| FoodItem::from_row(analysis, media))
            .collect(),
    ))
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    AuthUser(line_user_id): AuthUser,
) -> Result<Json<FoodSummary>, (StatusCode, String)> {
    let user = resolve_user(&state, &line_user_id).await?;
    let today = today_bangkok();
    let (today_start, _) = day_bounds(today);
    let (week_start, _) = day_bounds(week_start(today));

    let total = repo::count_since(&state.db, user.id, None).await.map_err(internal)?;
    let today_count = repo::count_since(&state.db, user.id, Some(today_start))
        .await
        .map_err(internal)?;
    let week_count = repo::count_since(&state.db, user.id, Some(week_start))
        .await
        .map_err(internal)?;

    Ok(Json(FoodSummary {
        total,
        today: today_count,
        this_week: week_count,
    }))
}

async fn resolve_user(
    state: &AppState,
    line_user_id: &str,
) -> Result<User, (StatusCode, String)> {
    User::find_by_line_id(&state.db, line_user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "food handler failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
