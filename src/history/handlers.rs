use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use time::Duration;
use tracing::{error, instrument};

use super::dto::{
    chart, month_bounds, week_bounds, GlucoseChart, HealthSummary, HistoryPage, HistoryPeriod,
    Pagination, Trends,
};
use crate::auth::jwt::AuthUser;
use crate::clock::{day_bounds, month_start, prev_month_start, today_bangkok, week_start};
use crate::glucose::dto::GlucoseReading;
use crate::glucose::repo;
use crate::state::AppState;
use crate::users::User;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub period: Option<HistoryPeriod>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub period: Option<HistoryPeriod>,
}

#[instrument(skip(state))]
pub async fn glucose_chart(
    State(state): State<AppState>,
    AuthUser(line_user_id): AuthUser,
    Query(query): Query<ChartQuery>,
) -> Result<Json<GlucoseChart>, (StatusCode, String)> {
    let user = resolve_user(&state, &line_user_id).await?;
    let period = query.period.unwrap_or(HistoryPeriod::Today);
    let (start, end) = period.bounds(today_bangkok());
    let logs = repo::list_between(&state.db, user.id, start, end)
        .await
        .map_err(internal)?;
    Ok(Json(chart(logs, period.grouping())))
}

#[instrument(skip(state))]
pub async fn glucose_list(
    State(state): State<AppState>,
    AuthUser(line_user_id): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<HistoryPage>, (StatusCode, String)> {
    let user = resolve_user(&state, &line_user_id).await?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let window = query.period.map(|p| p.bounds(today_bangkok()));

    let logs = repo::list_page(&state.db, user.id, window, limit, (page - 1) * limit)
        .await
        .map_err(internal)?;
    let (total, _, _) = repo::aggregate(&state.db, user.id, window)
        .await
        .map_err(internal)?;
    let (target_min, target_max) = User::glucose_targets(&state.db, user.id)
        .await
        .map_err(internal)?;

    let items = logs
        .into_iter()
        .map(|log| GlucoseReading::from_log(log, target_min, target_max))
        .collect();
    Ok(Json(HistoryPage {
        items,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        },
    }))
}

/// Overall counters plus week/month averages and their previous-window
/// counterparts, for the app's trend arrows. Windows with no readings read
/// as a 0 average.
#[instrument(skip(state))]
pub async fn health_summary(
    State(state): State<AppState>,
    AuthUser(line_user_id): AuthUser,
) -> Result<Json<HealthSummary>, (StatusCode, String)> {
    let user = resolve_user(&state, &line_user_id).await?;
    let today = today_bangkok();

    let (total_records, average, last_record_date) = repo::aggregate(&state.db, user.id, None)
        .await
        .map_err(internal)?;

    let this_week = week_bounds(today);
    let last_week_start = week_start(today) - Duration::days(7);
    let last_week = (day_bounds(last_week_start).0, this_week.0);
    let this_month = month_bounds(today);
    let last_month = (day_bounds(prev_month_start(today)).0, day_bounds(month_start(today)).0);

    let (_, this_week_avg, _) = repo::aggregate(&state.db, user.id, Some(this_week))
        .await
        .map_err(internal)?;
    let (_, last_week_avg, _) = repo::aggregate(&state.db, user.id, Some(last_week))
        .await
        .map_err(internal)?;
    let (_, this_month_avg, _) = repo::aggregate(&state.db, user.id, Some(this_month))
        .await
        .map_err(internal)?;
    let (_, last_month_avg, _) = repo::aggregate(&state.db, user.id, Some(last_month))
        .await
        .map_err(internal)?;

    Ok(Json(HealthSummary {
        total_records,
        average_glucose: average.unwrap_or(0.0),
        last_record_date,
        weekly_average: this_week_avg.unwrap_or(0.0),
        monthly_average: this_month_avg.unwrap_or(0.0),
        trends: Trends {
            this_week: this_week_avg.unwrap_or(0.0),
            last_week: last_week_avg.unwrap_or(0.0),
            this_month: this_month_avg.unwrap_or(0.0),
            last_month: last_month_avg.unwrap_or(0.0),
        },
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
    error!(error = %e, "history handler failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
