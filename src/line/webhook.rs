use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use bytes::Bytes;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::events::handle_event;
use super::signature::verify_signature;
use super::types::WebhookBody;
use crate::state::AppState;

/// POST /line/webhook
///
/// Signature verification runs over the exact raw body before anything is
/// parsed. Events are processed as independent tasks, all joined before the
/// platform gets its 200.
#[instrument(skip_all)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let signature = headers
        .get("x-line-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or((StatusCode::UNAUTHORIZED, "Signature not provided".into()))?;

    if !verify_signature(&state.config.line.channel_secret, &body, signature) {
        warn!("webhook signature mismatch");
        return Err((StatusCode::UNAUTHORIZED, "Invalid signature".into()));
    }

    let body: WebhookBody = serde_json::from_slice(&body)
        .map_err(|_| (StatusCode::UNPROCESSABLE_ENTITY, "Invalid request body".into()))?;

    info!(events = body.events.len(), "webhook received");

    let handles: Vec<_> = body
        .events
        .into_iter()
        .map(|event| tokio::spawn(handle_event(state.clone(), event)))
        .collect();
    for handle in handles {
        // A panicking event task is contained here; the rest still run.
        if let Err(e) = handle.await {
            warn!(error = %e, "event task aborted");
        }
    }

    Ok(Json(json!({ "message": "OK" })))
}
