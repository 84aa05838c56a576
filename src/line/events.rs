//! Per-event pipeline: normalize, resolve the user, dispatch by modality,
//! persist, reply. Each inbound event runs this end to end in its own task
//! with no shared mutable state.

use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use super::client::OutgoingMessage;
use super::mapper;
use super::replies;
use super::types::{accept, AcceptedEvent, IncomingMessage, WebhookEvent};
use crate::clock::today_bangkok;
use crate::gemini::service::{analyze_image, analyze_text, diabetes_answer, transcribe_audio};
use crate::gemini::types::{ImageAnalysis, TextAnalysis};
use crate::state::AppState;
use crate::storage::upload_image;
use crate::users::User;
use crate::{appointment, food, glucose, lab};

/// Entry point for one webhook event. Rejected events are silent no-ops;
/// accepted ones always end in exactly one reply, even when the pipeline
/// fails somewhere downstream.
#[instrument(skip_all, fields(event_kind = %event.kind))]
pub async fn handle_event(state: AppState, event: WebhookEvent) {
    let Some(accepted) = accept(&event) else {
        return;
    };
    let reply_token = accepted.reply_token.clone();
    if let Err(e) = process(&state, accepted).await {
        error!(error = %e, "event pipeline failed");
        let _ = state
            .chat
            .reply(&reply_token, vec![OutgoingMessage::text(replies::GENERIC_ERROR)])
            .await;
    }
}

async fn process(state: &AppState, event: AcceptedEvent) -> anyhow::Result<()> {
    let user = User::upsert_by_line_id(&state.db, &event.line_user_id).await?;
    match &event.message {
        IncomingMessage::Text { text, .. } => {
            handle_text(state, &user, &event.reply_token, text).await
        }
        IncomingMessage::Audio { id } => handle_audio(state, &user, &event.reply_token, id).await,
        IncomingMessage::Image { id } => handle_image(state, &user, &event.reply_token, id).await,
        // Modalities outside classification scope are ignored without reply.
        IncomingMessage::Unsupported => Ok(()),
    }
}

async fn reply_text(state: &AppState, reply_token: &str, text: impl Into<String>) -> anyhow::Result<()> {
    state
        .chat
        .reply(reply_token, vec![OutgoingMessage::text(text)])
        .await
}

pub async fn handle_text(
    state: &AppState,
    user: &User,
    reply_token: &str,
    text: &str,
) -> anyhow::Result<()> {
    let analysis = analyze_text(state.model.as_ref(), text).await;
    dispatch_text(state, user, reply_token, analysis).await
}

async fn dispatch_text(
    state: &AppState,
    user: &User,
    reply_token: &str,
    analysis: TextAnalysis,
) -> anyhow::Result<()> {
    match analysis {
        TextAnalysis::Logging { value, timing } => {
            // A logging classification without a usable number must not turn
            // into a zero-valued record.
            let Some(value) = value else {
                warn!("logging classification without a numeric value");
                return reply_text(state, reply_token, replies::SAVE_ERROR).await;
            };
            match glucose::repo::insert(
                &state.db,
                user.id,
                value,
                timing.as_str(),
                OffsetDateTime::now_utc(),
            )
            .await
            {
                Ok(log) => {
                    info!(log_id = %log.id, value, "glucose log recorded");
                    reply_text(state, reply_token, replies::glucose_saved(value, timing)).await
                }
                Err(e) => {
                    error!(error = %e, "failed to record glucose log");
                    reply_text(state, reply_token, replies::SAVE_ERROR).await
                }
            }
        }
        TextAnalysis::Question { query } => {
            let answer = diabetes_answer(state.model.as_ref(), &query).await;
            let text = if answer.trim().is_empty() {
                replies::ANSWER_FALLBACK.to_string()
            } else {
                answer
            };
            reply_text(state, reply_token, text).await
        }
        TextAnalysis::Unknown | TextAnalysis::Error => {
            reply_text(state, reply_token, replies::DID_NOT_UNDERSTAND).await
        }
    }
}

async fn handle_audio(
    state: &AppState,
    user: &User,
    reply_token: &str,
    message_id: &str,
) -> anyhow::Result<()> {
    let audio = state.chat.get_message_content(message_id).await?;
    match transcribe_audio(state.model.as_ref(), audio, None).await {
        Ok(transcript) if !transcript.is_empty() => {
            info!(len = transcript.len(), "audio transcribed, re-entering text path");
            handle_text(state, user, reply_token, &transcript).await
        }
        Ok(_) => reply_text(state, reply_token, replies::TRANSCRIPTION_FAILED).await,
        Err(e) => {
            warn!(error = %e, "transcription failed");
            reply_text(state, reply_token, replies::TRANSCRIPTION_FAILED).await
        }
    }
}

async fn handle_image(
    state: &AppState,
    user: &User,
    reply_token: &str,
    message_id: &str,
) -> anyhow::Result<()> {
    let image = state.chat.get_message_content(message_id).await?;
    let analysis = analyze_image(state.model.as_ref(), image.clone(), "image/jpeg").await;

    // The upload gate is decided before any storage or database I/O, so a
    // classification that produces no record never pays for an upload.
    if !mapper::should_upload(&analysis) {
        let msg = match &analysis {
            ImageAnalysis::LabResult(_) => replies::LAB_NOT_FOUND,
            ImageAnalysis::AppointmentSlip(_) => replies::APPOINTMENT_NOT_FOUND,
            _ => replies::IMAGE_NOT_PROCESSABLE,
        };
        return reply_text(state, reply_token, msg).await;
    }

    let url = upload_image(state.storage.as_ref(), image, user.id, "image/jpeg", "jpg").await?;

    match analysis {
        ImageAnalysis::Food(food_fields) => {
            let analysis_row =
                food::repo::insert_with_media(&state.db, user.id, &food_fields, &url).await?;
            info!(analysis_id = %analysis_row.id, "food analysis recorded");
            reply_text(state, reply_token, replies::food_summary(&food_fields)).await
        }
        ImageAnalysis::LabResult(lab_fields) => {
            let rows = mapper::lab_rows(&lab_fields);
            let test_date = lab_fields
                .record_date
                .as_deref()
                .and_then(mapper::parse_ymd)
                .unwrap_or_else(today_bangkok);
            let created =
                lab::repo::insert_from_image(&state.db, user.id, &rows, test_date, &url).await?;
            info!(count = created.len(), "lab results recorded");
            reply_text(state, reply_token, replies::LAB_SAVED).await
        }
        ImageAnalysis::AppointmentSlip(slip) => {
            // Guaranteed parseable by the upload gate.
            let date = slip
                .appointment_date
                .as_deref()
                .and_then(mapper::parse_ymd)
                .ok_or_else(|| anyhow::anyhow!("appointment date vanished after gating"))?;
            let appointment =
                appointment::repo::insert_with_media(&state.db, user.id, date, &slip, &url).await?;
            info!(appointment_id = %appointment.id, "appointment recorded");
            reply_text(
                state,
                reply_token,
                replies::appointment_saved(date, slip.start_time.as_deref(), slip.end_time.as_deref()),
            )
            .await
        }
        ImageAnalysis::Other | ImageAnalysis::Error => {
            reply_text(state, reply_token, replies::IMAGE_NOT_PROCESSABLE).await
        }
    }
}
