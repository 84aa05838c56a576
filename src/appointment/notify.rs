//! Scheduled appointment reminders: a 3-day-ahead heads-up and a same-day
//! one, each pushed at most once per appointment.

use std::collections::HashSet;

use time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::repo::{self, Appointment};
use super::ReminderKind;
use crate::clock::today_bangkok;
use crate::line::client::OutgoingMessage;
use crate::line::replies::appointment_reminder_flex;
use crate::state::AppState;

pub async fn send_three_day_reminders(state: &AppState) -> anyhow::Result<()> {
    let target = today_bangkok() + Duration::days(3);
    send_reminders(state, target, ReminderKind::ThreeDay).await
}

pub async fn send_same_day_reminders(state: &AppState) -> anyhow::Result<()> {
    send_reminders(state, today_bangkok(), ReminderKind::SameDay).await
}

async fn send_reminders(
    state: &AppState,
    date: time::Date,
    kind: ReminderKind,
) -> anyhow::Result<()> {
    let rows = repo::list_on_date(&state.db, date).await?;
    let ids: Vec<Uuid> = rows.iter().map(|(a, _)| a.id).collect();
    let already_sent = repo::notified_appointment_ids(&state.db, &ids, kind).await?;

    let due = pending(rows, &already_sent);
    let skipped = ids.len() - due.len();
    info!(kind = kind.as_str(), %date, due = due.len(), skipped, "appointments due for reminder");

    let (sent, failed) = deliver(state, due, kind).await;
    info!(kind = kind.as_str(), sent, skipped, failed, "appointment reminders finished");
    Ok(())
}

/// De-dup filter: appointments that already got a successful delivery of
/// this kind are dropped here and never reach the push or log stage.
fn pending(
    rows: Vec<(Appointment, String)>,
    already_sent: &HashSet<Uuid>,
) -> Vec<(Appointment, String)> {
    rows.into_iter()
        .filter(|(appointment, _)| !already_sent.contains(&appointment.id))
        .collect()
}

async fn deliver(
    state: &AppState,
    due: Vec<(Appointment, String)>,
    kind: ReminderKind,
) -> (usize, usize) {
    let mut sent = 0usize;
    let mut failed = 0usize;
    for (appointment, line_user_id) in due {
        match push_reminder(state, &appointment, &line_user_id, kind).await {
            Ok(_) => sent += 1,
            Err(_) => failed += 1,
        }
    }
    (sent, failed)
}

/// Pushes the Flex bubble and records the outcome. A failed push gets a
/// failure row so the next run retries it; a failure to write the log row
/// itself is only logged.
async fn push_reminder(
    state: &AppState,
    appointment: &Appointment,
    line_user_id: &str,
    kind: ReminderKind,
) -> anyhow::Result<()> {
    let (alt_text, contents) = appointment_reminder_flex(appointment, kind);
    let result = state
        .chat
        .push(line_user_id, vec![OutgoingMessage::Flex { alt_text, contents }])
        .await;

    let (success, error_message) = match &result {
        Ok(_) => (true, None),
        Err(e) => {
            error!(error = %e, appointment_id = %appointment.id, "failed to push appointment reminder");
            (false, Some(e.to_string()))
        }
    };
    if let Err(e) = repo::insert_notification_log(
        &state.db,
        appointment.user_id,
        appointment.id,
        kind,
        success,
        error_message.as_deref(),
    )
    .await
    {
        warn!(error = %e, appointment_id = %appointment.id, "failed to record notification log");
    }
    result
}
