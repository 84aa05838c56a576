use std::collections::HashSet;

use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::appointment::ReminderKind;
use crate::gemini::types::AppointmentFields;
use crate::media::{self, Media, MediaParent};

#[derive(Debug, Clone, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub appointment_date: Date,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub doctor_name: Option<String>,
    pub hospital_name: Option<String>,
    pub full_name: Option<String>,
    pub age: Option<String>,
    pub reason: Option<String>,
    pub details: Option<String>,
    pub created_at: OffsetDateTime,
}

pub async fn insert_with_media(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
    slip: &AppointmentFields,
    media_url: &str,
) -> anyhow::Result<Appointment> {
    let mut tx = db.begin().await?;
    let appointment = sqlx::query_as::<_, Appointment>(
        r#"
        INSERT INTO appointments
            (user_id, appointment_date, start_time, end_time, doctor_name,
             hospital_name, full_name, age, reason, details)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, user_id, appointment_date, start_time, end_time, doctor_name,
                  hospital_name, full_name, age, reason, details, created_at
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(&slip.start_time)
    .bind(&slip.end_time)
    .bind(&slip.doctor_name)
    .bind(&slip.hospital_name)
    .bind(&slip.full_name)
    .bind(&slip.age)
    .bind(&slip.reason)
    .bind(&slip.details)
    .fetch_one(&mut *tx)
    .await?;
    media::insert_tx(&mut tx, MediaParent::Appointment(appointment.id), media_url).await?;
    tx.commit().await?;
    Ok(appointment)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
) -> anyhow::Result<Vec<(Appointment, Vec<Media>)>> {
    let appointments = sqlx::query_as::<_, Appointment>(
        r#"
        SELECT id, user_id, appointment_date, start_time, end_time, doctor_name,
               hospital_name, full_name, age, reason, details, created_at
        FROM appointments
        WHERE user_id = $1
        ORDER BY appointment_date DESC, created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let ids: Vec<Uuid> = appointments.iter().map(|a| a.id).collect();
    let mut media_by_parent = std::collections::HashMap::<Uuid, Vec<Media>>::new();
    for (parent_id, m) in media::list_for_parents(db, "appointment_id", &ids).await? {
        media_by_parent.entry(parent_id).or_default().push(m);
    }

    Ok(appointments
        .into_iter()
        .map(|a| {
            let media = media_by_parent.remove(&a.id).unwrap_or_default();
            (a, media)
        })
        .collect())
}

/// Appointments falling on one calendar date, with the owner's platform id.
pub async fn list_on_date(
    db: &PgPool,
    date: Date,
) -> anyhow::Result<Vec<(Appointment, String)>> {
    #[derive(FromRow)]
    struct Row {
        #[sqlx(flatten)]
        appointment: Appointment,
        line_user_id: String,
    }

    let rows = sqlx::query_as::<_, Row>(
        r#"
        SELECT a.id, a.user_id, a.appointment_date, a.start_time, a.end_time,
               a.doctor_name, a.hospital_name, a.full_name, a.age, a.reason,
               a.details, a.created_at, u.line_user_id
        FROM appointments a
        JOIN users u ON u.id = a.user_id
        WHERE a.appointment_date = $1
        ORDER BY a.created_at
        "#,
    )
    .bind(date)
    .fetch_all(db)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| (r.appointment, r.line_user_id))
        .collect())
}

/// De-duplication guard: the ids among `appointment_ids` that already have a
/// successful delivery of this kind on record. Failed attempts do not count,
/// so they are retried on the next run.
pub async fn notified_appointment_ids(
    db: &PgPool,
    appointment_ids: &[Uuid],
    kind: ReminderKind,
) -> anyhow::Result<HashSet<Uuid>> {
    if appointment_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let rows = sqlx::query_as::<_, (Uuid,)>(
        r#"
        SELECT DISTINCT appointment_id
        FROM notification_logs
        WHERE appointment_id = ANY($1) AND kind = $2 AND success
        "#,
    )
    .bind(appointment_ids)
    .bind(kind.as_str())
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Append-only delivery record; never updated or deleted.
pub async fn insert_notification_log(
    db: &PgPool,
    user_id: Uuid,
    appointment_id: Uuid,
    kind: ReminderKind,
    success: bool,
    error_message: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO notification_logs (user_id, appointment_id, kind, success, error_message)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(user_id)
    .bind(appointment_id)
    .bind(kind.as_str())
    .bind(success)
    .bind(error_message)
    .execute(db)
    .await?;
    Ok(())
}
