use serde::Serialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo::Appointment;
use crate::media::Media;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppointmentStatus {
    Upcoming,
    Today,
    Past,
}

pub fn appointment_status(appointment_date: Date, today: Date) -> AppointmentStatus {
    if appointment_date == today {
        AppointmentStatus::Today
    } else if appointment_date > today {
        AppointmentStatus::Upcoming
    } else {
        AppointmentStatus::Past
    }
}

#[derive(Debug, Serialize)]
pub struct AppointmentItem {
    pub id: Uuid,
    pub appointment_date: Date,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub doctor_name: Option<String>,
    pub hospital_name: Option<String>,
    pub full_name: Option<String>,
    pub age: Option<String>,
    pub reason: Option<String>,
    pub details: Option<String>,
    pub status: AppointmentStatus,
    pub media: Vec<Media>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl AppointmentItem {
    pub fn from_row(appointment: Appointment, media: Vec<Media>, today: Date) -> Self {
        let status = appointment_status(appointment.appointment_date, today);
        Self {
            id: appointment.id,
            appointment_date: appointment.appointment_date,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            doctor_name: appointment.doctor_name,
            hospital_name: appointment.hospital_name,
            full_name: appointment.full_name,
            age: appointment.age,
            reason: appointment.reason,
            details: appointment.details,
            status,
            media,
            created_at: appointment.created_at,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct AppointmentSummary {
    pub total: usize,
    pub upcoming: usize,
    pub today: usize,
    pub past: usize,
}

pub fn summarize(items: &[AppointmentItem]) -> AppointmentSummary {
    let mut summary = AppointmentSummary {
        total: items.len(),
        ..Default::default()
    };
    for item in items {
        match item.status {
            AppointmentStatus::Upcoming => summary.upcoming += 1,
            AppointmentStatus::Today => summary.today += 1,
            AppointmentStatus::Past => summary.past += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn status_splits_on_today() {
        let today = date!(2026 - 08 - 27);
        assert_eq!(appointment_status(today, today), AppointmentStatus::Today);
        assert_eq!(
            appointment_status(date!(2026 - 08 - 28), today),
            AppointmentStatus::Upcoming
        );
        assert_eq!(
            appointment_status(date!(2026 - 08 - 26), today),
            AppointmentStatus::Past
        );
    }
}
