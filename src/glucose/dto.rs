use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::GlucoseLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GlucoseLevel {
    Low,
    Normal,
    High,
}

/// Classifies a reading against the user's target band.
pub fn glucose_status(value: f64, target_min: i32, target_max: i32) -> GlucoseLevel {
    if value <= target_min as f64 {
        GlucoseLevel::Low
    } else if value >= target_max as f64 {
        GlucoseLevel::High
    } else {
        GlucoseLevel::Normal
    }
}

#[derive(Debug, Serialize)]
pub struct GlucoseReading {
    pub id: Uuid,
    pub value: f64,
    pub status: GlucoseLevel,
    pub period: String,
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

impl GlucoseReading {
    pub fn from_log(log: GlucoseLog, target_min: i32, target_max: i32) -> Self {
        Self {
            id: log.id,
            value: log.value,
            status: glucose_status(log.value, target_min, target_max),
            period: log.period,
            note: log.note,
            recorded_at: log.recorded_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LatestReading {
    pub value: f64,
    pub status: GlucoseLevel,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct TodaySummary {
    pub measurement_count: usize,
    pub latest: Option<LatestReading>,
    pub average: Option<f64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGlucoseRequest {
    pub value: Option<f64>,
    pub period: Option<String>,
    pub note: Option<String>,
}

/// Today's aggregate over logs already sorted newest-first.
pub fn summarize(
    logs: &[GlucoseLog],
    target_min: i32,
    target_max: i32,
    date: String,
) -> TodaySummary {
    let latest = logs.first().map(|log| LatestReading {
        value: log.value,
        status: glucose_status(log.value, target_min, target_max),
        recorded_at: log.recorded_at,
    });
    let (average, minimum, maximum) = if logs.is_empty() {
        (None, None, None)
    } else {
        let values: Vec<f64> = logs.iter().map(|l| l.value).collect();
        let sum: f64 = values.iter().sum();
        (
            Some((sum / values.len() as f64).round()),
            Some(values.iter().cloned().fold(f64::INFINITY, f64::min)),
            Some(values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)),
        )
    };
    TodaySummary {
        measurement_count: logs.len(),
        latest,
        average,
        minimum,
        maximum,
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(value: f64, minutes_ago: i64) -> GlucoseLog {
        GlucoseLog {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            value,
            period: "OTHER".into(),
            note: None,
            recorded_at: OffsetDateTime::now_utc() - time::Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn status_uses_inclusive_band_edges() {
        assert_eq!(glucose_status(80.0, 80, 180), GlucoseLevel::Low);
        assert_eq!(glucose_status(81.0, 80, 180), GlucoseLevel::Normal);
        assert_eq!(glucose_status(179.0, 80, 180), GlucoseLevel::Normal);
        assert_eq!(glucose_status(180.0, 80, 180), GlucoseLevel::High);
    }

    #[test]
    fn summary_over_empty_day() {
        let s = summarize(&[], 80, 180, "2026-08-27".into());
        assert_eq!(s.measurement_count, 0);
        assert!(s.latest.is_none());
        assert!(s.average.is_none());
    }

    #[test]
    fn summary_takes_latest_and_round_average() {
        let logs = vec![log(190.0, 5), log(100.0, 60), log(130.0, 120)];
        let s = summarize(&logs, 80, 180, "2026-08-27".into());
        assert_eq!(s.measurement_count, 3);
        let latest = s.latest.unwrap();
        assert_eq!(latest.value, 190.0);
        assert_eq!(latest.status, GlucoseLevel::High);
        assert_eq!(s.average, Some(140.0));
        assert_eq!(s.minimum, Some(100.0));
        assert_eq!(s.maximum, Some(190.0));
    }
}
