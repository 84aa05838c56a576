use serde::Serialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo::LabResult;
use crate::line::mapper::{FASTING_GLUCOSE_TYPE, HBA1C_TYPE};
use crate::media::Media;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LabStatus {
    Low,
    Normal,
    High,
    Critical,
}

/// Parses a "min-max" reference range. The minus sign in a negative lower
/// bound never occurs in practice, so a plain split is enough.
fn parse_range(range: &str) -> Option<(f64, f64)> {
    let (min, max) = range.split_once('-')?;
    let min: f64 = min.trim().parse().ok()?;
    let max: f64 = max.trim().parse().ok()?;
    Some((min, max))
}

/// Grades a lab value against its reference range. An unparseable or missing
/// range yields Normal rather than an error. Critical applies to extremes
/// that warrant prompt attention: fasting glucose at twice the upper bound,
/// or HbA1c at 8 or above.
pub fn lab_status(kind: &str, value: f64, reference_range: Option<&str>) -> LabStatus {
    let Some((min, max)) = reference_range.and_then(parse_range) else {
        return LabStatus::Normal;
    };
    if kind == FASTING_GLUCOSE_TYPE && value >= max * 2.0 {
        return LabStatus::Critical;
    }
    if kind == HBA1C_TYPE && value >= 8.0 {
        return LabStatus::Critical;
    }
    if value < min {
        LabStatus::Low
    } else if value > max {
        LabStatus::High
    } else {
        LabStatus::Normal
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabItem {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    pub unit: String,
    pub reference_range: Option<String>,
    pub test_date: Date,
    pub note: Option<String>,
    pub status: LabStatus,
    pub media: Vec<Media>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl LabItem {
    pub fn from_row(result: LabResult, media: Vec<Media>) -> Self {
        let status = lab_status(&result.kind, result.value, result.reference_range.as_deref());
        Self {
            id: result.id,
            kind: result.kind,
            value: result.value,
            unit: result.unit,
            reference_range: result.reference_range,
            test_date: result.test_date,
            note: result.note,
            status,
            media,
            created_at: result.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabPage {
    pub items: Vec<LabItem>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub available_types: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grades_against_the_range() {
        assert_eq!(lab_status(FASTING_GLUCOSE_TYPE, 65.0, Some("70-99")), LabStatus::Low);
        assert_eq!(lab_status(FASTING_GLUCOSE_TYPE, 85.0, Some("70-99")), LabStatus::Normal);
        assert_eq!(lab_status(FASTING_GLUCOSE_TYPE, 130.0, Some("70-99")), LabStatus::High);
    }

    #[test]
    fn extreme_values_are_critical() {
        // twice the upper bound of 99
        assert_eq!(
            lab_status(FASTING_GLUCOSE_TYPE, 198.0, Some("70-99")),
            LabStatus::Critical
        );
        assert_eq!(lab_status(HBA1C_TYPE, 8.0, Some("4.0-5.6")), LabStatus::Critical);
        assert_eq!(lab_status(HBA1C_TYPE, 7.9, Some("4.0-5.6")), LabStatus::High);
    }

    #[test]
    fn unparseable_range_reads_as_normal() {
        assert_eq!(lab_status(FASTING_GLUCOSE_TYPE, 500.0, None), LabStatus::Normal);
        assert_eq!(
            lab_status(FASTING_GLUCOSE_TYPE, 500.0, Some("ปกติ")),
            LabStatus::Normal
        );
        assert_eq!(lab_status(HBA1C_TYPE, 9.0, Some("<5.7")), LabStatus::Normal);
    }
}
