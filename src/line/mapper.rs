//! Pure translation of classifier output into the rows that get written.
//!
//! Everything here is decided before any I/O, so an image that will produce
//! no queryable record never pays for an upload.

use time::macros::format_description;
use time::Date;

use crate::gemini::types::{ImageAnalysis, LabFields};

pub const FASTING_GLUCOSE_TYPE: &str = "Fasting Glucose";
pub const HBA1C_TYPE: &str = "HbA1c";

const DEFAULT_FASTING_RANGE: &str = "70-99";
const DEFAULT_HBA1C_RANGE: &str = "4.0-5.6";
const IMAGE_NOTE: &str = "วิเคราะห์จากรูปภาพ";

/// One lab row to persist. A single image can yield several of these, all
/// sharing the same uploaded media URL.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLabResult {
    pub kind: &'static str,
    pub value: f64,
    pub unit: String,
    pub reference_range: String,
    pub note: &'static str,
}

/// Each present value becomes its own row; neither present means no rows,
/// which the caller must treat as "nothing to persist, nothing to upload".
pub fn lab_rows(lab: &LabFields) -> Vec<NewLabResult> {
    let mut rows = Vec::new();
    if let Some(value) = lab.fasting_glucose {
        let reference_range = match (lab.normal_range_min, lab.normal_range_max) {
            (Some(min), Some(max)) => format!("{min}-{max}"),
            _ => DEFAULT_FASTING_RANGE.to_string(),
        };
        rows.push(NewLabResult {
            kind: FASTING_GLUCOSE_TYPE,
            value,
            unit: lab
                .fasting_glucose_unit
                .clone()
                .unwrap_or_else(|| "mg/dL".into()),
            reference_range,
            note: IMAGE_NOTE,
        });
    }
    if let Some(value) = lab.hba1c {
        rows.push(NewLabResult {
            kind: HBA1C_TYPE,
            value,
            unit: lab.hba1c_unit.clone().unwrap_or_else(|| "%".into()),
            reference_range: DEFAULT_HBA1C_RANGE.to_string(),
            note: IMAGE_NOTE,
        });
    }
    rows
}

/// Upload gate, evaluated before any storage I/O.
pub fn should_upload(analysis: &ImageAnalysis) -> bool {
    match analysis {
        ImageAnalysis::Food(_) => true,
        ImageAnalysis::LabResult(lab) => !lab_rows(lab).is_empty(),
        ImageAnalysis::AppointmentSlip(slip) => slip
            .appointment_date
            .as_deref()
            .and_then(parse_ymd)
            .is_some(),
        ImageAnalysis::Other | ImageAnalysis::Error => false,
    }
}

/// Parses the classifier's `YYYY-MM-DD` date strings.
pub fn parse_ymd(s: &str) -> Option<Date> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::types::AppointmentFields;
    use time::macros::date;

    #[test]
    fn both_values_yield_two_rows() {
        let lab = LabFields {
            fasting_glucose: Some(110.0),
            hba1c: Some(6.2),
            normal_range_min: Some(70.0),
            normal_range_max: Some(100.0),
            fasting_glucose_unit: None,
            hba1c_unit: None,
            record_date: None,
        };
        let rows = lab_rows(&lab);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, FASTING_GLUCOSE_TYPE);
        assert_eq!(rows[0].reference_range, "70-100");
        assert_eq!(rows[0].unit, "mg/dL");
        assert_eq!(rows[1].kind, HBA1C_TYPE);
        assert_eq!(rows[1].reference_range, "4.0-5.6");
        assert_eq!(rows[1].unit, "%");
    }

    #[test]
    fn partial_range_falls_back_to_default() {
        let lab = LabFields {
            fasting_glucose: Some(95.0),
            normal_range_min: Some(70.0),
            ..Default::default()
        };
        assert_eq!(lab_rows(&lab)[0].reference_range, "70-99");
    }

    #[test]
    fn no_values_yield_no_rows_and_no_upload() {
        let lab = LabFields::default();
        assert!(lab_rows(&lab).is_empty());
        assert!(!should_upload(&ImageAnalysis::LabResult(lab)));
    }

    #[test]
    fn appointment_upload_requires_parseable_date() {
        let with_date = ImageAnalysis::AppointmentSlip(AppointmentFields {
            appointment_date: Some("2026-09-15".into()),
            ..Default::default()
        });
        assert!(should_upload(&with_date));

        let garbage_date = ImageAnalysis::AppointmentSlip(AppointmentFields {
            appointment_date: Some("พรุ่งนี้".into()),
            ..Default::default()
        });
        assert!(!should_upload(&garbage_date));

        let missing = ImageAnalysis::AppointmentSlip(AppointmentFields::default());
        assert!(!should_upload(&missing));
    }

    #[test]
    fn food_always_uploads_and_error_never_does() {
        assert!(should_upload(&ImageAnalysis::Food(Default::default())));
        assert!(!should_upload(&ImageAnalysis::Other));
        assert!(!should_upload(&ImageAnalysis::Error));
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_ymd("2026-09-15"), Some(date!(2026 - 09 - 15)));
        assert_eq!(parse_ymd(" 2026-01-02 "), Some(date!(2026 - 01 - 02)));
        assert_eq!(parse_ymd("15/09/2026"), None);
        assert_eq!(parse_ymd(""), None);
    }
}
