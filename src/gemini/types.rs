use serde::{Deserialize, Deserializer, Serialize};

/// The eight meal-relative timing slots a glucose reading can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealPeriod {
    #[serde(rename = "MORNING_BEFORE")]
    MorningBefore,
    #[serde(rename = "MORNING_AFTER")]
    MorningAfter,
    #[serde(rename = "LUNCH_BEFORE")]
    LunchBefore,
    #[serde(rename = "LUNCH_AFTER")]
    LunchAfter,
    #[serde(rename = "DINNER_BEFORE")]
    DinnerBefore,
    #[serde(rename = "DINNER_AFTER")]
    DinnerAfter,
    #[serde(rename = "BEDTIME")]
    Bedtime,
    #[serde(rename = "OTHER")]
    Other,
}

impl MealPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealPeriod::MorningBefore => "MORNING_BEFORE",
            MealPeriod::MorningAfter => "MORNING_AFTER",
            MealPeriod::LunchBefore => "LUNCH_BEFORE",
            MealPeriod::LunchAfter => "LUNCH_AFTER",
            MealPeriod::DinnerBefore => "DINNER_BEFORE",
            MealPeriod::DinnerAfter => "DINNER_AFTER",
            MealPeriod::Bedtime => "BEDTIME",
            MealPeriod::Other => "OTHER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "MORNING_BEFORE" => MealPeriod::MorningBefore,
            "MORNING_AFTER" => MealPeriod::MorningAfter,
            "LUNCH_BEFORE" => MealPeriod::LunchBefore,
            "LUNCH_AFTER" => MealPeriod::LunchAfter,
            "DINNER_BEFORE" => MealPeriod::DinnerBefore,
            "DINNER_AFTER" => MealPeriod::DinnerAfter,
            "BEDTIME" => MealPeriod::Bedtime,
            "OTHER" => MealPeriod::Other,
            _ => return None,
        })
    }

    /// Human-readable Thai phrase used in confirmation replies.
    pub fn thai_phrase(&self) -> &'static str {
        match self {
            MealPeriod::MorningBefore => "ก่อนอาหารเช้า",
            MealPeriod::MorningAfter => "หลังอาหารเช้า",
            MealPeriod::LunchBefore => "ก่อนอาหารกลางวัน",
            MealPeriod::LunchAfter => "หลังอาหารกลางวัน",
            MealPeriod::DinnerBefore => "ก่อนอาหารเย็น",
            MealPeriod::DinnerAfter => "หลังอาหารเย็น",
            MealPeriod::Bedtime => "ก่อนนอน",
            MealPeriod::Other => "ช่วงอื่นๆ",
        }
    }
}

/// Classification outcome for a text message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TextAnalysis {
    Logging {
        #[serde(default, deserialize_with = "lenient_f64")]
        value: Option<f64>,
        timing: MealPeriod,
    },
    Question {
        query: String,
    },
    #[serde(alias = "irrelevant")]
    Unknown,
    /// Not a model category: produced locally when the call fails or the
    /// reply does not parse.
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FoodFields {
    pub food_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub estimated_glucose: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub estimated_carbs: Option<f64>,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LabFields {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fasting_glucose: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub hba1c: Option<f64>,
    pub record_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub normal_range_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub normal_range_max: Option<f64>,
    pub fasting_glucose_unit: Option<String>,
    pub hba1c_unit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppointmentFields {
    pub appointment_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub age: Option<String>,
    pub full_name: Option<String>,
    pub doctor_name: Option<String>,
    pub hospital_name: Option<String>,
    pub reason: Option<String>,
    pub details: Option<String>,
}

/// Classification outcome for an image. Every extracted field is optional:
/// the model may return partial data, and absence is distinct from zero.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "image_type", rename_all = "snake_case")]
pub enum ImageAnalysis {
    Food(FoodFields),
    LabResult(LabFields),
    AppointmentSlip(AppointmentFields),
    Other,
    /// Not a model category: produced locally on call or parse failure.
    Error,
}

/// Lenient numeric coercion for classifier output.
///
/// Absent and null stay None, numbers pass through, strings are stripped to
/// their digit/dot/minus characters and parsed. Anything non-finite collapses
/// to None so a malformed value never lands in storage as 0 or NaN.
pub fn to_num(v: &serde_json::Value) -> Option<f64> {
    match v {
        serde_json::Value::Null => None,
        serde_json::Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

fn lenient_f64<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(de)?;
    Ok(to_num(&v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_num_is_total_and_never_zero_for_garbage() {
        assert_eq!(to_num(&json!(150)), Some(150.0));
        assert_eq!(to_num(&json!(5.6)), Some(5.6));
        assert_eq!(to_num(&json!("150 mg/dL")), Some(150.0));
        assert_eq!(to_num(&json!("5.6%")), Some(5.6));
        assert_eq!(to_num(&json!("-12")), Some(-12.0));
        assert_eq!(to_num(&json!(null)), None);
        assert_eq!(to_num(&json!("")), None);
        assert_eq!(to_num(&json!("abc")), None);
        assert_eq!(to_num(&json!(true)), None);
        assert_eq!(to_num(&json!([1])), None);
    }

    #[test]
    fn to_num_is_idempotent_on_numbers() {
        let once = to_num(&json!("120 mg/dL")).unwrap();
        assert_eq!(to_num(&json!(once)), Some(once));
    }

    #[test]
    fn meal_period_round_trips_through_str() {
        for p in [
            MealPeriod::MorningBefore,
            MealPeriod::MorningAfter,
            MealPeriod::LunchBefore,
            MealPeriod::LunchAfter,
            MealPeriod::DinnerBefore,
            MealPeriod::DinnerAfter,
            MealPeriod::Bedtime,
            MealPeriod::Other,
        ] {
            assert_eq!(MealPeriod::from_str(p.as_str()), Some(p));
        }
        assert_eq!(MealPeriod::from_str("BRUNCH"), None);
    }

    #[test]
    fn text_analysis_parses_string_values() {
        let a: TextAnalysis =
            serde_json::from_str(r#"{"type":"logging","value":"150","timing":"MORNING_BEFORE"}"#)
                .unwrap();
        assert_eq!(
            a,
            TextAnalysis::Logging {
                value: Some(150.0),
                timing: MealPeriod::MorningBefore
            }
        );
    }

    #[test]
    fn text_analysis_accepts_irrelevant_alias() {
        let a: TextAnalysis = serde_json::from_str(r#"{"type":"irrelevant"}"#).unwrap();
        assert_eq!(a, TextAnalysis::Unknown);
    }

    #[test]
    fn image_analysis_parses_partial_lab_fields() {
        let a: ImageAnalysis =
            serde_json::from_str(r#"{"image_type":"lab_result","hba1c":"6.1 %"}"#).unwrap();
        let ImageAnalysis::LabResult(lab) = a else {
            panic!("expected lab_result");
        };
        assert_eq!(lab.hba1c, Some(6.1));
        assert_eq!(lab.fasting_glucose, None);
        assert_eq!(lab.record_date, None);
    }
}
