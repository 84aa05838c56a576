//! User-facing Thai confirmation and error messages, plus the appointment
//! reminder Flex bubble.

use time::{Date, Weekday};

use super::flex::{FlexComponent, FlexContainer};
use crate::appointment::repo::Appointment;
use crate::appointment::ReminderKind;
use crate::gemini::types::{FoodFields, MealPeriod};

pub const GENERIC_ERROR: &str = "ขออภัยค่ะ ระบบเกิดข้อผิดพลาด โปรดลองอีกครั้งในภายหลัง";
pub const SAVE_ERROR: &str = "ขออภัยค่ะ เกิดข้อผิดพลาดในการบันทึกข้อมูล";
pub const ANSWER_FALLBACK: &str = "ขออภัยค่ะ ไม่พบคำตอบที่เหมาะสม";
pub const DID_NOT_UNDERSTAND: &str =
    "ขออภัยค่ะ ฉันไม่เข้าใจข้อความของคุณ โปรดส่งข้อมูลเกี่ยวกับเบาหวานนะคะ";
pub const TRANSCRIPTION_FAILED: &str = "ขออภัยค่ะ เกิดข้อผิดพลาดในการแปลเสียงเป็นข้อความ";
pub const LAB_SAVED: &str = "บันทึกข้อมูลผลตรวจเลือดของคุณเรียบร้อยแล้วค่ะ 🩺";
pub const LAB_NOT_FOUND: &str =
    "ขออภัยค่ะ ฉันไม่สามารถหาข้อมูลค่าน้ำตาลหรือค่า HbA1c จากรูปภาพนี้ได้";
pub const APPOINTMENT_NOT_FOUND: &str =
    "ขออภัยค่ะ ฉันไม่สามารถหาข้อมูลวันที่และเวลาที่ชัดเจนจากใบนัดนี้ได้";
pub const IMAGE_NOT_PROCESSABLE: &str =
    "ขออภัยค่ะ ฉันไม่สามารถประมวลผลรูปภาพนี้ได้ ลองส่งภาพอาหาร ผลตรวจเลือดหรือ ใบนัดหมายใหม่นะคะ";

pub fn glucose_saved(value: f64, timing: MealPeriod) -> String {
    format!(
        "บันทึกค่าน้ำตาล {} ช่วง {} สำเร็จค่ะ! 👍",
        format_num(value),
        timing.thai_phrase()
    )
}

pub fn food_summary(food: &FoodFields) -> String {
    let name = food.food_name.as_deref().unwrap_or("ไม่ทราบชื่ออาหาร");
    let carbs = food
        .estimated_carbs
        .map(format_num)
        .unwrap_or_else(|| "ไม่ทราบ".into());
    let advice = food.recommendation.as_deref().unwrap_or("-");
    format!(
        "🥗 วิเคราะห์รูปภาพ:\n\nชื่ออาหาร: {name}\nคาร์โบไฮเดรตประมาณ: {carbs} กรัม\n\nคำแนะนำ: {advice}"
    )
}

pub fn appointment_saved(date: Date, start_time: Option<&str>, end_time: Option<&str>) -> String {
    let display_date = format_thai_date(date);
    match (start_time, end_time) {
        (Some(start), Some(end)) => {
            format!("บันทึกนัดหมายวันที่ {display_date} เวลา {start} - {end} น. เรียบร้อยแล้วค่ะ 🗓️")
        }
        (Some(start), None) => {
            format!("บันทึกนัดหมายวันที่ {display_date} เวลา {start} น. เรียบร้อยแล้วค่ะ 🗓️")
        }
        _ => format!("บันทึกนัดหมายวันที่ {display_date} เรียบร้อยแล้วค่ะ 🗓️"),
    }
}

/// DD/MM/YYYY, the format the companion app and replies use throughout.
pub fn format_thai_date(date: Date) -> String {
    format!(
        "{:02}/{:02}/{:04}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}

pub fn thai_weekday(date: Date) -> &'static str {
    match date.weekday() {
        Weekday::Monday => "วันจันทร์",
        Weekday::Tuesday => "วันอังคาร",
        Weekday::Wednesday => "วันพุธ",
        Weekday::Thursday => "วันพฤหัสบดี",
        Weekday::Friday => "วันศุกร์",
        Weekday::Saturday => "วันเสาร์",
        Weekday::Sunday => "วันอาทิตย์",
    }
}

// Drops a trailing .0 so whole readings render as integers.
fn format_num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Builds the reminder bubble: colored header, date/time block, then one row
/// per known detail (hospital, doctor, reason).
pub fn appointment_reminder_flex(appointment: &Appointment, kind: ReminderKind) -> (String, FlexContainer) {
    let display_date = format_thai_date(appointment.appointment_date);
    let time_text = match (
        appointment.start_time.as_deref(),
        appointment.end_time.as_deref(),
    ) {
        (Some(start), Some(end)) => format!("{start} - {end} น."),
        (Some(start), None) => format!("{start} น."),
        _ => "ไม่ระบุเวลา".to_string(),
    };

    let (header_text, header_color, days_text, footer_text) = match kind {
        ReminderKind::ThreeDay => (
            "🔔 แจ้งเตือนนัดหมายล่วงหน้า",
            "#17c1e8",
            "อีก 3 วัน",
            "อย่าลืมเตรียมตัวนะคะ 💙",
        ),
        ReminderKind::SameDay => (
            "⏰ วันนี้มีนัดหมาย!",
            "#f53939",
            "วันนี้",
            "ขอให้เดินทางปลอดภัยนะคะ 💙",
        ),
    };
    let alt_text = format!("{header_text} - {display_date}");

    let mut detail_rows = Vec::new();
    for (icon, value) in [
        ("🏥", appointment.hospital_name.as_deref()),
        ("👨‍⚕️", appointment.doctor_name.as_deref()),
        ("📋", appointment.reason.as_deref()),
    ] {
        if let Some(value) = value {
            detail_rows.push(
                FlexComponent::Box {
                    layout: "horizontal".into(),
                    contents: vec![
                        FlexComponent::text(icon).size("sm").flex(0),
                        FlexComponent::text(value)
                            .size("sm")
                            .color("#555555")
                            .wrap()
                            .margin("sm"),
                    ],
                    margin: Some("md".into()),
                    padding_all: None,
                    background_color: None,
                },
            );
        }
    }

    let contents = FlexContainer::Bubble {
        size: Some("mega".into()),
        header: Some(
            FlexComponent::vbox(vec![FlexComponent::text(header_text)
                .color("#ffffff")
                .size("lg")
                .weight("bold")])
            .padding_all("20px")
            .background_color(header_color),
        ),
        body: Some(
            FlexComponent::vbox(vec![
                FlexComponent::vbox(vec![
                    FlexComponent::text(days_text)
                        .size("xs")
                        .color("#8c8c8c")
                        .weight("bold"),
                    FlexComponent::text(format!(
                        "{}ที่ {}",
                        thai_weekday(appointment.appointment_date),
                        display_date
                    ))
                    .size("xl")
                    .weight("bold")
                    .color("#1a1a1a")
                    .margin("xs"),
                    FlexComponent::text(time_text)
                        .size("md")
                        .color("#555555")
                        .margin("xs"),
                ]),
                FlexComponent::Separator {
                    margin: Some("xl".into()),
                },
                FlexComponent::vbox(detail_rows).margin("xl"),
            ])
            .padding_all("20px"),
        ),
        footer: Some(
            FlexComponent::vbox(vec![FlexComponent::text(footer_text)
                .size("xs")
                .color("#8c8c8c")
                .align("center")])
            .padding_all("15px"),
        ),
    };

    (alt_text, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use uuid::Uuid;

    #[test]
    fn glucose_saved_renders_value_and_thai_phrase() {
        let msg = glucose_saved(120.0, MealPeriod::MorningAfter);
        assert!(msg.contains("120"));
        assert!(msg.contains("หลังอาหารเช้า"));
        assert!(!msg.contains("120.0"));
    }

    #[test]
    fn food_summary_tolerates_missing_fields() {
        let msg = food_summary(&FoodFields::default());
        assert!(msg.contains("ไม่ทราบชื่ออาหาร"));
    }

    #[test]
    fn appointment_saved_formats_time_window() {
        let d = date!(2026 - 09 - 03);
        assert!(appointment_saved(d, Some("09:30"), Some("11:00")).contains("09:30 - 11:00 น."));
        assert!(appointment_saved(d, Some("09:30"), None).contains("เวลา 09:30 น."));
        assert!(appointment_saved(d, None, None).contains("03/09/2026"));
    }

    #[test]
    fn reminder_flex_shape_matches_kind() {
        let appt = Appointment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            appointment_date: date!(2026 - 09 - 02),
            start_time: Some("08:00".into()),
            end_time: None,
            doctor_name: Some("นพ. สมชาย".into()),
            hospital_name: Some("รพ. ศิริราช".into()),
            full_name: None,
            age: None,
            reason: Some("ตรวจเบาหวาน".into()),
            details: None,
            created_at: time::OffsetDateTime::now_utc(),
        };

        let (alt, contents) = appointment_reminder_flex(&appt, ReminderKind::SameDay);
        assert!(alt.contains("วันนี้มีนัดหมาย"));
        assert!(alt.contains("02/09/2026"));

        let v = serde_json::to_value(&contents).unwrap();
        assert_eq!(v["header"]["backgroundColor"], "#f53939");
        // 2026-09-02 is a Wednesday
        let date_line = v["body"]["contents"][0]["contents"][1]["text"]
            .as_str()
            .unwrap();
        assert_eq!(date_line, "วันพุธที่ 02/09/2026");
        // hospital, doctor and reason rows are all present
        assert_eq!(v["body"]["contents"][2]["contents"].as_array().unwrap().len(), 3);
    }
}
