use bytes::Bytes;
use tracing::{error, warn};

use super::client::{GenerativeModel, Part};
use super::types::{ImageAnalysis, TextAnalysis};

const TEXT_PROMPT: &str = r#"
คุณคือ AI ผู้ช่วยสำหรับแอปพลิเคชันผู้ป่วยเบาหวาน มีหน้าที่วิเคราะห์ข้อความจากผู้ใช้
ข้อความของผู้ใช้: "{TEXT}"

วิเคราะห์และจัดประเภทข้อความออกเป็นหนึ่งในสามประเภท: "logging", "question", หรือ "unknown"

1.  ถ้าเป็น "logging" (การบันทึกค่าน้ำตาล):
    - ดึงค่าตัวเลข (glucose value) ออกมา
    - ระบุช่วงเวลา (timing) ให้ตรงกับค่าใดค่าหนึ่งในลิสต์นี้เท่านั้น:
      ['MORNING_BEFORE', 'MORNING_AFTER', 'LUNCH_BEFORE', 'LUNCH_AFTER', 'DINNER_BEFORE', 'DINNER_AFTER', 'BEDTIME', 'OTHER']
    - ตอบกลับเป็น JSON object รูปแบบนี้:
      { "type": "logging", "value": 150, "timing": "MORNING_BEFORE" }

2.  ถ้าเป็น "question" (คำถามทั่วไปเกี่ยวกับเบาหวาน):
    - ตอบกลับเป็น JSON object รูปแบบนี้:
      { "type": "question", "query": "[คำถามของผู้ใช้]" }

3.  ถ้าเป็น "unknown" (ไม่เกี่ยวข้อง):
    - ตอบกลับเป็น JSON object รูปแบบนี้:
      { "type": "unknown" }

สำคัญมาก: ตอบกลับเป็น JSON object ที่ถูกต้องและไม่มีข้อความอื่นใดปะปน
"#;

const QA_PROMPT: &str = r#"
คุณคือ AI ผู้ช่วยที่ให้ข้อมูลด้านสุขภาพสำหรับผู้ป่วยเบาหวาน หน้าที่ของคุณคือตอบคำถามต่อไปนี้ด้วยความเห็นอกเห็นใจและให้ข้อมูลที่ถูกต้อง

คำถามของผู้ใช้: "{QUERY}"

ข้อกำหนดในการตอบ:
1.  ให้ข้อมูลที่ถูกต้องและเป็นกลางเกี่ยวกับการจัดการโรคเบาหวานทั่วไป (เช่น อาหาร, การออกกำลังกาย, การใช้ยาเบื้องต้น)
2.  ใช้ภาษาที่เข้าใจง่าย กระชับ และเป็นภาษาไทย
3.  สำคัญที่สุด: ทุกครั้งที่ตอบ จะต้องมีข้อความเตือนปิดท้ายในย่อหน้าสุดท้ายเสมอว่า "ข้อมูลนี้เป็นเพียงคำแนะนำเบื้องต้น ไม่สามารถทดแทนคำวินิจฉัยหรือคำแนะนำจากแพทย์ได้ ควรปรึกษาแพทย์ผู้เชี่ยวชาญเพื่อรับการประเมินและการรักษาที่เหมาะสมกับคุณ"

สร้างคำตอบตามข้อกำหนดข้างต้น
"#;

const IMAGE_PROMPT: &str = r#"
คุณคือ AI ผู้ช่วยอัจฉริยะสำหรับแอปพลิเคชันผู้ป่วยเบาหวาน มีหน้าที่วิเคราะห์รูปภาพที่ส่งมาอย่างละเอียด

ขั้นตอนการทำงาน:
1.  จำแนกประเภทของรูปภาพ ว่าเป็นหนึ่งในสี่ประเภทนี้: "food", "lab_result", "appointment_slip", หรือ "other"
2.  ดึงข้อมูล ตามประเภทของรูปภาพ

ข้อกำหนดพิเศษสำหรับ "appointment_slip": จัดเป็นใบนัดหมายเฉพาะเมื่อพบสิ่งบ่งชี้ว่าเกี่ยวข้องกับโรคเบาหวานเท่านั้น
(เช่น คำว่า "เบาหวาน", "Diabetes", คลินิกเบาหวาน, หรือการตรวจที่เกี่ยวข้อง เช่น FBS, HbA1c)
ถ้าเป็นใบนัดหมายที่ไม่เกี่ยวข้องกับเบาหวาน ให้ตอบเป็น "other" แทน

รูปแบบการตอบกลับ (ต้องเป็น JSON object ที่ถูกต้องเท่านั้น):

-   ถ้าเป็นภาพอาหาร ("food"):
    {
      "image_type": "food",
      "food_name": "[ชื่ออาหารเป็นภาษาไทย]",
      "estimated_glucose": "[ค่าน้ำตาลโดยประมาณ เป็นตัวเลข]",
      "estimated_carbs": "[คาร์โบไฮเดรตโดยประมาณ เป็นตัวเลข]",
      "recommendation": "[คำแนะนำเป็นภาษาไทย]"
    }

-   ถ้าเป็นภาพผลตรวจเลือด ("lab_result"):
    {
      "image_type": "lab_result",
      "fasting_glucose": [ตัวเลข],
      "hba1c": [ตัวเลข],
      "record_date": "[YYYY-MM-DD]",
      "normal_range_min": [ตัวเลข],
      "normal_range_max": [ตัวเลข],
      "fasting_glucose_unit": "mg/dL",
      "hba1c_unit": "%"
    }

-   ถ้าเป็นภาพใบนัดหมาย ("appointment_slip"):
    -   ดึงข้อมูล วัน/เดือน/ปี และแปลงเป็นรูปแบบ "YYYY-MM-DD" ถ้าปีเป็น พ.ศ. ให้แปลงเป็น ค.ศ. (พ.ศ. - 543 = ค.ศ.)
    -   ดึงข้อมูล เวลา และแปลงเป็นรูปแบบ "HH:MM" (24 ชั่วโมง)
    {
        "image_type": "appointment_slip",
        "appointment_date": "[YYYY-MM-DD หรือ null]",
        "start_time": "[HH:MM หรือ null]",
        "end_time": "[HH:MM หรือ null]",
        "age": "[อายุ หรือ null]",
        "full_name": "[ชื่อ-นามสกุล หรือ null]",
        "doctor_name": "[ชื่อแพทย์ หรือ null]",
        "hospital_name": "[ชื่อโรงพยาบาล หรือ null]",
        "reason": "[เหตุผลที่นัด หรือ null]",
        "details": "[รายละเอียดอื่นๆ หรือ null]"
    }

-   ถ้าเป็นภาพอื่นๆ ("other"):
    { "image_type": "other" }
"#;

const TRANSCRIBE_PROMPT: &str = "Please transcribe this audio file in Thai language.";

/// Strips the ``` fences the model sometimes wraps its JSON in.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Classifies one text message into logging / question / unknown.
///
/// Any call or parse failure becomes `TextAnalysis::Error`; callers treat it
/// like `Unknown` for reply purposes.
pub async fn analyze_text(model: &dyn GenerativeModel, text: &str) -> TextAnalysis {
    let prompt = TEXT_PROMPT.replace("{TEXT}", text);
    let raw = match model.generate(vec![Part::Text(prompt)]).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "text classification call failed");
            return TextAnalysis::Error;
        }
    };
    match serde_json::from_str(&strip_code_fences(&raw)) {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!(error = %e, raw, "unparseable text classification");
            TextAnalysis::Error
        }
    }
}

/// Classifies one image into the five-way `ImageAnalysis` result.
pub async fn analyze_image(
    model: &dyn GenerativeModel,
    image: Bytes,
    mime_type: &str,
) -> ImageAnalysis {
    let parts = vec![
        Part::Text(IMAGE_PROMPT.to_string()),
        Part::InlineData {
            mime_type: mime_type.to_string(),
            data: image,
        },
    ];
    let raw = match model.generate(parts).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "image classification call failed");
            return ImageAnalysis::Error;
        }
    };
    match serde_json::from_str(&strip_code_fences(&raw)) {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!(error = %e, raw, "unparseable image classification");
            ImageAnalysis::Error
        }
    }
}

/// Free-text answer for a diabetes question. The medical disclaimer is a
/// product requirement enforced through the instruction, not re-validated
/// here. Falls back to a friendly Thai error string on failure.
pub async fn diabetes_answer(model: &dyn GenerativeModel, query: &str) -> String {
    let prompt = QA_PROMPT.replace("{QUERY}", query);
    match model.generate(vec![Part::Text(prompt)]).await {
        Ok(answer) => answer,
        Err(e) => {
            error!(error = %e, "answer generation failed");
            "ขออภัยค่ะ ขณะนี้ระบบขัดข้อง ไม่สามารถให้คำตอบได้ โปรดลองอีกครั้งในภายหลัง".to_string()
        }
    }
}

/// Transcribes an audio message to Thai text. Errors propagate so the audio
/// handler can send its specific failure reply.
pub async fn transcribe_audio(
    model: &dyn GenerativeModel,
    audio: Bytes,
    mime_type: Option<&str>,
) -> anyhow::Result<String> {
    let parts = vec![
        Part::Text(TRANSCRIBE_PROMPT.to_string()),
        Part::InlineData {
            mime_type: mime_type.unwrap_or("audio/mp4").to_string(),
            data: audio,
        },
    ];
    let text = model.generate(parts).await?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::types::MealPeriod;
    use axum::async_trait;

    struct CannedModel(String);

    #[async_trait]
    impl GenerativeModel for CannedModel {
        async fn generate(&self, _parts: Vec<Part>) -> anyhow::Result<String> {
            Ok(self.0.clone())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl GenerativeModel for FailingModel {
        async fn generate(&self, _parts: Vec<Part>) -> anyhow::Result<String> {
            anyhow::bail!("upstream unavailable")
        }
    }

    #[test]
    fn strips_fenced_json() {
        let raw = "```json\n{\"type\":\"unknown\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"type\":\"unknown\"}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn analyze_text_parses_fenced_logging_reply() {
        let model = CannedModel(
            "```json\n{\"type\":\"logging\",\"value\":120,\"timing\":\"MORNING_AFTER\"}\n```"
                .into(),
        );
        let analysis = analyze_text(&model, "น้ำตาล 120 หลังอาหารเช้า").await;
        assert_eq!(
            analysis,
            TextAnalysis::Logging {
                value: Some(120.0),
                timing: MealPeriod::MorningAfter
            }
        );
    }

    #[tokio::test]
    async fn analyze_text_maps_garbage_to_error() {
        let model = CannedModel("sorry, I can't help with that".into());
        assert_eq!(analyze_text(&model, "hi").await, TextAnalysis::Error);
    }

    #[tokio::test]
    async fn analyze_image_maps_call_failure_to_error() {
        let analysis = analyze_image(&FailingModel, Bytes::from_static(b"img"), "image/jpeg").await;
        assert_eq!(analysis, ImageAnalysis::Error);
    }

    #[tokio::test]
    async fn diabetes_answer_falls_back_on_failure() {
        let answer = diabetes_answer(&FailingModel, "กินทุเรียนได้ไหม").await;
        assert!(answer.contains("ขออภัย"));
    }
}
