//! Daily push nudge for users who have not logged a reading today.

use rand::seq::SliceRandom;
use tracing::{error, info};

use super::repo;
use crate::clock::{day_bounds, today_bangkok};
use crate::line::client::OutgoingMessage;
use crate::state::AppState;

// Rotated so the daily nudge does not get stale.
const REMINDER_MESSAGES: &[&str] = &[
    "สวัสดีตอนเช้า ☀️ อย่าลืมวัดและบันทึกค่าน้ำตาลวันนี้นะคะ",
    "อรุณสวัสดิ์ค่ะ 🌅 มาบันทึกค่าน้ำตาลกันเถอะ เพื่อสุขภาพที่ดีขึ้น",
    "ตื่นแล้วหรือยังคะ 😊 อย่าลืมวัดค่าน้ำตาลตอนเช้านะ",
    "สวัสดีค่ะ 💙 วันนี้อย่าลืมบันทึกค่าน้ำตาลด้วยนะคะ",
    "เช้าวันใหม่ ☕ มาเริ่มต้นด้วยการวัดค่าน้ำตาลกันเถอะ",
    "สวัสดีตอนเช้า 🌤️ ถึงเวลาบันทึกค่าน้ำตาลแล้วค่ะ",
    "อรุณสวัสดิ์ 🌻 อย่าลืมดูแลสุขภาพด้วยการบันทึกค่าน้ำตาลนะคะ",
    "สวัสดีค่ะ 😊 วันนี้บันทึกค่าน้ำตาลแล้วหรือยังคะ",
    "ตื่นมาแล้วอย่าลืมวัดค่าน้ำตาลนะคะ 💪 เพื่อติดตามสุขภาพของเรา",
    "เช้าวันใหม่ที่สดใส ☀️ มาบันทึกค่าน้ำตาลกันเถอะค่ะ",
];

fn random_reminder_message() -> &'static str {
    REMINDER_MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(REMINDER_MESSAGES[0])
}

pub async fn send_daily_reminders(state: &AppState) -> anyhow::Result<()> {
    let (start, end) = day_bounds(today_bangkok());
    let users = repo::users_without_log_between(&state.db, start, end).await?;
    info!(count = users.len(), "users without a glucose log today");

    let mut sent = 0usize;
    let mut failed = 0usize;
    for (user_id, line_user_id) in users {
        let message = random_reminder_message();
        match state
            .chat
            .push(&line_user_id, vec![OutgoingMessage::text(message)])
            .await
        {
            Ok(_) => sent += 1,
            Err(e) => {
                failed += 1;
                error!(error = %e, %user_id, "failed to push glucose reminder");
            }
        }
    }
    info!(sent, failed, "daily glucose reminders finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_message_comes_from_the_pool() {
        for _ in 0..20 {
            assert!(REMINDER_MESSAGES.contains(&random_reminder_message()));
        }
    }
}
