//! Daily background jobs, each a tokio task that sleeps until the next
//! Bangkok wall-clock occurrence of its slot and then runs once.

use time::{Duration, OffsetDateTime, Time};
use tracing::{error, info};

use crate::appointment::notify;
use crate::clock::now_bangkok;
use crate::glucose::reminder;
use crate::state::AppState;

const THREE_DAY_AT: Time = time::macros::time!(09:00);
const SAME_DAY_AT: Time = time::macros::time!(05:00);
const GLUCOSE_NUDGE_AT: Time = time::macros::time!(07:00);

/// Time until the next occurrence of `at` on the wall clock `now` belongs
/// to. Exactly on the slot counts as due in 24 hours, which keeps a job
/// from firing twice on one day.
pub fn until_next(now: OffsetDateTime, at: Time) -> Duration {
    let mut next = now.replace_time(at);
    if next <= now {
        next += Duration::days(1);
    }
    next - now
}

pub fn start(state: AppState) {
    spawn_daily(
        state.clone(),
        "three_day_appointment_reminders",
        THREE_DAY_AT,
        |s| -> JobFuture { Box::pin(async move { notify::send_three_day_reminders(&s).await }) },
    );
    spawn_daily(
        state.clone(),
        "same_day_appointment_reminders",
        SAME_DAY_AT,
        |s| -> JobFuture { Box::pin(async move { notify::send_same_day_reminders(&s).await }) },
    );
    spawn_daily(
        state,
        "daily_glucose_reminders",
        GLUCOSE_NUDGE_AT,
        |s| -> JobFuture { Box::pin(async move { reminder::send_daily_reminders(&s).await }) },
    );
}

type JobFuture = std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>>;

fn spawn_daily<F>(state: AppState, name: &'static str, at: Time, job: F)
where
    F: Fn(AppState) -> JobFuture + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let wait = until_next(now_bangkok(), at);
            info!(job = name, wait_secs = wait.whole_seconds(), "scheduled next run");
            tokio::time::sleep(wait.try_into().unwrap_or(std::time::Duration::from_secs(60)))
                .await;
            // Job failures never kill the loop; the next day retries.
            if let Err(e) = job(state.clone()).await {
                error!(job = name, error = %e, "scheduled job failed");
            } else {
                info!(job = name, "scheduled job finished");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn waits_until_the_slot_later_today() {
        let now = datetime!(2026 - 08 - 27 06:30 +7);
        assert_eq!(until_next(now, GLUCOSE_NUDGE_AT), Duration::minutes(30));
    }

    #[test]
    fn rolls_over_to_tomorrow_when_past() {
        let now = datetime!(2026 - 08 - 27 09:00:01 +7);
        let wait = until_next(now, THREE_DAY_AT);
        assert_eq!(wait, Duration::days(1) - Duration::seconds(1));
    }

    #[test]
    fn exactly_on_the_slot_waits_a_full_day() {
        let now = datetime!(2026 - 08 - 27 05:00 +7);
        assert_eq!(until_next(now, SAME_DAY_AT), Duration::days(1));
    }
}
