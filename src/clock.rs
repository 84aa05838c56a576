//! Bangkok wall-clock helpers. Users, reminder schedules and "today" windows
//! all live in Asia/Bangkok (UTC+7, no DST).

use time::macros::offset;
use time::{Date, OffsetDateTime, Time, UtcOffset};

pub const BANGKOK: UtcOffset = offset!(+7);

pub fn now_bangkok() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(BANGKOK)
}

pub fn today_bangkok() -> Date {
    now_bangkok().date()
}

/// Half-open UTC instant range [00:00, 24:00) of one Bangkok calendar day.
pub fn day_bounds(date: Date) -> (OffsetDateTime, OffsetDateTime) {
    let start = date.with_time(Time::MIDNIGHT).assume_offset(BANGKOK);
    (start, start + time::Duration::days(1))
}

/// Monday of the week `date` falls in.
pub fn week_start(date: Date) -> Date {
    date - time::Duration::days(date.weekday().number_days_from_monday() as i64)
}

pub fn month_start(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

/// First day of the month before the one `date` falls in.
pub fn prev_month_start(date: Date) -> Date {
    month_start(date)
        .previous_day()
        .map(month_start)
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn day_bounds_cover_one_bangkok_day() {
        let (start, end) = day_bounds(date!(2026 - 08 - 27));
        assert_eq!(start, datetime!(2026 - 08 - 27 00:00 +7));
        assert_eq!(end - start, time::Duration::days(1));
        // 03:00 Bangkok on the 27th is 20:00 UTC on the 26th
        let early = datetime!(2026 - 08 - 26 20:00 UTC);
        assert!(early >= start && early < end);
    }

    #[test]
    fn week_starts_on_monday() {
        // 2026-08-27 is a Thursday
        assert_eq!(week_start(date!(2026 - 08 - 27)), date!(2026 - 08 - 24));
        assert_eq!(week_start(date!(2026 - 08 - 24)), date!(2026 - 08 - 24));
        assert_eq!(week_start(date!(2026 - 08 - 30)), date!(2026 - 08 - 24));
    }

    #[test]
    fn month_starts_roll_over_year_boundaries() {
        assert_eq!(month_start(date!(2026 - 08 - 27)), date!(2026 - 08 - 01));
        assert_eq!(prev_month_start(date!(2026 - 08 - 27)), date!(2026 - 07 - 01));
        assert_eq!(prev_month_start(date!(2026 - 01 - 15)), date!(2025 - 12 - 01));
    }
}
