//! Calendar windows and chart aggregation for the glucose history surface.

use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::clock::{day_bounds, month_start, week_start, BANGKOK};
use crate::glucose::repo::GlucoseLog;

const CHART_LABEL: &str = "ระดับน้ำตาลในเลือด (mg/dL)";
const CHART_LINE_COLOR: &str = "#3B82F6";
const CHART_FILL_COLOR: &str = "rgba(59, 130, 246, 0.1)";

/// Query windows the companion app's history views offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPeriod {
    Today,
    Yesterday,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// One chart point per measurement time (HH:MM).
    Time,
    /// One chart point per day (DD/MM), averaging that day's readings.
    Day,
}

impl HistoryPeriod {
    /// Half-open instant window of this period relative to the Bangkok day
    /// `today` falls in.
    pub fn bounds(self, today: Date) -> (OffsetDateTime, OffsetDateTime) {
        match self {
            HistoryPeriod::Today => day_bounds(today),
            HistoryPeriod::Yesterday => day_bounds(today - Duration::days(1)),
            HistoryPeriod::Week => week_bounds(today),
            HistoryPeriod::Month => month_bounds(today),
        }
    }

    pub fn grouping(self) -> Grouping {
        match self {
            HistoryPeriod::Today | HistoryPeriod::Yesterday => Grouping::Time,
            HistoryPeriod::Week | HistoryPeriod::Month => Grouping::Day,
        }
    }
}

pub fn week_bounds(today: Date) -> (OffsetDateTime, OffsetDateTime) {
    let (start, _) = day_bounds(week_start(today));
    (start, start + Duration::days(7))
}

pub fn month_bounds(today: Date) -> (OffsetDateTime, OffsetDateTime) {
    let first = month_start(today);
    let (start, _) = day_bounds(first);
    let days = first.month().length(first.year()) as i64;
    (start, start + Duration::days(days))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub label: &'static str,
    pub data: Vec<f64>,
    pub border_color: &'static str,
    pub background_color: &'static str,
    pub tension: f64,
}

#[derive(Debug, Serialize)]
pub struct ChartSummary {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct GlucoseChart {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
    pub summary: ChartSummary,
}

/// Folds logs into chronological chart points. Only times/days that actually
/// have readings appear; each point is the rounded average of its group.
pub fn chart(mut logs: Vec<GlucoseLog>, grouping: Grouping) -> GlucoseChart {
    logs.sort_by_key(|l| l.recorded_at);

    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for log in &logs {
        let local = log.recorded_at.to_offset(BANGKOK);
        let key = match grouping {
            Grouping::Time => format!("{:02}:{:02}", local.hour(), local.minute()),
            Grouping::Day => format!("{:02}/{:02}", local.day(), u8::from(local.month())),
        };
        // logs are sorted, so members of a group are always adjacent
        match groups.last_mut() {
            Some((k, values)) if *k == key => values.push(log.value),
            _ => groups.push((key, vec![log.value])),
        }
    }

    let mut labels = Vec::with_capacity(groups.len());
    let mut data = Vec::with_capacity(groups.len());
    for (key, values) in groups {
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        labels.push(key);
        data.push(avg.round());
    }

    let values: Vec<f64> = logs.iter().map(|l| l.value).collect();
    let summary = if values.is_empty() {
        ChartSummary {
            average: 0.0,
            min: 0.0,
            max: 0.0,
            count: 0,
        }
    } else {
        ChartSummary {
            average: (values.iter().sum::<f64>() / values.len() as f64).round(),
            min: values.iter().cloned().fold(f64::INFINITY, f64::min),
            max: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            count: values.len(),
        }
    };

    GlucoseChart {
        labels,
        datasets: vec![ChartDataset {
            label: CHART_LABEL,
            data,
            border_color: CHART_LINE_COLOR,
            background_color: CHART_FILL_COLOR,
            tension: 0.4,
        }],
        summary,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub items: Vec<crate::glucose::dto::GlucoseReading>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trends {
    pub this_week: f64,
    pub last_week: f64,
    pub this_month: f64,
    pub last_month: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub total_records: i64,
    pub average_glucose: f64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_record_date: Option<OffsetDateTime>,
    pub weekly_average: f64,
    pub monthly_average: f64,
    pub trends: Trends,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    fn log(value: f64, recorded_at: OffsetDateTime) -> GlucoseLog {
        GlucoseLog {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            value,
            period: "OTHER".into(),
            note: None,
            recorded_at,
        }
    }

    #[test]
    fn period_windows_cover_the_expected_days() {
        let today = date!(2026 - 08 - 27); // a Thursday
        let (start, end) = HistoryPeriod::Yesterday.bounds(today);
        assert_eq!(start, datetime!(2026 - 08 - 26 00:00 +7));
        assert_eq!(end - start, Duration::days(1));

        let (start, end) = HistoryPeriod::Week.bounds(today);
        assert_eq!(start, datetime!(2026 - 08 - 24 00:00 +7));
        assert_eq!(end - start, Duration::days(7));

        let (start, end) = HistoryPeriod::Month.bounds(today);
        assert_eq!(start, datetime!(2026 - 08 - 01 00:00 +7));
        assert_eq!(end - start, Duration::days(31));
    }

    #[test]
    fn time_grouping_shows_each_measurement() {
        let logs = vec![
            log(180.0, datetime!(2026 - 08 - 27 12:30 +7)),
            log(95.0, datetime!(2026 - 08 - 27 07:15 +7)),
        ];
        let c = chart(logs, Grouping::Time);
        assert_eq!(c.labels, vec!["07:15", "12:30"]);
        assert_eq!(c.datasets[0].data, vec![95.0, 180.0]);
        assert_eq!(c.summary.count, 2);
        assert_eq!(c.summary.average, 138.0);
        assert_eq!(c.summary.min, 95.0);
        assert_eq!(c.summary.max, 180.0);
    }

    #[test]
    fn day_grouping_averages_each_day() {
        let logs = vec![
            log(100.0, datetime!(2026 - 08 - 24 08:00 +7)),
            log(121.0, datetime!(2026 - 08 - 24 19:00 +7)),
            log(140.0, datetime!(2026 - 08 - 26 08:00 +7)),
        ];
        let c = chart(logs, Grouping::Day);
        // only days with readings appear, in chronological order
        assert_eq!(c.labels, vec!["24/08", "26/08"]);
        assert_eq!(c.datasets[0].data, vec![111.0, 140.0]);
    }

    #[test]
    fn empty_window_charts_as_zero_summary() {
        let c = chart(Vec::new(), Grouping::Time);
        assert!(c.labels.is_empty());
        assert!(c.datasets[0].data.is_empty());
        assert_eq!(c.summary.count, 0);
        assert_eq!(c.summary.average, 0.0);
    }
}
