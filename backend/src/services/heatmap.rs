//! Access heatmap aggregation.
//!
//! Storage groups access events by `(hour, day_of_week)`; this module folds
//! those grouped counts into six 4-hour time slots per weekday. Slot ranges
//! are inclusive on both ends (`0-3`, `4-7`, ... `20-23`), so every hour of
//! the day lands in exactly one slot.
//!
//! Grouped rows are parsed leniently: a count that is missing or not a number
//! contributes zero, and rows whose hour or weekday fall outside the valid
//! range are dropped according to [`OutOfRangePolicy`]. A single bad row never
//! fails the whole aggregation.

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::api::{DateRange, HeatmapData, HeatmapMetadata, HeatmapRow};
use crate::db::repository::{AccessLogRepository, RepositoryResult};
use crate::services::clock::Clock;

/// Window used when the caller does not ask for one.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;
/// Upper bound on the requested window.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// A fixed 4-hour bucket of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    /// First hour in the slot (inclusive).
    pub start_hour: i64,
    /// Last hour in the slot (inclusive).
    pub end_hour: i64,
    pub label: &'static str,
}

impl TimeSlot {
    pub fn contains(&self, hour: i64) -> bool {
        hour >= self.start_hour && hour <= self.end_hour
    }
}

pub const TIME_SLOTS: [TimeSlot; 6] = [
    TimeSlot { start_hour: 0, end_hour: 3, label: "00:00-03:59" },
    TimeSlot { start_hour: 4, end_hour: 7, label: "04:00-07:59" },
    TimeSlot { start_hour: 8, end_hour: 11, label: "08:00-11:59" },
    TimeSlot { start_hour: 12, end_hour: 15, label: "12:00-15:59" },
    TimeSlot { start_hour: 16, end_hour: 19, label: "16:00-19:59" },
    TimeSlot { start_hour: 20, end_hour: 23, label: "20:00-23:59" },
];

/// Index into [`TIME_SLOTS`] of the slot containing `hour`.
pub fn slot_index_for_hour(hour: i64) -> Option<usize> {
    TIME_SLOTS.iter().position(|slot| slot.contains(hour))
}

/// Heatmap column. Numbering follows Postgres `EXTRACT(DOW ...)`:
/// 0 is Sunday, 6 is Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn from_day_of_week(day_of_week: i64) -> Option<Self> {
        usize::try_from(day_of_week)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Column key used by the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            Weekday::Sunday => "domingo",
            Weekday::Monday => "lunes",
            Weekday::Tuesday => "martes",
            Weekday::Wednesday => "miercoles",
            Weekday::Thursday => "jueves",
            Weekday::Friday => "viernes",
            Weekday::Saturday => "sabado",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Self::ALL[day.num_days_from_sunday() as usize]
    }
}

/// One grouped row as returned by storage.
///
/// Fields are kept as raw JSON values so every backend goes through the
/// same lenient parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHourlyCount {
    #[serde(default)]
    pub hour: Value,
    #[serde(default, alias = "day_of_week")]
    pub day_of_week: Value,
    #[serde(default)]
    pub count: Value,
}

impl RawHourlyCount {
    pub fn new(hour: i64, day_of_week: i64, count: i64) -> Self {
        Self {
            hour: Value::from(hour),
            day_of_week: Value::from(day_of_week),
            count: Value::from(count),
        }
    }

    /// Count as a non-negative integer; anything unparseable is zero.
    pub fn parsed_count(&self) -> u64 {
        lenient_int(&self.count)
            .filter(|c| *c > 0)
            .map(|c| c as u64)
            .unwrap_or(0)
    }

    fn placement(&self) -> Result<(usize, Weekday, u64), RowRejection> {
        let hour = lenient_int(&self.hour);
        let slot = hour
            .and_then(slot_index_for_hour)
            .ok_or(RowRejection::Hour(hour))?;
        let day_of_week = lenient_int(&self.day_of_week);
        let day = day_of_week
            .and_then(Weekday::from_day_of_week)
            .ok_or(RowRejection::DayOfWeek(day_of_week))?;
        Ok((slot, day, self.parsed_count()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
enum RowRejection {
    #[error("hour {0:?} outside 0-23")]
    Hour(Option<i64>),
    #[error("day_of_week {0:?} outside 0-6")]
    DayOfWeek(Option<i64>),
}

/// Integer parse with the same leniency the dashboard always had: integers
/// pass through, floats truncate, strings contribute their leading integer.
pub fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => leading_int(s),
        _ => None,
    }
}

fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// What to do with grouped rows whose hour or weekday is out of range.
///
/// Rows are dropped either way; the policy only controls whether each drop is
/// reported in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfRangePolicy {
    Ignore,
    #[default]
    Log,
}

impl FromStr for OutOfRangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" | "drop" | "silent" => Ok(Self::Ignore),
            "log" | "warn" => Ok(Self::Log),
            other => Err(format!("Unknown out-of-range policy: {}", other)),
        }
    }
}

/// Result of folding grouped rows into the slot matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapAggregation {
    /// Six rows in [`TIME_SLOTS`] order.
    pub rows: Vec<HeatmapRow>,
    /// Sum of every count placed in `rows`.
    pub total_events: u64,
    /// Grouped rows dropped for an out-of-range hour or weekday.
    pub ignored_rows: usize,
}

/// Fold grouped `(hour, day_of_week, count)` rows into the 6×7 matrix.
pub fn aggregate_heatmap(raw: &[RawHourlyCount], policy: OutOfRangePolicy) -> HeatmapAggregation {
    let mut rows: Vec<HeatmapRow> = TIME_SLOTS
        .iter()
        .map(|slot| HeatmapRow::empty(slot.label))
        .collect();
    let mut total_events: u64 = 0;
    let mut ignored_rows = 0;

    for entry in raw {
        match entry.placement() {
            Ok((slot, day, count)) => {
                rows[slot].add(day, count);
                total_events = total_events.saturating_add(count);
            }
            Err(rejection) => {
                ignored_rows += 1;
                if policy == OutOfRangePolicy::Log {
                    warn!(
                        "Dropping heatmap row {}: hour={}, day_of_week={}, count={}",
                        rejection, entry.hour, entry.day_of_week, entry.count
                    );
                }
            }
        }
    }

    HeatmapAggregation {
        rows,
        total_events,
        ignored_rows,
    }
}

/// Resolve the `days` query parameter.
///
/// Missing, non-numeric or non-positive values fall back to `default_days`;
/// a leading integer is honoured (`"14d"` is 14) and the result is capped at
/// [`MAX_WINDOW_DAYS`].
pub fn parse_window_days(raw: Option<&str>, default_days: u32) -> u32 {
    raw.and_then(leading_int)
        .filter(|d| *d > 0)
        .map(|d| d.min(MAX_WINDOW_DAYS as i64) as u32)
        .unwrap_or(default_days)
}

/// Compute the heatmap for the `days` ending now.
///
/// Storage failures propagate unchanged; the aggregator only ever sees a
/// complete result set.
pub async fn get_heatmap_data<R>(
    repo: &R,
    clock: &dyn Clock,
    days: u32,
    policy: OutOfRangePolicy,
) -> RepositoryResult<HeatmapData>
where
    R: AccessLogRepository + ?Sized,
{
    let end: DateTime<Utc> = clock.now();
    let start = end - Duration::days(days as i64);
    debug!("Heatmap window {} .. {} ({} days)", start, end, days);

    let raw = repo.fetch_hourly_access_counts(start, end).await?;
    let aggregation = aggregate_heatmap(&raw, policy);
    debug!(
        "Heatmap aggregated {} grouped rows into {} events ({} ignored)",
        raw.len(),
        aggregation.total_events,
        aggregation.ignored_rows
    );

    Ok(HeatmapData {
        rows: aggregation.rows,
        metadata: HeatmapMetadata {
            total_records: aggregation.total_events,
            date_range: DateRange { start, end },
            days_requested: days,
        },
        ignored_rows: aggregation.ignored_rows,
    })
}
