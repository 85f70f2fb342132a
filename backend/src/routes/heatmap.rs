use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::heatmap::Weekday;

// =========================================================
// Heatmap types
// =========================================================

/// One time-slot row of the access heatmap.
///
/// Serializes as `{ "hora": "<label>", "domingo": n, ..., "sabado": n }`
/// with the weekday keys always present and in calendar order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HeatmapRowWire", into = "HeatmapRowWire")]
pub struct HeatmapRow {
    pub slot_label: String,
    counts: [u64; 7],
}

impl HeatmapRow {
    /// Row with every weekday at zero.
    pub fn empty(slot_label: impl Into<String>) -> Self {
        Self {
            slot_label: slot_label.into(),
            counts: [0; 7],
        }
    }

    pub fn count(&self, day: Weekday) -> u64 {
        self.counts[day.index()]
    }

    pub fn add(&mut self, day: Weekday, amount: u64) {
        let cell = &mut self.counts[day.index()];
        *cell = cell.saturating_add(amount);
    }

    /// `(weekday, count)` pairs in calendar order, Sunday first.
    pub fn counts(&self) -> impl Iterator<Item = (Weekday, u64)> + '_ {
        Weekday::ALL.iter().map(move |day| (*day, self.count(*day)))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HeatmapRowWire {
    hora: String,
    #[serde(default)]
    domingo: u64,
    #[serde(default)]
    lunes: u64,
    #[serde(default)]
    martes: u64,
    #[serde(default)]
    miercoles: u64,
    #[serde(default)]
    jueves: u64,
    #[serde(default)]
    viernes: u64,
    #[serde(default)]
    sabado: u64,
}

impl From<HeatmapRowWire> for HeatmapRow {
    fn from(w: HeatmapRowWire) -> Self {
        Self {
            slot_label: w.hora,
            counts: [
                w.domingo,
                w.lunes,
                w.martes,
                w.miercoles,
                w.jueves,
                w.viernes,
                w.sabado,
            ],
        }
    }
}

impl From<HeatmapRow> for HeatmapRowWire {
    fn from(r: HeatmapRow) -> Self {
        let [domingo, lunes, martes, miercoles, jueves, viernes, sabado] = r.counts;
        Self {
            hora: r.slot_label,
            domingo,
            lunes,
            martes,
            miercoles,
            jueves,
            viernes,
            sabado,
        }
    }
}

/// Inclusive window the heatmap was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapMetadata {
    /// Number of access events placed in the matrix.
    pub total_records: u64,
    pub date_range: DateRange,
    pub days_requested: u32,
}

/// Complete heatmap dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapData {
    pub rows: Vec<HeatmapRow>,
    pub metadata: HeatmapMetadata,
    /// Grouped rows dropped for an out-of-range hour or weekday.
    #[serde(skip)]
    pub ignored_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_serializes_with_locale_keys_in_order() {
        let mut row = HeatmapRow::empty("08:00-11:59");
        row.add(Weekday::Monday, 20);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"hora":"08:00-11:59","domingo":0,"lunes":20,"martes":0,"miercoles":0,"jueves":0,"viernes":0,"sabado":0}"#
        );
    }

    #[test]
    fn test_row_deserializes_missing_days_as_zero() {
        let row: HeatmapRow = serde_json::from_str(r#"{"hora":"x","sabado":3}"#).unwrap();
        assert_eq!(row.count(Weekday::Saturday), 3);
        assert_eq!(row.total(), 3);
    }

    #[test]
    fn test_add_saturates() {
        let mut row = HeatmapRow::empty("x");
        row.add(Weekday::Sunday, u64::MAX);
        row.add(Weekday::Sunday, 5);
        assert_eq!(row.count(Weekday::Sunday), u64::MAX);
    }

    #[test]
    fn test_metadata_is_camel_case() {
        let start = DateTime::parse_from_rfc3339("2025-03-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let meta = HeatmapMetadata {
            total_records: 23,
            date_range: DateRange { start, end: start },
            days_requested: 7,
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["totalRecords"], 23);
        assert_eq!(value["daysRequested"], 7);
        assert!(value["dateRange"]["start"].is_string());
    }
}
