use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{AnalysisError, Result};
use crate::models::{RawTable, ShiftOffer, ShiftPeriod, REQUIRED_COLUMNS, TIMESTAMP_COLUMNS};

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn normalize_slot(slot: &str) -> Option<String> {
    let slot = slot.trim();
    if slot.is_empty() {
        None
    } else {
        Some(slot.to_uppercase())
    }
}

pub fn classify_period(slot: Option<&str>) -> ShiftPeriod {
    match slot {
        Some("NOC") => ShiftPeriod::Overnight,
        Some("AM" | "MORNING") => ShiftPeriod::Am,
        Some("PM" | "AFTERNOON" | "EVENING") => ShiftPeriod::Pm,
        _ => ShiftPeriod::Unknown,
    }
}

/// Parses a timestamp cell; anything unrecognised becomes `None`.
///
/// Offset-bearing values are converted to UTC before the offset is dropped.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed.naive_utc());
        }
    }

    let bare = value
        .strip_suffix(" UTC")
        .or_else(|| value.strip_suffix('Z'))
        .unwrap_or(value);
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(bare, format) {
            return Some(parsed);
        }
    }

    NaiveDate::parse_from_str(bare, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

struct ColumnIndex {
    positions: HashMap<&'static str, usize>,
}

impl ColumnIndex {
    fn resolve(columns: &[String]) -> Result<Self> {
        let mut index: HashMap<String, usize> = HashMap::new();
        for (position, column) in columns.iter().enumerate() {
            index.entry(normalize_column_name(column)).or_insert(position);
        }

        let mut positions = HashMap::new();
        for column in REQUIRED_COLUMNS {
            let position = index
                .get(column)
                .copied()
                .ok_or_else(|| AnalysisError::MissingColumn(column.to_string()))?;
            positions.insert(column, position);
        }
        Ok(Self { positions })
    }

    fn cell<'a>(&self, record: &'a [String], column: &str) -> &'a str {
        self.positions
            .get(column)
            .and_then(|&position| record.get(position))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn number(&self, record: &[String], column: &str, row: usize) -> Result<f64> {
        let value = self.cell(record, column);
        parse_number(value, column, row)
    }

    /// Blank cells read as `None`; anything else must parse.
    fn optional_number(&self, record: &[String], column: &str, row: usize) -> Result<Option<f64>> {
        let value = self.cell(record, column);
        if value.trim().is_empty() {
            return Ok(None);
        }
        parse_number(value, column, row).map(Some)
    }
}

fn parse_number(value: &str, column: &str, row: usize) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .ok_or_else(|| AnalysisError::InvalidNumber {
            row,
            column: column.to_string(),
            value: value.to_string(),
        })
}

pub fn normalize(raw: &RawTable) -> Result<Vec<ShiftOffer>> {
    let columns = ColumnIndex::resolve(&raw.columns)?;
    let mut coerced: HashMap<&str, usize> = HashMap::new();
    let mut offers = Vec::with_capacity(raw.records.len());

    for (row_index, record) in raw.records.iter().enumerate() {
        let row = row_index + 1;

        let mut timestamps = [None; TIMESTAMP_COLUMNS.len()];
        for (position, column) in TIMESTAMP_COLUMNS.into_iter().enumerate() {
            let value = columns.cell(record, column);
            timestamps[position] = parse_timestamp(value);
            if timestamps[position].is_none() && !value.trim().is_empty() {
                *coerced.entry(column).or_insert(0) += 1;
            }
        }

        let slot = normalize_slot(columns.cell(record, "slot"));
        let shift_period = classify_period(slot.as_deref());

        offers.push(ShiftOffer {
            worker_id: columns.cell(record, "worker_id").trim().to_string(),
            shift_id: columns.cell(record, "shift_id").trim().to_string(),
            slot,
            shift_period,
            pay_rate: columns.number(record, "pay_rate", row)?,
            charge_rate: columns.optional_number(record, "charge_rate", row)?,
            duration: columns.optional_number(record, "duration", row)?,
            shift_start_at: timestamps[0],
            shift_created_at: timestamps[1],
            offer_viewed_at: timestamps[2],
            claimed_at: timestamps[3],
            canceled_at: timestamps[4],
            deleted_at: timestamps[5],
        });
    }

    for column in TIMESTAMP_COLUMNS {
        if let Some(count) = coerced.get(column) {
            tracing::warn!(column, count, "unparseable timestamps coerced to null");
        }
    }
    tracing::info!(rows = offers.len(), "normalized shift offers");

    Ok(offers)
}
