//! Core data types for vmchart-rs
//!
//! This module contains the fundamental data structures used throughout
//! the crate for representing instance history as received from the
//! monitoring backend.
//!
//! # Main Types
//!
//! - [`FieldValue`] - A single cell of a history row (number, text or null)
//! - [`HistoryRecord`] - One history row, keyed by field name
//!
//! # Timestamps
//!
//! The `Update` column arrives in two shapes depending on the endpoint:
//! epoch seconds (`1700000000`) or a formatted string
//! (`"2023-11-14 22:13:20"`). Both are accepted by
//! [`HistoryRecord::update_time`] and normalized to UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ChartError, Result};

/// Name of the timestamp column in every history payload
pub const UPDATE_FIELD: &str = "Update";

/// Format used by the backend for string timestamps
pub const UPDATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single value in a history row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric value (integers arrive as whole floats)
    Number(f64),
    /// Text value (status names, formatted timestamps, stringified numbers)
    Text(String),
    /// Explicit `null`
    #[default]
    Null,
}

impl FieldValue {
    /// Numeric interpretation of this value.
    ///
    /// Text that parses as a number counts as numeric; anything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            FieldValue::Null => None,
        }
    }

    /// Returns true for `null`
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Interpret this value as an update timestamp.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Number(secs) => epoch_to_datetime(*secs),
            FieldValue::Text(s) => {
                let s = s.trim();
                NaiveDateTime::parse_from_str(s, UPDATE_FORMAT)
                    .map(|naive| naive.and_utc())
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(epoch_to_datetime))
            }
            FieldValue::Null => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

fn epoch_to_datetime(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Format a timestamp the way the backend does
pub fn format_update(time: &DateTime<Utc>) -> String {
    time.format(UPDATE_FORMAT).to_string()
}

/// One row of instance history.
///
/// Rows are kept in arrival order by their containers; nothing here
/// assumes chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryRecord {
    values: HashMap<String, FieldValue>,
}

impl HistoryRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Set a field value, replacing any previous one
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(field.into(), value.into());
    }

    /// Value of a field, if present
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Whether the record carries a (non-null) value for the field
    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some_and(|v| !v.is_null())
    }

    /// Number of fields in the record
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parsed `Update` timestamp. `row` is only used for error reporting.
    pub fn update_time(&self, row: usize) -> Result<DateTime<Utc>> {
        let raw = self.get(UPDATE_FIELD).filter(|v| !v.is_null()).ok_or_else(|| {
            ChartError::MissingField {
                field: UPDATE_FIELD.to_string(),
                row,
            }
        })?;
        raw.as_timestamp()
            .ok_or_else(|| ChartError::InvalidTimestamp {
                row,
                value: raw.to_string(),
            })
    }
}

impl FromIterator<(String, FieldValue)> for HistoryRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
