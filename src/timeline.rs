//! Tables for native timeline charts
//!
//! Dashboards draw aggregated history with a client-side annotated
//! timeline rather than an image. That widget wants a typed table: one
//! date column and one number column per field, human-readable column
//! labels, and one colour per plotted field.
//!
//! Running-instance history has its own two shapes: a single "Running
//! VMs" column, or one column per group (endpoint, image, pod) pivoted
//! out of `[date, group, count]` rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::api::{HistoryTable, RunningSample};
use crate::error::{ChartError, Result};
use crate::types::{FieldValue, UPDATE_FIELD};

/// Bytes per GiB, the unit transferred bytes are shown in
pub const BYTES_PER_GIB: f64 = 1_073_741_824.0;

/// Columns rescaled by the timeline's autoscaling
pub const MAX_SCALED_COLUMNS: usize = 3;

/// Label of the running-instance total column
pub const RUNNING_LABEL: &str = "Running VMs";

/// Placeholder column of a grouped table with no data
pub const NO_VMS_LABEL: &str = "No VMs";

/// Line colour of running-instance charts
pub const RUNNING_COLOR: &str = "3fa900";

/// Kind of a timeline column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Date,
    Number,
}

/// Column header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineColumn {
    /// Source field
    pub field: String,
    /// Display label
    pub label: String,
    pub kind: ColumnKind,
}

/// One table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimelineCell {
    Date(DateTime<Utc>),
    /// `None` for values that are missing or non-numeric
    Number(Option<f64>),
}

/// Typed table for a timeline chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineTable {
    pub columns: Vec<TimelineColumn>,
    pub rows: Vec<Vec<TimelineCell>>,
    /// Colours of the number columns that have one, in column order
    pub colors: Vec<String>,
    /// Indices of the number series the chart autoscales
    pub scale_columns: Vec<usize>,
}

/// Display label of a history field
pub fn field_label(field: &str) -> &str {
    match field {
        UPDATE_FIELD => "Date",
        "Jobs" => "Started jobs",
        "TransferredFiles" => "Files transferred",
        "TransferredBytes" => "Data transferred (GiB)",
        other => other,
    }
}

/// Line colour of a history field
pub fn field_color(field: &str) -> Option<&'static str> {
    match field {
        "Load" => Some("4684ee"),
        "TransferredBytes" => Some("c9710d"),
        "TransferredFiles" => Some("0ab58c"),
        "Jobs" => Some("b00c12"),
        _ => None,
    }
}

/// Value of `field` in display units
fn display_value(field: &str, value: &FieldValue) -> Option<f64> {
    let v = value.as_f64()?;
    Some(match field {
        "TransferredBytes" => v / BYTES_PER_GIB,
        _ => v,
    })
}

impl TimelineTable {
    /// Build the table from a history table, ordered by update time
    pub fn from_history(table: &HistoryTable) -> Result<Self> {
        let columns: Vec<TimelineColumn> = table
            .fields
            .iter()
            .map(|field| TimelineColumn {
                field: field.clone(),
                label: field_label(field).to_string(),
                kind: if field == UPDATE_FIELD {
                    ColumnKind::Date
                } else {
                    ColumnKind::Number
                },
            })
            .collect();

        let date_column = table.column_index(UPDATE_FIELD);

        let mut rows = Vec::with_capacity(table.data.len());
        for (row_index, record) in table.data.iter().enumerate() {
            if record.len() != columns.len() {
                return Err(ChartError::MalformedResponse(format!(
                    "row {} has {} values for {} fields",
                    row_index,
                    record.len(),
                    columns.len()
                )));
            }
            let row = columns
                .iter()
                .zip(record)
                .map(|(column, value)| match column.kind {
                    ColumnKind::Date => value
                        .as_timestamp()
                        .map(TimelineCell::Date)
                        .ok_or_else(|| ChartError::InvalidTimestamp {
                            row: row_index,
                            value: value.to_string(),
                        }),
                    ColumnKind::Number => {
                        Ok(TimelineCell::Number(display_value(&column.field, value)))
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }

        if let Some(idx) = date_column {
            rows.sort_by(|a, b| match (&a[idx], &b[idx]) {
                (TimelineCell::Date(x), TimelineCell::Date(y)) => x.cmp(y),
                _ => std::cmp::Ordering::Equal,
            });
        }

        let number_columns = columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Number)
            .count();
        let colors = columns
            .iter()
            .filter_map(|c| field_color(&c.field).map(str::to_string))
            .collect();

        tracing::debug!(
            "Timeline table: {} columns, {} rows",
            columns.len(),
            rows.len()
        );

        Ok(Self {
            columns,
            rows,
            colors,
            scale_columns: (0..number_columns.min(MAX_SCALED_COLUMNS)).collect(),
        })
    }
}

fn date_column() -> TimelineColumn {
    TimelineColumn {
        field: UPDATE_FIELD.to_string(),
        label: field_label(UPDATE_FIELD).to_string(),
        kind: ColumnKind::Date,
    }
}

fn number_column(name: &str) -> TimelineColumn {
    TimelineColumn {
        field: name.to_string(),
        label: name.to_string(),
        kind: ColumnKind::Number,
    }
}

fn sample_date(row: usize, sample: &RunningSample) -> Result<DateTime<Utc>> {
    sample
        .date()
        .as_timestamp()
        .ok_or_else(|| ChartError::InvalidTimestamp {
            row,
            value: sample.date().to_string(),
        })
}

impl TimelineTable {
    /// Date + "Running VMs" table from `[date, count]` samples
    pub fn running(samples: &[RunningSample]) -> Result<Self> {
        let mut rows = Vec::with_capacity(samples.len());
        for (row, sample) in samples.iter().enumerate() {
            let RunningSample::Total(_, count) = sample else {
                return Err(ChartError::MalformedResponse(format!(
                    "row {} is grouped, expected [date, count]",
                    row
                )));
            };
            rows.push((sample_date(row, sample)?, *count));
        }
        rows.sort_by_key(|(date, _)| *date);

        Ok(Self {
            columns: vec![date_column(), number_column(RUNNING_LABEL)],
            rows: rows
                .into_iter()
                .map(|(date, count)| {
                    vec![TimelineCell::Date(date), TimelineCell::Number(Some(count))]
                })
                .collect(),
            colors: vec![RUNNING_COLOR.to_string()],
            scale_columns: vec![0],
        })
    }

    /// Date + one column per group from `[date, group, count]` samples.
    ///
    /// Groups keep the order they first appear in. A group missing from a
    /// bucket counts 0. With no samples the table has a single empty
    /// "No VMs" column.
    pub fn running_by_field(samples: &[RunningSample]) -> Result<Self> {
        let mut groups: Vec<String> = Vec::new();
        let mut buckets: BTreeMap<DateTime<Utc>, HashMap<&str, f64>> = BTreeMap::new();

        for (row, sample) in samples.iter().enumerate() {
            let RunningSample::Grouped(_, group, count) = sample else {
                return Err(ChartError::MalformedResponse(format!(
                    "row {} has no group, expected [date, group, count]",
                    row
                )));
            };
            if !groups.contains(group) {
                groups.push(group.clone());
            }
            buckets
                .entry(sample_date(row, sample)?)
                .or_default()
                .insert(group.as_str(), *count);
        }

        if groups.is_empty() {
            return Ok(Self {
                columns: vec![date_column(), number_column(NO_VMS_LABEL)],
                rows: Vec::new(),
                colors: vec![RUNNING_COLOR.to_string()],
                scale_columns: Vec::new(),
            });
        }

        let rows: Vec<Vec<TimelineCell>> = buckets
            .into_iter()
            .map(|(date, counts)| {
                std::iter::once(TimelineCell::Date(date))
                    .chain(groups.iter().map(|group| {
                        TimelineCell::Number(Some(
                            counts.get(group.as_str()).copied().unwrap_or(0.0),
                        ))
                    }))
                    .collect::<Vec<_>>()
            })
            .collect();

        tracing::debug!(
            "Running table: {} groups, {} buckets",
            groups.len(),
            rows.len()
        );

        Ok(Self {
            columns: std::iter::once(date_column())
                .chain(groups.iter().map(|g| number_column(g)))
                .collect(),
            rows,
            colors: vec![RUNNING_COLOR.to_string()],
            scale_columns: Vec::new(),
        })
    }

    /// [`running`](Self::running) or [`running_by_field`](Self::running_by_field),
    /// whichever matches the sample layout
    pub fn from_running(samples: &[RunningSample]) -> Result<Self> {
        match samples.first() {
            Some(RunningSample::Grouped(..)) => Self::running_by_field(samples),
            _ => Self::running(samples),
        }
    }
}
