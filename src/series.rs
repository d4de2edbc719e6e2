//! Value extraction from history records
//!
//! A [`Series`] is the column of one field, reordered by the `Update`
//! timestamp of each row. History rows arrive in whatever order the
//! backend produced them, so extraction pairs every value with its
//! timestamp, stable-sorts the pairs and then drops the timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, Result};
use crate::types::HistoryRecord;

/// What to do with a row that has no value for the requested field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Abort extraction with [`ChartError::MissingField`]
    #[default]
    Fail,
    /// Treat the value as `0`
    Zero,
}

impl MissingFieldPolicy {
    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            MissingFieldPolicy::Fail => "Fail",
            MissingFieldPolicy::Zero => "Zero",
        }
    }
}

/// Chronologically ordered samples of one field
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    field: String,
    values: Vec<f64>,
    observed_max: f64,
}

impl Series {
    /// Extract `field` from `records`, ordered by `Update`.
    ///
    /// Text that does not parse as a number is kept as `NaN` so that the
    /// encoder can mark it; it never contributes to the maximum.
    pub fn extract(
        records: &[HistoryRecord],
        field: &str,
        policy: MissingFieldPolicy,
    ) -> Result<Self> {
        let mut pairs: Vec<(DateTime<Utc>, f64)> = Vec::with_capacity(records.len());
        let mut unparsable = 0usize;

        for (row, record) in records.iter().enumerate() {
            let time = record.update_time(row)?;
            let value = match record.get(field).filter(|v| !v.is_null()) {
                Some(raw) => raw.as_f64().unwrap_or_else(|| {
                    unparsable += 1;
                    f64::NAN
                }),
                None => match policy {
                    MissingFieldPolicy::Fail => {
                        return Err(ChartError::MissingField {
                            field: field.to_string(),
                            row,
                        })
                    }
                    MissingFieldPolicy::Zero => 0.0,
                },
            };
            pairs.push((time, value));
        }

        if unparsable > 0 {
            tracing::warn!(
                "{} non-numeric value(s) in field '{}' will be plotted as gaps",
                unparsable,
                field
            );
        }

        // sort_by is stable: rows sharing a timestamp keep arrival order
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let values: Vec<f64> = pairs.into_iter().map(|(_, v)| v).collect();
        tracing::trace!("Extracted {} samples for '{}'", values.len(), field);
        Ok(Self::from_values(field, values))
    }

    /// Build a series from already ordered values
    pub fn from_values(field: impl Into<String>, values: Vec<f64>) -> Self {
        let observed_max = observed_max(&values);
        Self {
            field: field.into(),
            values,
            observed_max,
        }
    }

    /// Field this series was extracted from
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Samples in chronological order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consume the series, returning its samples
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no samples
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest finite sample, or 0 when there is none above 0
    pub fn observed_max(&self) -> f64 {
        self.observed_max
    }

    /// Upper bound of the chart axis for this series
    pub fn scale_max(&self) -> u64 {
        scale_max(self.observed_max)
    }
}

/// Largest finite value, starting from 0
pub fn observed_max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max)
}

/// Smallest integer strictly greater than `observed`, never below 1.
///
/// The extra unit keeps the scale non-zero for all-zero series and
/// leaves headroom so that the maximum itself stays inside the encoders'
/// range.
pub fn scale_max(observed: f64) -> u64 {
    if observed.is_finite() && observed > 0.0 {
        (observed.floor() as u64).saturating_add(1)
    } else {
        1
    }
}

/// Earliest and latest `Update` among `records`
pub fn time_bounds(records: &[HistoryRecord]) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let mut bounds: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
    for (row, record) in records.iter().enumerate() {
        let t = record.update_time(row)?;
        bounds = Some(match bounds {
            None => (t, t),
            Some((lo, hi)) => (lo.min(t), hi.max(t)),
        });
    }
    Ok(bounds)
}
