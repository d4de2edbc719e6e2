//! Plot selection and the per-field encode pipeline
//!
//! A plot is chosen with a selector string such as `"Load|Transfer Bytes"`:
//! one or two field names separated by `|`. The form `"Transfer X"` asks
//! for the per-interval deltas of the cumulative counter `TransferredX`
//! instead of its running total.
//!
//! For each selected field the pipeline runs:
//!
//! ```text
//! records -> extract + sort -> [deaccumulate] -> scale max -> downsample -> encode
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::encoding::Encoding;
use crate::error::{ChartError, Result, ResultExt};
use crate::series::{MissingFieldPolicy, Series};
use crate::transform::{deaccumulate, downsample, DEFAULT_SAMPLE_CAP};
use crate::types::HistoryRecord;

/// Most series one chart can carry (one per vertical axis pair)
pub const MAX_PLOT_SERIES: usize = 2;

/// Separator between fields in a selector string
pub const SELECTOR_SEPARATOR: char = '|';

const DELTA_PREFIX: &str = "Transfer ";
const CUMULATIVE_PREFIX: &str = "Transferred";

/// One plotted field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    /// Label as written by the user
    pub label: String,
    /// History field to read
    pub field: String,
    /// Plot deltas instead of the cumulative value
    pub deaccumulate: bool,
}

impl FieldSelector {
    /// Plot `field` as is
    pub fn plain(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            label: field.clone(),
            field,
            deaccumulate: false,
        }
    }
}

impl FromStr for FieldSelector {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        let start = s.trim_start();
        let label = start.trim_end();
        if label.is_empty() {
            return Err(ChartError::InvalidSelector(s.to_string()));
        }
        match start.strip_prefix(DELTA_PREFIX) {
            Some(rest) if !rest.trim().is_empty() => Ok(Self {
                label: label.to_string(),
                field: format!("{}{}", CUMULATIVE_PREFIX, rest.trim()),
                deaccumulate: true,
            }),
            Some(_) => Err(ChartError::InvalidSelector(s.to_string())),
            None => Ok(Self::plain(label)),
        }
    }
}

/// The fields drawn in one chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotSelection {
    fields: Vec<FieldSelector>,
}

impl PlotSelection {
    /// Build a selection from parsed field selectors
    pub fn new(fields: Vec<FieldSelector>) -> Result<Self> {
        if fields.is_empty() || fields.len() > MAX_PLOT_SERIES {
            return Err(ChartError::InvalidSelector(format!(
                "expected 1 to {} fields, got {}",
                MAX_PLOT_SERIES,
                fields.len()
            )));
        }
        Ok(Self { fields })
    }

    /// Selected fields in axis order
    pub fn fields(&self) -> &[FieldSelector] {
        &self.fields
    }

    /// Labels joined with " vs "
    pub fn title(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.label.as_str())
            .collect::<Vec<_>>()
            .join(" vs ")
    }
}

impl FromStr for PlotSelection {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        let fields = s
            .split(SELECTOR_SEPARATOR)
            .map(|part| {
                part.parse::<FieldSelector>()
                    .map_err(|_| ChartError::InvalidSelector(s.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(fields)
    }
}

impl std::fmt::Display for PlotSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self.fields.iter().map(|s| s.label.as_str()).collect();
        write!(f, "{}", labels.join("|"))
    }
}

/// Knobs of the encode pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    pub encoding: Encoding,
    pub sample_cap: usize,
    pub missing_field: MissingFieldPolicy,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            sample_cap: DEFAULT_SAMPLE_CAP,
            missing_field: MissingFieldPolicy::default(),
        }
    }
}

/// Encoded data of one series, ready for a chart request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSeries {
    /// Upper bound of the axis the data was scaled against
    pub max: u64,
    /// Samples in `data`
    pub entries: usize,
    /// Encoded samples
    pub data: String,
}

impl EncodedSeries {
    /// Encoding of an empty series
    pub fn empty() -> Self {
        Self {
            max: 1,
            entries: 0,
            data: String::new(),
        }
    }
}

/// An encoded series with its axis label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotSeries {
    pub label: String,
    #[serde(flatten)]
    pub series: EncodedSeries,
}

/// Run the pipeline for one field
pub fn encode_field(
    records: &[HistoryRecord],
    selector: &FieldSelector,
    options: &EncodeOptions,
) -> Result<EncodedSeries> {
    let mut series = Series::extract(records, &selector.field, options.missing_field)?;
    if selector.deaccumulate {
        series = Series::from_values(series.field().to_string(), deaccumulate(series.values()));
    }
    let max = series.scale_max();
    let samples = downsample(series.values(), options.sample_cap);
    let data = options.encoding.encode(&samples, max as f64);

    tracing::debug!(
        "Encoded '{}': {} -> {} samples, max {}, {} encoding",
        selector.label,
        series.len(),
        samples.len(),
        max,
        options.encoding
    );

    Ok(EncodedSeries {
        max,
        entries: samples.len(),
        data,
    })
}

/// Run the pipeline for every field of a selection
pub fn encode_selection(
    records: &[HistoryRecord],
    selection: &PlotSelection,
    options: &EncodeOptions,
) -> Result<Vec<PlotSeries>> {
    selection
        .fields()
        .iter()
        .map(|selector| {
            let series = encode_field(records, selector, options)
                .with_context(|| format!("Encoding '{}'", selector.label))?;
            Ok(PlotSeries {
                label: selector.label.clone(),
                series,
            })
        })
        .collect()
}
