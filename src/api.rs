//! Monitoring backend interface
//!
//! The backend answers every request with the same envelope:
//!
//! ```json
//! { "OK": true, "Value": { "fields": ["Load", "Update"], "data": [[0.4, 1700000000]] } }
//! { "OK": false, "Message": "Instance Id has to be a number!" }
//! ```
//!
//! History comes in two layouts. Aggregated endpoints return a column
//! table (`fields` + positional `data` rows); the per-instance endpoint
//! returns `{"history": [{"Load": .., "Update": ..}, ..]}`. Both convert
//! into [`HistoryRecord`]s.
//!
//! The HTTP side is not implemented here. [`HistorySource`] describes the
//! calls a transport has to provide.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ChartError, Result};
use crate::types::{FieldValue, HistoryRecord};

/// Smallest bucket the running-instances endpoint accepts (seconds)
pub const MIN_RUNNING_BUCKET_SECS: u32 = 300;

/// Default aggregation bucket (seconds)
pub const DEFAULT_BUCKET_SECS: u32 = 900;

/// Response envelope used by every backend call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(rename = "OK")]
    pub ok: bool,

    #[serde(rename = "Message", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(rename = "Value", skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying a value
    pub fn success(value: T) -> Self {
        Self {
            ok: true,
            message: None,
            value: Some(value),
        }
    }

    /// Failed response with a message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
            value: None,
        }
    }

    /// Unwrap the envelope, turning `OK: false` into [`ChartError::Upstream`]
    pub fn into_result(self) -> Result<T> {
        if !self.ok {
            return Err(ChartError::Upstream(
                self.message
                    .unwrap_or_else(|| "request failed without a message".to_string()),
            ));
        }
        self.value
            .ok_or_else(|| ChartError::MalformedResponse("OK response without Value".to_string()))
    }
}

/// Column-oriented history table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryTable {
    /// Column names, positionally matching each row
    pub fields: Vec<String>,
    /// Rows of values
    pub data: Vec<Vec<FieldValue>>,
}

impl HistoryTable {
    /// Position of a column
    pub fn column_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Convert rows into keyed records.
    ///
    /// A row whose width differs from `fields` is rejected.
    pub fn records(&self) -> Result<Vec<HistoryRecord>> {
        self.data
            .iter()
            .enumerate()
            .map(|(row, values)| {
                if values.len() != self.fields.len() {
                    return Err(ChartError::MalformedResponse(format!(
                        "row {} has {} values for {} fields",
                        row,
                        values.len(),
                        self.fields.len()
                    )));
                }
                Ok(self
                    .fields
                    .iter()
                    .cloned()
                    .zip(values.iter().cloned())
                    .collect())
            })
            .collect()
    }
}

/// History in either of the layouts the backend produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryPayload {
    /// `{ "fields": [..], "data": [[..]] }`
    Table(HistoryTable),
    /// `{ "history": [{..}, ..] }`
    Records { history: Vec<HistoryRecord> },
}

impl HistoryPayload {
    /// Records in arrival order
    pub fn into_records(self) -> Result<Vec<HistoryRecord>> {
        match self {
            HistoryPayload::Table(table) => table.records(),
            HistoryPayload::Records { history } => Ok(history),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        match self {
            HistoryPayload::Table(table) => table.data.len(),
            HistoryPayload::Records { history } => history.len(),
        }
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a raw history response and unwrap it into records
pub fn parse_history_response(json: &str) -> Result<Vec<HistoryRecord>> {
    let response: ApiResponse<HistoryPayload> = serde_json::from_str(json)?;
    response.into_result()?.into_records()
}

/// Instance counts per status, as returned by `getInstanceStatusCounters`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCounters(pub BTreeMap<String, u64>);

impl StatusCounters {
    /// `(status, instances)` rows for a pie chart, ordered by status name
    pub fn pie_rows(&self) -> Vec<(String, u64)> {
        self.0.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    /// Total number of instances over all statuses
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

/// Parameters of the aggregated history endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Averaging bucket in seconds
    pub bucket_size: u32,
    /// Look-back window in seconds, 0 for all history
    pub timespan: u64,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SECS,
            timespan: 0,
        }
    }
}

impl HistoryQuery {
    /// Query over the last `timespan` seconds
    pub fn with_timespan(timespan: u64) -> Self {
        Self {
            timespan,
            ..Default::default()
        }
    }

    /// Same query with the bucket raised to what the running-instances
    /// endpoint accepts
    pub fn for_running_instances(self) -> Self {
        Self {
            bucket_size: self.bucket_size.max(MIN_RUNNING_BUCKET_SECS),
            ..self
        }
    }
}

/// One bucket of running-instance history.
///
/// The totals endpoint returns `[date, count]` rows; the grouped ones
/// return `[date, group, count]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunningSample {
    Total(FieldValue, f64),
    Grouped(FieldValue, String, f64),
}

impl RunningSample {
    /// Bucket start as sent by the backend
    pub fn date(&self) -> &FieldValue {
        match self {
            RunningSample::Total(date, _) | RunningSample::Grouped(date, _, _) => date,
        }
    }

    /// Running instances in the bucket
    pub fn count(&self) -> f64 {
        match self {
            RunningSample::Total(_, count) | RunningSample::Grouped(_, _, count) => *count,
        }
    }
}

/// What grouped running-instance history is split by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunningGrouping {
    Endpoint,
    RunningPod,
    Image,
}

impl RunningGrouping {
    /// Backend call serving this grouping
    pub fn endpoint(&self) -> &'static str {
        match self {
            RunningGrouping::Endpoint => "getRunningInstancesBEPHistory",
            RunningGrouping::RunningPod => "getRunningInstancesByRunningPodHistory",
            RunningGrouping::Image => "getRunningInstancesByImageHistory",
        }
    }
}

/// Calls the chart layer needs from the monitoring backend
#[cfg_attr(test, mockall::automock)]
pub trait HistorySource {
    /// `getHistoryForInstanceID`
    fn instance_history(&self, instance_id: u64) -> Result<ApiResponse<HistoryPayload>>;

    /// `getGroupedInstanceHistory`
    fn grouped_history(&self) -> Result<ApiResponse<HistoryPayload>>;

    /// `getHistoryValues`
    fn history_values(
        &self,
        query: &HistoryQuery,
        fields: &[String],
    ) -> Result<ApiResponse<HistoryPayload>>;

    /// `getRunningInstancesHistory`
    fn running_instances_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<ApiResponse<Vec<RunningSample>>>;

    /// Running instances per group, see [`RunningGrouping::endpoint`]
    fn running_instances_by(
        &self,
        grouping: RunningGrouping,
        query: &HistoryQuery,
    ) -> Result<ApiResponse<Vec<RunningSample>>>;

    /// `getInstanceStatusCounters`
    fn status_counters(&self) -> Result<ApiResponse<StatusCounters>>;
}

/// Fetch and unwrap one instance's history
pub fn fetch_instance_history(
    source: &dyn HistorySource,
    instance_id: u64,
) -> Result<Vec<HistoryRecord>> {
    let response = source.instance_history(instance_id)?;
    if !response.ok {
        tracing::warn!(
            "History request for instance {} failed: {:?}",
            instance_id,
            response.message
        );
    }
    response.into_result()?.into_records()
}

/// Fetch running-instance history, totals when `grouping` is `None`
pub fn fetch_running_history(
    source: &dyn HistorySource,
    grouping: Option<RunningGrouping>,
    query: HistoryQuery,
) -> Result<Vec<RunningSample>> {
    let query = query.for_running_instances();
    let response = match grouping {
        Some(grouping) => source.running_instances_by(grouping, &query)?,
        None => source.running_instances_history(&query)?,
    };
    response.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_response() {
        let json = r#"{"OK": true, "Value": {"fields": ["Load", "Update"],
            "data": [[0.5, 1700000000], [1.5, "2023-11-14 22:15:00"]]}}"#;
        let records = parse_history_response(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("Load").and_then(FieldValue::as_f64), Some(1.5));
        assert!(records[1].update_time(1).is_ok());
    }

    #[test]
    fn test_parse_records_response() {
        let json = r#"{"OK": true, "Value": {"history": [
            {"Status": "Running", "Load": 0.2, "Update": "2023-11-14 22:15:00"}]}}"#;
        let records = parse_history_response(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Status"), Some(&FieldValue::from("Running")));
    }

    #[test]
    fn test_failed_response() {
        let json = r#"{"OK": false, "Message": "Instance Id has to be a number!"}"#;
        let err = parse_history_response(json).unwrap_err();
        assert!(matches!(err, ChartError::Upstream(ref m) if m.contains("number")));
    }

    #[test]
    fn test_ok_without_value() {
        let response: ApiResponse<HistoryPayload> = serde_json::from_str(r#"{"OK": true}"#).unwrap();
        assert!(matches!(
            response.into_result(),
            Err(ChartError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_ragged_row_rejected() {
        let table = HistoryTable {
            fields: vec!["Load".into(), "Update".into()],
            data: vec![vec![FieldValue::Number(1.0)]],
        };
        assert!(matches!(
            table.records(),
            Err(ChartError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_status_counters() {
        let counters: StatusCounters =
            serde_json::from_str(r#"{"Running": 4, "Halted": 2, "Booting": 1}"#).unwrap();
        assert_eq!(counters.total(), 7);
        let rows = counters.pie_rows();
        assert_eq!(rows[0], ("Booting".to_string(), 1));
        assert_eq!(rows[2], ("Running".to_string(), 4));
    }

    #[test]
    fn test_running_query_bucket_floor() {
        let q = HistoryQuery {
            bucket_size: 60,
            timespan: 3600,
        };
        assert_eq!(q.for_running_instances().bucket_size, MIN_RUNNING_BUCKET_SECS);
        assert_eq!(HistoryQuery::with_timespan(10).bucket_size, DEFAULT_BUCKET_SECS);
    }

    #[test]
    fn test_fetch_through_mock_source() {
        let mut source = MockHistorySource::new();
        source
            .expect_instance_history()
            .withf(|id| *id == 12)
            .returning(|_| {
                Ok(ApiResponse::success(HistoryPayload::Table(HistoryTable {
                    fields: vec!["Load".into(), "Update".into()],
                    data: vec![vec![FieldValue::Number(0.7), FieldValue::Number(1.0e9)]],
                })))
            });

        let records = fetch_instance_history(&source, 12).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_fetch_upstream_failure() {
        let mut source = MockHistorySource::new();
        source
            .expect_instance_history()
            .returning(|_| Ok(ApiResponse::failure("denied")));

        assert!(matches!(
            fetch_instance_history(&source, 1),
            Err(ChartError::Upstream(_))
        ));
    }

    #[test]
    fn test_running_sample_layouts() {
        let samples: Vec<RunningSample> = serde_json::from_str(
            r#"[[1700000000, 4], ["2023-11-14 22:28:20", "cloud.example.org", 2]]"#,
        )
        .unwrap();
        assert!(matches!(samples[0], RunningSample::Total(_, _)));
        assert_eq!(samples[0].count(), 4.0);
        match &samples[1] {
            RunningSample::Grouped(_, group, count) => {
                assert_eq!(group, "cloud.example.org");
                assert_eq!(*count, 2.0);
            }
            other => panic!("unexpected sample {:?}", other),
        }
        assert!(samples[1].date().as_timestamp().is_some());
    }

    #[test]
    fn test_fetch_running_history_by_group() {
        let mut source = MockHistorySource::new();
        source
            .expect_running_instances_by()
            .withf(|grouping, query| {
                *grouping == RunningGrouping::Image && query.bucket_size == MIN_RUNNING_BUCKET_SECS
            })
            .returning(|_, _| {
                Ok(ApiResponse::success(vec![RunningSample::Grouped(
                    FieldValue::Number(1.0e9),
                    "sl6".into(),
                    3.0,
                )]))
            });
        source.expect_running_instances_history().never();

        let query = HistoryQuery {
            bucket_size: 60,
            timespan: 0,
        };
        let samples = fetch_running_history(&source, Some(RunningGrouping::Image), query).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(
            RunningGrouping::Image.endpoint(),
            "getRunningInstancesByImageHistory"
        );
    }
}
