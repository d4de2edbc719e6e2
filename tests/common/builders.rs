//! Test data builders for history payloads

use vmchart_rs::{FieldValue, HistoryRecord, HistoryTable};

/// First timestamp produced by [`HistoryBuilder`]
pub const START_EPOCH: i64 = 1_700_000_000;

/// Builder for a column-table history, one row per sample
pub struct HistoryBuilder {
    fields: Vec<String>,
    rows: Vec<Vec<FieldValue>>,
    interval: i64,
    string_dates: bool,
}

impl HistoryBuilder {
    pub fn new(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            rows: Vec::new(),
            interval: 60,
            string_dates: false,
        }
    }

    /// Seconds between consecutive rows
    pub fn interval(mut self, secs: i64) -> Self {
        self.interval = secs;
        self
    }

    /// Emit `Update` as "YYYY-MM-DD HH:MM:SS" instead of epoch seconds
    pub fn string_dates(mut self) -> Self {
        self.string_dates = true;
        self
    }

    /// Append a row; `values` align with the fields given to `new`
    pub fn row(mut self, values: &[f64]) -> Self {
        assert_eq!(values.len(), self.fields.len(), "row width");
        let mut row: Vec<FieldValue> = values.iter().map(|&v| FieldValue::Number(v)).collect();
        let secs = START_EPOCH + self.rows.len() as i64 * self.interval;
        row.push(if self.string_dates {
            let t = chrono::DateTime::from_timestamp(secs, 0).expect("valid timestamp");
            FieldValue::Text(vmchart_rs::types::format_update(&t))
        } else {
            FieldValue::Number(secs as f64)
        });
        self.rows.push(row);
        self
    }

    /// Append one row per value of a single-field history
    pub fn samples(self, values: &[f64]) -> Self {
        values.iter().fold(self, |b, &v| b.row(&[v]))
    }

    /// Reverse row order, so arrival order is newest first
    pub fn reversed(mut self) -> Self {
        self.rows.reverse();
        self
    }

    pub fn table(self) -> HistoryTable {
        let mut fields = self.fields;
        fields.push("Update".to_string());
        HistoryTable {
            fields,
            data: self.rows,
        }
    }

    pub fn records(self) -> Vec<HistoryRecord> {
        self.table().records().expect("builder rows are well formed")
    }

    /// `{"OK": true, "Value": {...}}` as a JSON string
    pub fn response_json(self) -> String {
        serde_json::json!({ "OK": true, "Value": self.table() }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_builder() {
        let table = HistoryBuilder::new(&["Load", "Jobs"])
            .row(&[0.5, 1.0])
            .row(&[0.7, 2.0])
            .table();

        assert_eq!(table.fields, vec!["Load", "Jobs", "Update"]);
        assert_eq!(table.data.len(), 2);
        assert_eq!(table.data[1][2], FieldValue::Number((START_EPOCH + 60) as f64));
    }
}
