//! Integration tests for the history-to-chart workflow
//!
//! These tests drive the public API the way a dashboard does:
//! - Parsing backend responses in both history layouts
//! - Encoding selections, including delta plots and downsampling
//! - Building chart URLs and timeline tables
//! - Routing everything through the plot controller

mod common;

use common::builders::{HistoryBuilder, START_EPOCH};
use common::query_map;
use vmchart_rs::api::parse_history_response;
use vmchart_rs::encoding::simple;
use vmchart_rs::plot::encode_selection;
use vmchart_rs::{
    build_chart_url, encode_field, ApiResponse, ChartConfig, ChartError, EncodeOptions,
    Encoding, EventQueue, FieldSelector, HistoryPayload, MissingFieldPolicy, PlotController,
    PlotEvent, PlotOutcome, PlotSelection, RenderArea, RunningSample, TimelineTable,
};

#[test]
fn test_simple_encoding_scenario() {
    let records = HistoryBuilder::new(&["Load"])
        .samples(&[10.0, 20.0, 15.0, 30.0])
        .records();
    let options = EncodeOptions {
        encoding: Encoding::Simple,
        ..Default::default()
    };

    let encoded = encode_field(&records, &FieldSelector::plain("Load"), &options).unwrap();
    assert_eq!(encoded.max, 31);
    assert_eq!(encoded.entries, 4);

    // 30 / 31 of the scale sits two symbols below the top one
    let last = encoded.data.as_bytes()[3];
    let index = simple::SIMPLE_ALPHABET.iter().position(|&b| b == last).unwrap();
    assert_eq!(index, 59);
    assert_eq!(encoded.data, "Une7");
}

#[test]
fn test_deaccumulation_scenario() {
    let records = HistoryBuilder::new(&["TransferredFiles"])
        .samples(&[5.0, 5.0, 8.0, 8.0, 20.0])
        .reversed()
        .records();
    let selector: FieldSelector = "Transfer Files".parse().unwrap();
    let options = EncodeOptions::default();

    let encoded = encode_field(&records, &selector, &options).unwrap();
    assert_eq!(encoded.entries, 4);
    assert_eq!(encoded.max, 13);
    let decoded = Encoding::Extended.decode(&encoded.data, 13.0).unwrap();
    let expected = [0.0, 3.0, 0.0, 12.0];
    for (d, e) in decoded.iter().zip(expected) {
        common::assert_float_eq(d.unwrap(), e, 13.0 / 4096.0);
    }
}

#[test]
fn test_downsampling_scenario() {
    let values: Vec<f64> = (0..405).map(|i| (i % 10) as f64).collect();
    let records = HistoryBuilder::new(&["Load"]).samples(&values).records();
    let encoded =
        encode_field(&records, &FieldSelector::plain("Load"), &EncodeOptions::default()).unwrap();
    assert_eq!(encoded.entries, 101);
    assert_eq!(encoded.max, 10);
}

#[test]
fn test_records_layout_response() {
    let json = format!(
        r#"{{"OK": true, "Value": {{"history": [
            {{"Status": "Running", "Load": 0.8, "Jobs": 4, "Update": "2023-11-14 22:15:00"}},
            {{"Status": "Running", "Load": 0.2, "Jobs": 1, "Update": {}}}
        ]}}}}"#,
        START_EPOCH
    );
    let records = parse_history_response(&json).unwrap();
    let selection: PlotSelection = "Load|Jobs".parse().unwrap();
    let series = encode_selection(&records, &selection, &EncodeOptions::default()).unwrap();
    assert_eq!(series[0].label, "Load");
    assert_eq!(series[0].series.max, 1);
    assert_eq!(series[1].series.max, 5);
    // Chronological order puts the epoch row (Load 0.2) first
    let decoded = Encoding::Extended.decode(&series[0].series.data, 1.0).unwrap();
    assert!(decoded[0].unwrap() < decoded[1].unwrap());
}

#[test]
fn test_chart_url_end_to_end() {
    let json = HistoryBuilder::new(&["Load", "TransferredBytes"])
        .string_dates()
        .row(&[0.5, 1000.0])
        .row(&[1.5, 3000.0])
        .row(&[1.0, 3500.0])
        .response_json();
    let records = parse_history_response(&json).unwrap();
    let selection: PlotSelection = "Load|Transfer Bytes".parse().unwrap();

    let url = build_chart_url(
        &records,
        &selection,
        Some("1234"),
        RenderArea::new(810, 410),
        &ChartConfig::default(),
    )
    .unwrap();
    let q = query_map(&url);

    assert_eq!(q["chtt"], "Load vs Transfer Bytes for 1234");
    assert_eq!(q["chxr"], "0,0,2|2,0,2001");
    assert_eq!(q["chds"], "0,2|0,2001");
    assert_eq!(q["chs"], "800x400");
    assert_eq!(
        q["chxl"],
        "1:||Load||3:||Transfer Bytes||4:|2023-11-14 22:13:20|2023-11-14 22:15:20"
    );
    let data: Vec<&str> = q["chd"].trim_start_matches("e:").split(',').collect();
    assert_eq!(data[0].len(), 6);
    assert_eq!(data[1].len(), 4);
}

#[test]
fn test_time_axis_spans_sorted_updates() {
    // Quarter-hour buckets arriving newest first
    let records = HistoryBuilder::new(&["Load"])
        .interval(900)
        .samples(&[1.0, 2.0, 3.0])
        .reversed()
        .records();
    let selection: PlotSelection = "Load".parse().unwrap();

    let url = build_chart_url(
        &records,
        &selection,
        None,
        RenderArea::default(),
        &ChartConfig::default(),
    )
    .unwrap();
    assert_eq!(
        query_map(&url)["chxl"],
        "1:||Load||4:|2023-11-14 22:13:20|2023-11-14 22:43:20"
    );
}

#[test]
fn test_missing_field_policy_is_configurable() {
    let records = HistoryBuilder::new(&["Load"]).samples(&[1.0, 2.0]).records();
    let selection: PlotSelection = "Load|Jobs".parse().unwrap();

    let err = encode_selection(&records, &selection, &EncodeOptions::default()).unwrap_err();
    assert!(err.to_string().contains("Missing field 'Jobs'"));

    let options = EncodeOptions {
        missing_field: MissingFieldPolicy::Zero,
        ..Default::default()
    };
    let series = encode_selection(&records, &selection, &options).unwrap();
    assert_eq!(series[1].series.max, 1);
    assert_eq!(series[1].series.data, "AAAA");
}

#[test]
fn test_timeline_from_response() {
    let table = HistoryBuilder::new(&["Load", "Jobs", "TransferredFiles"])
        .row(&[0.1, 1.0, 10.0])
        .row(&[0.2, 2.0, 20.0])
        .reversed()
        .table();
    let timeline = TimelineTable::from_history(&table).unwrap();
    assert_eq!(timeline.columns.len(), 4);
    assert_eq!(timeline.columns[3].label, "Date");
    assert_eq!(timeline.colors, vec!["4684ee", "b00c12", "0ab58c"]);
    assert_eq!(timeline.rows.len(), 2);
}

#[test]
fn test_running_by_endpoint_from_response() {
    let json = format!(
        r#"{{"OK": true, "Value": [[{t0}, "cern", 3], [{t0}, "pic", 1], [{t1}, "cern", 2]]}}"#,
        t0 = START_EPOCH,
        t1 = START_EPOCH + 900
    );
    let response: ApiResponse<Vec<RunningSample>> = serde_json::from_str(&json).unwrap();
    let timeline = TimelineTable::from_running(&response.into_result().unwrap()).unwrap();

    let labels: Vec<&str> = timeline.columns.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["Date", "cern", "pic"]);
    let json = serde_json::to_value(&timeline.rows).unwrap();
    assert_eq!(json[1][1], 2.0);
    assert_eq!(json[1][2], 0.0);
}

#[test]
fn test_controller_through_queue() {
    let queue = EventQueue::new();
    let sender = queue.sender();
    let mut controller =
        PlotController::with_default_plot(ChartConfig::default(), RenderArea::new(600, 500))
            .unwrap();

    let table = HistoryBuilder::new(&["Load", "Jobs"])
        .row(&[0.3, 1.0])
        .row(&[0.6, 2.0])
        .table();

    // Request before data, then data, then request again
    sender.send(PlotEvent::GenerateRequested);
    sender.send(PlotEvent::HistoryLoaded {
        instance_id: "88".into(),
        response: ApiResponse::success(HistoryPayload::Table(table)),
    });
    sender.send(PlotEvent::GenerateRequested);

    let outcomes = queue.drain(&mut controller);
    assert_eq!(outcomes[0], PlotOutcome::Pending);
    assert_eq!(outcomes[1], PlotOutcome::Updated);
    let PlotOutcome::Rendered(url) = &outcomes[2] else {
        panic!("expected a rendered chart, got {:?}", outcomes[2]);
    };
    assert_eq!(query_map(url)["chtt"], "Load vs Jobs for 88");
}

#[test]
fn test_upstream_error_surfaces() {
    let json = r#"{"OK": false, "Message": "Oops, instance ID has to be an integer"}"#;
    assert!(matches!(
        parse_history_response(json),
        Err(ChartError::Upstream(_))
    ));
}
