//! # vmchart-rs: chart payloads for VM instance history
//!
//! Turns the history that the virtual-machine monitoring backend reports
//! for its instances (load, jobs, transferred files and bytes over time)
//! into chart payloads: compact symbol-encoded series for image chart
//! URLs, and typed tables for native timeline widgets.
//!
//! ## Architecture
//!
//! - **API**: response envelope and history layouts of the backend ([`api`])
//! - **Series**: extraction of one field, ordered by update time ([`series`])
//! - **Transforms**: counter deaccumulation and pairwise downsampling ([`transform`])
//! - **Encoding**: simple (1 symbol) and extended (2 symbols) encoders ([`encoding`])
//! - **Charts**: selector parsing, per-field pipeline and URL assembly ([`plot`], [`chart`])
//! - **Timeline**: typed tables for client-side timeline charts ([`timeline`])
//! - **Dispatch**: typed panel events drained from a channel ([`dispatch`])
//!
//! Every stage is a pure function of its input; nothing is cached
//! between requests.
//!
//! ## Example
//!
//! ```ignore
//! use vmchart_rs::{api, chart, ChartConfig, PlotSelection, RenderArea};
//!
//! let records = api::parse_history_response(&json)?;
//! let selection: PlotSelection = "Load|Transfer Bytes".parse()?;
//! let url = chart::build_chart_url(
//!     &records,
//!     &selection,
//!     Some("1234"),
//!     RenderArea::new(800, 400),
//!     &ChartConfig::default(),
//! )?;
//! println!("{}", url);
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod dispatch;
pub mod encoding;
pub mod error;
pub mod plot;
pub mod series;
pub mod timeline;
pub mod transform;
pub mod types;

// Re-export commonly used types
pub use api::{
    ApiResponse, HistoryPayload, HistorySource, HistoryTable, RunningSample, StatusCounters,
};
pub use chart::{build_chart_url, ChartRequest};
pub use config::{ChartConfig, ChartStyle, RenderArea};
pub use dispatch::{EventQueue, PlotController, PlotEvent, PlotOutcome};
pub use encoding::Encoding;
pub use error::{ChartError, Result};
pub use plot::{encode_field, EncodeOptions, EncodedSeries, FieldSelector, PlotSelection};
pub use series::{MissingFieldPolicy, Series};
pub use timeline::TimelineTable;
pub use types::{FieldValue, HistoryRecord};
