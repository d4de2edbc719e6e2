//! Image chart request assembly
//!
//! Turns encoded series into the query of a line-chart image request.
//! Series `i` is drawn against the axis pair `2i` (range) / `2i + 1`
//! (label); axis 4 is the time axis carrying the first and last update.
//!
//! ```text
//! cht=lc
//! chtt=Load vs Jobs for 1234
//! chxt=y,y,r,r,x
//! chxr=0,0,3|2,0,41
//! chxl=1:||Load||3:||Jobs||4:|2023-11-14 22:13:20|2023-11-15 06:00:00
//! chd=e:AAgA..,AfBk..
//! ```

use chrono::{DateTime, Utc};
use url::Url;

use crate::config::{ChartConfig, ChartStyle, RenderArea};
use crate::encoding::Encoding;
use crate::error::{ChartError, Result};
use crate::plot::{encode_selection, PlotSelection, PlotSeries, MAX_PLOT_SERIES};
use crate::series::time_bounds;
use crate::types::{format_update, HistoryRecord};

/// Axes of the chart: two left, two right, one bottom
pub const AXIS_TYPES: &str = "y,y,r,r,x";

/// Index of the time axis in [`AXIS_TYPES`]
pub const TIME_AXIS: usize = 4;

/// A chart request under construction
#[derive(Debug, Clone)]
pub struct ChartRequest {
    style: ChartStyle,
    encoding: Encoding,
    series: Vec<PlotSeries>,
    title: String,
    time_range: Option<(String, String)>,
    area: RenderArea,
}

impl ChartRequest {
    /// Empty request
    pub fn new(style: ChartStyle, encoding: Encoding) -> Self {
        Self {
            style,
            encoding,
            series: Vec::new(),
            title: String::new(),
            time_range: None,
            area: RenderArea::default(),
        }
    }

    /// Add a series (drawn on the next free axis pair).
    ///
    /// At most [`MAX_PLOT_SERIES`] series can be drawn; more are rejected
    /// when the request is built.
    pub fn series(mut self, series: PlotSeries) -> Self {
        self.series.push(series);
        self
    }

    /// Chart title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Labels of the first and last point of the time axis
    pub fn time_range(mut self, first: DateTime<Utc>, last: DateTime<Utc>) -> Self {
        self.time_range = Some((format_update(&first), format_update(&last)));
        self
    }

    /// Surface the chart is drawn into
    pub fn area(mut self, area: RenderArea) -> Self {
        self.area = area;
        self
    }

    /// Query parameters in request order
    pub fn params(&self) -> Result<Vec<(&'static str, String)>> {
        if self.series.is_empty() {
            return Err(ChartError::EmptyPlot("chart has no series".to_string()));
        }
        if self.series.len() > MAX_PLOT_SERIES {
            return Err(ChartError::InvalidSelector(format!(
                "chart has {} series, at most {} fit the axes",
                self.series.len(),
                MAX_PLOT_SERIES
            )));
        }

        let style = &self.style;
        let (width, height) = self.area.chart_size(style.padding);

        let mut axis_ranges = Vec::with_capacity(self.series.len());
        let mut axis_labels = String::new();
        let mut axis_styles = Vec::with_capacity(self.series.len());
        let mut scales = Vec::with_capacity(self.series.len());
        let mut line_styles = Vec::with_capacity(self.series.len());
        let mut colors = Vec::with_capacity(self.series.len());
        let mut data = Vec::with_capacity(self.series.len());

        for (i, plot) in self.series.iter().enumerate() {
            let range_axis = i * 2;
            let label_axis = range_axis + 1;
            let color = style.series_color(i);

            axis_ranges.push(format!("{},0,{}", range_axis, plot.series.max));
            axis_labels.push_str(&format!("{}:||{}||", label_axis, plot.label));
            axis_styles.push(format!(
                "{},{},{},0,t",
                label_axis, color, style.axis_font_size
            ));
            scales.push(format!("0,{}", plot.series.max));
            line_styles.push(style.line_width.to_string());
            colors.push(color.to_string());
            data.push(plot.series.data.as_str());
        }

        if let Some((first, last)) = &self.time_range {
            axis_labels.push_str(&format!("{}:|{}|{}", TIME_AXIS, first, last));
        }

        let mut params = vec![
            ("cht", style.chart_type.clone()),
            ("chtt", self.title.clone()),
            ("chxt", AXIS_TYPES.to_string()),
            ("chxr", axis_ranges.join("|")),
            ("chxl", axis_labels),
            ("chxs", axis_styles.join("|")),
            ("chls", line_styles.join("|")),
            ("chco", colors.join(",")),
        ];
        if let Some(marker) = &style.fill_marker {
            params.push(("chm", marker.clone()));
        }
        params.push(("chs", format!("{}x{}", width, height)));
        params.push(("chds", scales.join("|")));
        params.push((
            "chd",
            format!("{}:{}", self.encoding.data_prefix(), data.join(",")),
        ));
        Ok(params)
    }

    /// Full request URL
    pub fn to_url(&self) -> Result<Url> {
        let params = self.params()?;
        let url = Url::parse_with_params(&self.style.base_url, &params)?;
        tracing::debug!(
            "Built chart URL for '{}' ({} bytes)",
            self.title,
            url.as_str().len()
        );
        Ok(url)
    }
}

/// Encode `selection` from `records` and build the chart URL.
///
/// `instance` is appended to the title ("Load vs Jobs for 1234").
pub fn build_chart_url(
    records: &[HistoryRecord],
    selection: &PlotSelection,
    instance: Option<&str>,
    area: RenderArea,
    config: &ChartConfig,
) -> Result<Url> {
    let Some((first, last)) = time_bounds(records)? else {
        return Err(ChartError::EmptyPlot(format!(
            "no history to plot for {}",
            selection
        )));
    };

    let title = match instance {
        Some(id) => format!("{} for {}", selection.title(), id),
        None => selection.title(),
    };

    let series = encode_selection(records, selection, &config.encode_options())?;
    series
        .into_iter()
        .fold(
            ChartRequest::new(config.style.clone(), config.encoding),
            ChartRequest::series,
        )
        .title(title)
        .time_range(first, last)
        .area(area)
        .to_url()
}
