//! Chart rendering settings
//!
//! Presentation parameters of the image chart request. These do not
//! influence the encoded data, only how the chart service draws it.
//!
//! # Main Types
//!
//! - [`ChartStyle`] - Service URL, series colours, line width, fill marker
//! - [`RenderArea`] - Pixel size of the surface the chart is drawn into

use serde::{Deserialize, Serialize};

/// Default image chart endpoint
pub const DEFAULT_CHART_BASE_URL: &str = "https://chart.apis.google.com/chart";

/// Pixels subtracted from each side of the render area
pub const DEFAULT_PADDING_PX: u32 = 10;

/// Style parameters of the chart request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    /// Chart service endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Chart type (`lc` = line chart)
    #[serde(default = "default_chart_type")]
    pub chart_type: String,

    /// Series colours as hex RGB without `#`, cycled per series
    #[serde(default = "default_series_colors")]
    pub series_colors: Vec<String>,

    /// Line thickness in pixels
    #[serde(default = "default_line_width")]
    pub line_width: u32,

    /// Axis label font size
    #[serde(default = "default_axis_font_size")]
    pub axis_font_size: u32,

    /// Range marker filling the area under the first series
    #[serde(default = "default_fill_marker")]
    pub fill_marker: Option<String>,

    /// Pixels trimmed from width and height of the render area
    #[serde(default = "default_padding")]
    pub padding: u32,
}

fn default_base_url() -> String {
    DEFAULT_CHART_BASE_URL.to_string()
}

fn default_chart_type() -> String {
    "lc".to_string()
}

fn default_series_colors() -> Vec<String> {
    vec!["224499".to_string(), "fc9906".to_string()]
}

fn default_line_width() -> u32 {
    3
}

fn default_axis_font_size() -> u32 {
    13
}

fn default_fill_marker() -> Option<String> {
    Some("B,76A4FB,0,0,0".to_string())
}

fn default_padding() -> u32 {
    DEFAULT_PADDING_PX
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chart_type: default_chart_type(),
            series_colors: default_series_colors(),
            line_width: default_line_width(),
            axis_font_size: default_axis_font_size(),
            fill_marker: default_fill_marker(),
            padding: default_padding(),
        }
    }
}

impl ChartStyle {
    /// Colour of the `index`-th series
    pub fn series_color(&self, index: usize) -> &str {
        if self.series_colors.is_empty() {
            return "000000";
        }
        &self.series_colors[index % self.series_colors.len()]
    }
}

/// Pixel size of the surface a chart is drawn into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderArea {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderArea {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
        }
    }
}

impl RenderArea {
    /// Create a render area
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Chart size after trimming `padding` pixels, never below 1x1
    pub fn chart_size(&self, padding: u32) -> (u32, u32) {
        (
            self.width.saturating_sub(padding).max(1),
            self.height.saturating_sub(padding).max(1),
        )
    }

    /// Same area with the height raised to at least `min_height`
    pub fn with_min_height(self, min_height: u32) -> Self {
        Self {
            height: self.height.max(min_height),
            ..self
        }
    }
}
