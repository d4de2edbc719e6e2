//! Error handling for vmchart-rs
//!
//! This module defines the error type shared by the history parsing,
//! encoding and chart assembly stages, and a Result alias for use
//! throughout the crate.

use thiserror::Error;

/// Main error type for chart encoding operations
#[derive(Error, Debug)]
pub enum ChartError {
    /// A history record has no value for the requested field
    #[error("Missing field '{field}' in history row {row}")]
    MissingField { field: String, row: usize },

    /// The `Update` column could not be interpreted as a timestamp
    #[error("Invalid timestamp in history row {row}: {value}")]
    InvalidTimestamp { row: usize, value: String },

    /// The history payload does not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The backend answered with `OK: false`
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A chart was requested without anything to draw
    #[error("Nothing to plot: {0}")]
    EmptyPlot(String),

    /// A plot selector such as `Load|Jobs` could not be parsed
    #[error("Invalid plot selector '{0}'")]
    InvalidSelector(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chart URL construction failed
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ChartError>,
    },
}

impl ChartError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ChartError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for ChartError {
    fn from(err: serde_json::Error) -> Self {
        ChartError::Serialization(err.to_string())
    }
}

/// Result type alias for chart encoding operations
pub type Result<T> = std::result::Result<T, ChartError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
