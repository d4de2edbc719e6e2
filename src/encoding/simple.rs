//! Simple encoding: one symbol per sample
//!
//! Values are scaled so that `max` lands on the last symbol of
//! [`SIMPLE_ALPHABET`]. Negative and non-finite values become
//! [`SIMPLE_MISSING`].

use crate::error::{ChartError, Result};

/// Symbols in ascending order of value.
///
/// 26 + 26 + 10 = 62 symbols, so the top of the scale is index 61 and a
/// value equal to `max` encodes as `9`.
pub const SIMPLE_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Marker for a sample that cannot be plotted
pub const SIMPLE_MISSING: char = '_';

const TOP: usize = SIMPLE_ALPHABET.len() - 1;

/// Encode `values` against `max`
pub fn encode(values: &[f64], max: f64) -> String {
    values.iter().map(|&v| symbol(v, max)).collect()
}

fn symbol(value: f64, max: f64) -> char {
    if !value.is_finite() || value < 0.0 {
        return SIMPLE_MISSING;
    }
    let index = if max.is_finite() && max > 0.0 {
        (TOP as f64 * value / max).round()
    } else if value == 0.0 {
        0.0
    } else {
        TOP as f64
    };
    // Values above `max` saturate on the top symbol
    SIMPLE_ALPHABET[(index as usize).min(TOP)] as char
}

/// Map symbols back to the values they stand for.
///
/// `None` marks a missing sample.
pub fn decode(data: &str, max: f64) -> Result<Vec<Option<f64>>> {
    data.chars()
        .map(|c| {
            if c == SIMPLE_MISSING {
                return Ok(None);
            }
            index_of(c)
                .map(|i| Some(i as f64 * max / TOP as f64))
                .ok_or_else(|| {
                    ChartError::Serialization(format!("'{}' is not a simple-encoding symbol", c))
                })
        })
        .collect()
}

fn index_of(c: char) -> Option<usize> {
    SIMPLE_ALPHABET.iter().position(|&b| b as char == c)
}
