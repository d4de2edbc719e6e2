//! Extended encoding: two symbols per sample, 4096 levels
//!
//! `floor(4096 * value / max)` is written in base 64 over
//! [`EXTENDED_ALPHABET`]. Values at or above `max` become
//! [`EXTENDED_OVERFLOW`]; negative and `NaN` values become
//! [`EXTENDED_MISSING`].

use crate::error::{ChartError, Result};

/// Digits of the base-64 code, lowest first
pub const EXTENDED_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-.";

/// Number of distinct levels
pub const EXTENDED_LEVELS: usize = EXTENDED_ALPHABET.len() * EXTENDED_ALPHABET.len();

/// Code for a value at or above the scale maximum
pub const EXTENDED_OVERFLOW: &str = "..";

/// Code for a sample that cannot be plotted
pub const EXTENDED_MISSING: &str = "__";

const BASE: usize = EXTENDED_ALPHABET.len();

/// Encode `values` against `max`
pub fn encode(values: &[f64], max: f64) -> String {
    let mut out = String::with_capacity(values.len() * 2);
    for &value in values {
        push_code(&mut out, value, max);
    }
    out
}

fn push_code(out: &mut String, value: f64, max: f64) {
    if value.is_nan() || value < 0.0 {
        out.push_str(EXTENDED_MISSING);
        return;
    }
    let scaled = if max.is_finite() && max > 0.0 {
        (EXTENDED_LEVELS as f64 * value / max).floor()
    } else if value == 0.0 {
        0.0
    } else {
        f64::INFINITY
    };
    if scaled >= EXTENDED_LEVELS as f64 {
        out.push_str(EXTENDED_OVERFLOW);
        return;
    }
    let level = scaled as usize;
    out.push(EXTENDED_ALPHABET[level / BASE] as char);
    out.push(EXTENDED_ALPHABET[level % BASE] as char);
}

/// Map codes back to the lower edge of the level they stand for.
///
/// `None` marks a missing sample; the overflow code decodes to `max`.
pub fn decode(data: &str, max: f64) -> Result<Vec<Option<f64>>> {
    let bytes = data.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(ChartError::Serialization(format!(
            "extended data has odd length {}",
            bytes.len()
        )));
    }
    bytes
        .chunks_exact(2)
        .map(|code| match code {
            b"__" => Ok(None),
            b".." => Ok(Some(max)),
            [hi, lo] => {
                let hi = digit(*hi)?;
                let lo = digit(*lo)?;
                let level = hi * BASE + lo;
                Ok(Some(level as f64 * max / EXTENDED_LEVELS as f64))
            }
            _ => unreachable!("chunks_exact(2) yields pairs"),
        })
        .collect()
}

fn digit(b: u8) -> Result<usize> {
    EXTENDED_ALPHABET
        .iter()
        .position(|&d| d == b)
        .ok_or_else(|| {
            ChartError::Serialization(format!(
                "'{}' is not an extended-encoding symbol",
                b as char
            ))
        })
}
