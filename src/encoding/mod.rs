//! Symbol encodings for image chart data
//!
//! Both encodings quantize each sample against a caller-supplied maximum
//! and emit printable symbols that can go into a URL unescaped:
//!
//! | Encoding | Symbols/sample | Levels | Missing | Overflow |
//! |---|---|---|---|---|
//! | [`Encoding::Simple`] | 1 | 62 | `_` | saturates |
//! | [`Encoding::Extended`] | 2 | 4096 | `__` | `..` |

pub mod extended;
pub mod simple;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Result;

/// Which symbol encoding to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// One symbol per sample
    Simple,
    /// Two symbols per sample
    #[default]
    Extended,
}

impl Encoding {
    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Encoding::Simple => "Simple",
            Encoding::Extended => "Extended",
        }
    }

    /// Get all encodings
    pub fn all() -> &'static [Encoding] {
        &[Encoding::Simple, Encoding::Extended]
    }

    /// Prefix of the `chd` parameter (`s:` / `e:`)
    pub fn data_prefix(&self) -> &'static str {
        match self {
            Encoding::Simple => "s",
            Encoding::Extended => "e",
        }
    }

    /// Symbols used per sample
    pub fn symbols_per_sample(&self) -> usize {
        match self {
            Encoding::Simple => 1,
            Encoding::Extended => 2,
        }
    }

    /// Encode samples against `max`
    pub fn encode(&self, values: &[f64], max: f64) -> String {
        match self {
            Encoding::Simple => simple::encode(values, max),
            Encoding::Extended => extended::encode(values, max),
        }
    }

    /// Decode a payload produced by [`Encoding::encode`]
    pub fn decode(&self, data: &str, max: f64) -> Result<Vec<Option<f64>>> {
        match self {
            Encoding::Simple => simple::decode(data, max),
            Encoding::Extended => extended::decode(data, max),
        }
    }

    /// Width of one quantization level for a given `max`
    pub fn step(&self, max: f64) -> f64 {
        match self {
            Encoding::Simple => max / (simple::SIMPLE_ALPHABET.len() - 1) as f64,
            Encoding::Extended => max / extended::EXTENDED_LEVELS as f64,
        }
    }

    /// Whether `c` can appear in this encoding's output
    pub fn is_output_symbol(&self, c: char) -> bool {
        match self {
            Encoding::Simple => {
                c == simple::SIMPLE_MISSING
                    || (c.is_ascii() && simple::SIMPLE_ALPHABET.contains(&(c as u8)))
            }
            Encoding::Extended => {
                c == '_' || (c.is_ascii() && extended::EXTENDED_ALPHABET.contains(&(c as u8)))
            }
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" | "s" => Ok(Encoding::Simple),
            "extended" | "e" => Ok(Encoding::Extended),
            other => Err(format!(
                "unknown encoding '{}', expected 'simple' or 'extended'",
                other
            )),
        }
    }
}
