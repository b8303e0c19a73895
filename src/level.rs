//! Proficiency levels
//!
//! Six fixed CEFR tiers ordered from beginner to advanced:
//! `A1 < A2 < B1 < B2 < C1 < C2`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A CEFR proficiency level.
///
/// Variant order is rank order, so the derived `Ord` sorts beginners first.
/// The textual codes sort the same way, which the storage layer relies on
/// when it orders by the `level` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Level {
    /// Get the string representation of the level
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
            Level::C2 => "C2",
        }
    }

    /// Zero-based rank, A1 = 0
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Get all levels in rank order
    pub fn all() -> &'static [Level] {
        &[Level::A1, Level::A2, Level::B1, Level::B2, Level::C1, Level::C2]
    }
}

impl FromStr for Level {
    type Err = Error;

    /// Exact, case-sensitive match against the six codes.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "A1" => Ok(Level::A1),
            "A2" => Ok(Level::A2),
            "B1" => Ok(Level::B1),
            "B2" => Ok(Level::B2),
            "C1" => Ok(Level::C1),
            "C2" => Ok(Level::C2),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
