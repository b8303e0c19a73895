//! Phrase records
//!
//! A phrase is a Russian source text paired with its English translation
//! and tagged with a proficiency level. Records are created by import and
//! only ever mutated through their completion flag.

use crate::level::Level;
use serde::{Deserialize, Serialize};

/// A stored phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    /// Storage-assigned identity, monotonically increasing
    pub id: i64,
    /// Native-language text (`ru` in import files)
    pub source_text: String,
    /// Translation (`en` in import files)
    pub target_text: String,
    pub level: Level,
    pub completed: bool,
    /// UTC, `YYYY-MM-DD HH:MM:SS.SSS`
    pub created_at: String,
    /// UTC, refreshed on every mutation
    pub updated_at: String,
}

/// Natural duplicate key: `(source_text, target_text, level)`.
///
/// Compared structurally, so text containing any separator character can
/// never collide with a different triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhraseKey {
    pub source_text: String,
    pub target_text: String,
    pub level: Level,
}

impl PhraseKey {
    pub fn new(source_text: impl Into<String>, target_text: impl Into<String>, level: Level) -> Self {
        Self {
            source_text: source_text.into(),
            target_text: target_text.into(),
            level,
        }
    }
}

/// Progress counters for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    pub level: Level,
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
}

impl std::fmt::Display for LevelStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}/{} done, {} remaining",
            self.level, self.completed, self.total, self.remaining
        )
    }
}
