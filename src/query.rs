//! Query Surface
//!
//! The read/update operations a study session needs, borrowed from a
//! [`PhraseStore`]. Holds no state of its own.

use crate::Result;
use crate::level::Level;
use crate::phrase::{LevelStats, Phrase};
use crate::storage::PhraseStore;

/// Study-session view over a phrase store
pub struct StudyQueries<'a> {
    store: &'a PhraseStore,
}

impl<'a> StudyQueries<'a> {
    /// Create a new query view
    pub fn new(store: &'a PhraseStore) -> Self {
        Self { store }
    }

    /// Next phrase to show, optionally restricted to one level
    pub fn next_due(&self, level: Option<Level>) -> Result<Option<Phrase>> {
        match level {
            Some(level) => self.store.next_due_in_level(level),
            None => self.store.next_due_phrase(),
        }
    }

    pub fn next_due_phrase(&self) -> Result<Option<Phrase>> {
        self.store.next_due_phrase()
    }

    /// Returns rows affected; 0 means the id is unknown
    pub fn set_completed(&self, id: i64, completed: bool) -> Result<usize> {
        self.store.set_completed(id, completed)
    }

    pub fn stats_by_level(&self) -> Result<Vec<LevelStats>> {
        self.store.stats_by_level()
    }
}
