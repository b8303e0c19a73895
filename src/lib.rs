//! # Phrasebook - bilingual flashcard engine
//!
//! Stores Russian/English phrase pairs tagged by CEFR level and serves them
//! back one at a time, lowest level first.
//!
//! Phrasebook provides:
//! - SQLite-backed storage with a single-writer exclusive lock
//! - Idempotent JSON batch import with natural-key deduplication
//! - Level-then-recency selection of the next due phrase
//! - Per-level progress statistics

pub mod level;
pub mod phrase;
pub mod storage;
pub mod import;
pub mod query;
pub mod session;
pub mod seed;
pub mod config;
pub mod output;
pub mod ui;

use std::path::PathBuf;

// Re-exports for convenient access
pub use level::Level;
pub use phrase::{Phrase, PhraseKey, LevelStats};
pub use storage::PhraseStore;
pub use import::{ImportOutcome, ImportReport};
pub use query::StudyQueries;

/// Result type alias for Phrasebook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Phrasebook operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to initialize storage: {0}")]
    StorageInit(String),

    #[error("Storage at {} is locked by another running instance", .0.display())]
    Locked(PathBuf),

    #[error("Malformed import: {0}")]
    MalformedImport(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    #[error("Storage has been shut down")]
    Closed,
}

impl Error {
    /// True for failures that happen while bringing the store up
    pub fn is_storage_init(&self) -> bool {
        matches!(self, Error::StorageInit(_) | Error::Locked(_))
    }
}
