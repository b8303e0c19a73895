//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite file with:
//! - phrases(id, source_text, target_text, level, completed, created_at, updated_at)
//! - idx_phrases_due(completed, level, updated_at)
//! - a trigger that refreshes updated_at on every update

pub mod schema;
pub mod sqlite;

pub use sqlite::PhraseStore;
