//! Import Pipeline - idempotent batch ingestion
//!
//! Reads a JSON array of `{ "ru": .., "en": .., "level": .. }` objects,
//! drops invalid candidates, skips anything whose natural key is already
//! stored (or appeared earlier in the same batch) and inserts the rest in a
//! single transaction. Re-running the same file is a no-op.

use std::collections::HashSet;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::{Error, Result};
use crate::level::Level;
use crate::phrase::PhraseKey;
use crate::storage::PhraseStore;

/// One element of an import file, as written by hand or by the seeder.
///
/// Every field is optional so that a missing field makes the candidate
/// invalid instead of failing the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ru: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl ImportRecord {
    pub fn new(ru: &str, en: &str, level: Level) -> Self {
        Self {
            ru: Some(ru.to_string()),
            en: Some(en.to_string()),
            level: Some(level.as_str().to_string()),
        }
    }

    /// The natural key if this record is a valid candidate
    fn validate(&self) -> Option<PhraseKey> {
        let ru = self.ru.as_deref().filter(|s| !s.is_empty())?;
        let en = self.en.as_deref().filter(|s| !s.is_empty())?;
        let level: Level = self.level.as_deref()?.parse().ok()?;
        Some(PhraseKey::new(ru, en, level))
    }
}

/// Counts from a completed import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// New records written
    pub inserted: usize,
    /// Valid candidates whose key already existed or repeated in the batch
    pub skipped: usize,
    /// Invalid candidates, not part of `inserted` or `skipped`
    pub dropped: usize,
}

/// Result of one batch import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    Imported(ImportReport),
    /// Nothing valid in the source; storage was not touched
    NoValidCandidates { dropped: usize },
}

impl ImportOutcome {
    pub fn inserted(&self) -> usize {
        match self {
            ImportOutcome::Imported(report) => report.inserted,
            ImportOutcome::NoValidCandidates { .. } => 0,
        }
    }

    pub fn skipped(&self) -> usize {
        match self {
            ImportOutcome::Imported(report) => report.skipped,
            ImportOutcome::NoValidCandidates { .. } => 0,
        }
    }
}

impl std::fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportOutcome::Imported(r) => write!(
                f,
                "Inserted {}, skipped {} duplicates, dropped {} invalid",
                r.inserted, r.skipped, r.dropped
            ),
            ImportOutcome::NoValidCandidates { dropped } => {
                write!(f, "No valid phrases to import ({} invalid dropped)", dropped)
            }
        }
    }
}

/// Import phrases from a JSON file
pub fn import_phrases(store: &mut PhraseStore, path: &Path) -> Result<ImportOutcome> {
    tracing::info!("Importing phrases from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    import_from_str(store, &contents)
}

/// Import phrases from JSON text
pub fn import_from_str(store: &mut PhraseStore, json: &str) -> Result<ImportOutcome> {
    let candidates = parse_candidates(json)?;
    let total = candidates.len();

    let valid: Vec<PhraseKey> = candidates.iter().filter_map(ImportRecord::validate).collect();
    let dropped = total - valid.len();
    if dropped > 0 {
        tracing::debug!(dropped, "Dropped invalid import candidates");
    }

    if valid.is_empty() {
        tracing::warn!("Import source has no valid phrases ({} candidates)", total);
        return Ok(ImportOutcome::NoValidCandidates { dropped });
    }

    let mut seen: HashSet<PhraseKey> = store.all_phrase_keys()?.into_iter().collect();

    store.begin_transaction()?;
    let (inserted, skipped) = match insert_new(store, valid, &mut seen) {
        Ok(counts) => match store.commit() {
            Ok(()) => counts,
            Err(e) => return Err(abort_batch(store, e)),
        },
        Err(e) => return Err(abort_batch(store, e)),
    };

    let report = ImportReport { inserted, skipped, dropped };
    tracing::info!(inserted, skipped, dropped, "Import complete");
    Ok(ImportOutcome::Imported(report))
}

/// Roll back the open batch transaction and hand back the original error
fn abort_batch(store: &mut PhraseStore, e: Error) -> Error {
    if let Err(rb) = store.rollback() {
        tracing::error!("Rollback after failed import also failed: {}", rb);
    }
    e
}

/// Split the source into candidate records.
///
/// Only a non-array top level is an error; array elements that are not
/// well-formed objects become empty (invalid) candidates.
fn parse_candidates(json: &str) -> Result<Vec<ImportRecord>> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| Error::MalformedImport(format!("invalid JSON: {}", e)))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(Error::MalformedImport(format!(
                "expected a list of phrases, found {}",
                json_type_name(&other)
            )));
        }
    };

    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

fn insert_new(
    store: &PhraseStore,
    candidates: Vec<PhraseKey>,
    seen: &mut HashSet<PhraseKey>,
) -> Result<(usize, usize)> {
    let mut inserted = 0;
    let mut skipped = 0;

    for key in candidates {
        if seen.contains(&key) {
            skipped += 1;
            continue;
        }
        store.insert_phrase(&key.source_text, &key.target_text, key.level)?;
        seen.insert(key);
        inserted += 1;
    }

    Ok((inserted, skipped))
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_duplicates_and_invalid() {
        let mut store = PhraseStore::open_in_memory().unwrap();
        let json = r#"[
            {"ru": "Привет", "en": "Hello", "level": "A1"},
            {"ru": "Привет", "en": "Hello", "level": "A1"},
            {"ru": "X", "en": "Y", "level": "Z9"}
        ]"#;

        let outcome = import_from_str(&mut store, json).unwrap();
        assert_eq!(
            outcome,
            ImportOutcome::Imported(ImportReport { inserted: 1, skipped: 1, dropped: 1 })
        );

        let stats = store.stats_by_level().unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].level, Level::A1);
        assert_eq!((stats[0].total, stats[0].completed, stats[0].remaining), (1, 0, 1));
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let mut store = PhraseStore::open_in_memory().unwrap();
        let json = r#"[
            {"ru": "Да", "en": "Yes", "level": "A1"},
            {"ru": "Нет", "en": "No", "level": "A1"},
            {"ru": "Однако", "en": "However", "level": "B2"}
        ]"#;

        let first = import_from_str(&mut store, json).unwrap();
        assert_eq!((first.inserted(), first.skipped()), (3, 0));

        let second = import_from_str(&mut store, json).unwrap();
        assert_eq!((second.inserted(), second.skipped()), (0, 3));
        assert_eq!(store.count_phrases().unwrap(), 3);
    }

    #[test]
    fn test_invalid_candidates_do_not_affect_counts() {
        let mut store = PhraseStore::open_in_memory().unwrap();
        let json = r#"[
            {"en": "no source", "level": "A1"},
            {"ru": "нет перевода", "level": "A1"},
            {"ru": "плохо", "en": "bad", "level": "X9"},
            {"ru": "", "en": "empty", "level": "A1"},
            {"ru": 5, "en": "number", "level": "A1"},
            "not an object",
            {"ru": "Спасибо", "en": "Thank you", "level": "A1", "note": "extra fields are fine"}
        ]"#;

        let outcome = import_from_str(&mut store, json).unwrap();
        assert_eq!(
            outcome,
            ImportOutcome::Imported(ImportReport { inserted: 1, skipped: 0, dropped: 6 })
        );
        let keys = store.all_phrase_keys().unwrap();
        assert_eq!(keys, vec![PhraseKey::new("Спасибо", "Thank you", Level::A1)]);
    }

    #[test]
    fn test_whitespace_text_is_valid() {
        let mut store = PhraseStore::open_in_memory().unwrap();
        let outcome = import_from_str(&mut store, r#"[{"ru": " ", "en": "Space", "level": "A1"}]"#).unwrap();
        assert_eq!(
            outcome,
            ImportOutcome::Imported(ImportReport { inserted: 1, skipped: 0, dropped: 0 })
        );
        assert_eq!(store.all_phrase_keys().unwrap(), vec![PhraseKey::new(" ", "Space", Level::A1)]);
    }

    #[test]
    fn test_storage_failure_rolls_back_whole_batch() {
        let mut store = PhraseStore::open_in_memory().unwrap();
        import_from_str(&mut store, r#"[{"ru": "Да", "en": "Yes", "level": "A1"}]"#).unwrap();
        store
            .conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER fail_on_boom BEFORE INSERT ON phrases
                 WHEN NEW.source_text = 'boom'
                 BEGIN SELECT RAISE(ABORT, 'boom'); END;",
            )
            .unwrap();

        let json = r#"[
            {"ru": "Нет", "en": "No", "level": "A1"},
            {"ru": "boom", "en": "Bang", "level": "A1"},
            {"ru": "Может", "en": "Maybe", "level": "A2"}
        ]"#;
        let err = import_from_str(&mut store, json).unwrap_err();
        assert!(matches!(err, Error::Storage(_)), "{err}");
        assert_eq!(store.count_phrases().unwrap(), 1);

        // The connection is usable for the next batch.
        let outcome = import_from_str(&mut store, r#"[{"ru": "Нет", "en": "No", "level": "A1"}]"#).unwrap();
        assert_eq!((outcome.inserted(), outcome.skipped()), (1, 0));
        assert_eq!(store.count_phrases().unwrap(), 2);
    }

    #[test]
    fn test_failed_commit_rolls_back() {
        let mut store = PhraseStore::open_in_memory().unwrap();
        // A deferred foreign key violation only surfaces at COMMIT.
        store
            .conn()
            .unwrap()
            .execute_batch(
                "PRAGMA foreign_keys = ON;
                 CREATE TABLE owners (id INTEGER PRIMARY KEY);
                 CREATE TABLE owned (
                     owner_id INTEGER REFERENCES owners(id) DEFERRABLE INITIALLY DEFERRED
                 );
                 CREATE TRIGGER orphan_on_insert AFTER INSERT ON phrases
                 WHEN NEW.source_text = 'orphan'
                 BEGIN INSERT INTO owned (owner_id) VALUES (999); END;",
            )
            .unwrap();

        let json = r#"[
            {"ru": "Кот", "en": "Cat", "level": "A1"},
            {"ru": "orphan", "en": "Orphan", "level": "A1"}
        ]"#;
        let err = import_from_str(&mut store, json).unwrap_err();
        assert!(matches!(err, Error::Storage(_)), "{err}");
        assert_eq!(store.count_phrases().unwrap(), 0);

        let outcome = import_from_str(&mut store, r#"[{"ru": "Кот", "en": "Cat", "level": "A1"}]"#).unwrap();
        assert_eq!(outcome.inserted(), 1);
    }

    #[test]
    fn test_no_valid_candidates_is_a_warning() {
        let mut store = PhraseStore::open_in_memory().unwrap();
        let outcome = import_from_str(&mut store, r#"[{"ru": "X", "en": "Y", "level": "Z9"}]"#).unwrap();
        assert_eq!(outcome, ImportOutcome::NoValidCandidates { dropped: 1 });

        let outcome = import_from_str(&mut store, "[]").unwrap();
        assert_eq!(outcome, ImportOutcome::NoValidCandidates { dropped: 0 });
        assert_eq!(store.count_phrases().unwrap(), 0);
    }

    #[test]
    fn test_non_array_is_malformed() {
        let mut store = PhraseStore::open_in_memory().unwrap();
        for json in [r#"{"ru": "a", "en": "b", "level": "A1"}"#, "42", "not json"] {
            let err = import_from_str(&mut store, json).unwrap_err();
            assert!(matches!(err, Error::MalformedImport(_)), "{json}: {err}");
        }
        assert_eq!(store.count_phrases().unwrap(), 0);
    }

    #[test]
    fn test_same_text_different_level_is_not_duplicate() {
        let mut store = PhraseStore::open_in_memory().unwrap();
        let json = r#"[
            {"ru": "Дом", "en": "House", "level": "A1"},
            {"ru": "Дом", "en": "House", "level": "A2"}
        ]"#;
        let outcome = import_from_str(&mut store, json).unwrap();
        assert_eq!((outcome.inserted(), outcome.skipped()), (2, 0));
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut store = PhraseStore::open_in_memory().unwrap();
        store.begin_transaction().unwrap();
        store.insert_phrase("before", "before", Level::A1).unwrap();
        store.commit().unwrap();

        let mut seen = HashSet::new();
        store.begin_transaction().unwrap();
        let result = insert_new(
            &store,
            vec![
                PhraseKey::new("ok", "ok", Level::A1),
                // Violates the non-empty CHECK constraint.
                PhraseKey::new("", "empty", Level::A1),
            ],
            &mut seen,
        );
        assert!(result.is_err());
        store.rollback().unwrap();

        assert_eq!(store.count_phrases().unwrap(), 1);
    }
}
