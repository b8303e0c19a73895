//! SQLite storage implementation

use std::path::{Path, PathBuf};
use std::time::Duration;
use rusqlite::{Connection, ErrorCode, params, OptionalExtension};
use crate::{Result, Error};
use crate::level::Level;
use crate::phrase::{LevelStats, Phrase, PhraseKey};
use super::schema;

const PHRASE_COLUMNS: &str =
    "id, source_text, target_text, level, completed, created_at, updated_at";

/// SQLite-backed phrase storage.
///
/// The store holds an exclusive lock on its database file for as long as it
/// is open, so only one process can use a given file at a time.
pub struct PhraseStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl PhraseStore {
    /// Open a database file (creates it and its parent directories if needed)
    ///
    /// Fails with [`Error::Locked`] if another instance already holds the file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::StorageInit(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }

        let conn = Connection::open(path).map_err(|e| init_error(path, e))?;
        Self::configure(&conn).map_err(|e| init_error(path, e))?;

        let store = Self { conn: Some(conn), path: Some(path.to_path_buf()) };
        store.initialize_schema().map_err(|e| match e {
            Error::Storage(inner) => init_error(path, inner),
            other => other,
        })?;

        tracing::info!("Opened phrase store at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::StorageInit(e.to_string()))?;
        let store = Self { conn: Some(conn), path: None };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Apply pragmas and take the exclusive file lock
    fn configure(conn: &Connection) -> rusqlite::Result<()> {
        // Contention must fail immediately rather than wait.
        conn.busy_timeout(Duration::ZERO)?;
        conn.pragma_update_and_check(None, "locking_mode", "EXCLUSIVE", |row| row.get::<_, String>(0))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        // In exclusive locking mode the lock is kept after COMMIT.
        conn.execute_batch("BEGIN EXCLUSIVE; COMMIT;")?;
        Ok(())
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    pub(crate) fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::Closed)
    }

    /// Database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether `shutdown` has been called
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Release the lock and close the connection. Calling it again is a no-op.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| Error::Storage(e))?;
            tracing::info!("Closed phrase store");
        }
        Ok(())
    }

    // ========== Phrase Operations ==========

    /// Insert a new, incomplete phrase and return its id.
    ///
    /// Inputs are assumed validated; no duplicate check happens here.
    pub fn insert_phrase(&self, source_text: &str, target_text: &str, level: Level) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO phrases (source_text, target_text, level) VALUES (?1, ?2, ?3)",
            params![source_text, target_text, level.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a phrase by id
    pub fn get_phrase(&self, id: i64) -> Result<Option<Phrase>> {
        let sql = format!("SELECT {PHRASE_COLUMNS} FROM phrases WHERE id = ?1");
        self.conn()?
            .query_row(&sql, [id], |row| self.row_to_phrase(row))
            .optional()
            .map_err(Into::into)
    }

    /// Natural keys of every stored phrase, in no particular order
    pub fn all_phrase_keys(&self) -> Result<Vec<PhraseKey>> {
        let mut stmt = self.conn()?.prepare(
            "SELECT source_text, target_text, level FROM phrases"
        )?;

        let keys = stmt
            .query_map([], |row| {
                let level_str: String = row.get(2)?;
                Ok(PhraseKey {
                    source_text: row.get(0)?,
                    target_text: row.get(1)?,
                    level: parse_level(2, &level_str)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(keys)
    }

    /// The highest-priority incomplete phrase.
    ///
    /// Lower levels first; within a level the least recently touched; ties
    /// broken by insertion order.
    pub fn next_due_phrase(&self) -> Result<Option<Phrase>> {
        let sql = format!(
            "SELECT {PHRASE_COLUMNS} FROM phrases
             WHERE completed = 0
             ORDER BY level ASC, updated_at ASC, id ASC
             LIMIT 1"
        );
        self.conn()?
            .query_row(&sql, [], |row| self.row_to_phrase(row))
            .optional()
            .map_err(Into::into)
    }

    /// Same ordering as [`Self::next_due_phrase`], restricted to one level
    pub fn next_due_in_level(&self, level: Level) -> Result<Option<Phrase>> {
        let sql = format!(
            "SELECT {PHRASE_COLUMNS} FROM phrases
             WHERE completed = 0 AND level = ?1
             ORDER BY updated_at ASC, id ASC
             LIMIT 1"
        );
        self.conn()?
            .query_row(&sql, [level.as_str()], |row| self.row_to_phrase(row))
            .optional()
            .map_err(Into::into)
    }

    /// Set the completion flag. Returns the number of rows changed, 0 if the
    /// id does not exist.
    pub fn set_completed(&self, id: i64, completed: bool) -> Result<usize> {
        let changed = self.conn()?.execute(
            "UPDATE phrases SET completed = ?1 WHERE id = ?2",
            params![completed, id],
        )?;
        tracing::debug!(id, completed, changed, "set_completed");
        Ok(changed)
    }

    /// Count all phrases
    pub fn count_phrases(&self) -> Result<usize> {
        let count: i64 = self.conn()?.query_row("SELECT COUNT(*) FROM phrases", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Per-level progress, ordered by level; empty levels are omitted
    pub fn stats_by_level(&self) -> Result<Vec<LevelStats>> {
        let mut stmt = self.conn()?.prepare(
            r#"
            SELECT level, COUNT(*), COALESCE(SUM(completed), 0)
            FROM phrases
            GROUP BY level
            ORDER BY level ASC
            "#,
        )?;

        let stats = stmt
            .query_map([], |row| {
                let level_str: String = row.get(0)?;
                let total: i64 = row.get(1)?;
                let completed: i64 = row.get(2)?;
                Ok(LevelStats {
                    level: parse_level(0, &level_str)?,
                    total: total as usize,
                    completed: completed as usize,
                    remaining: (total - completed) as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(stats)
    }

    /// Helper to convert a row to a Phrase
    fn row_to_phrase(&self, row: &rusqlite::Row) -> rusqlite::Result<Phrase> {
        let level_str: String = row.get(3)?;

        Ok(Phrase {
            id: row.get(0)?,
            source_text: row.get(1)?,
            target_text: row.get(2)?,
            level: parse_level(3, &level_str)?,
            completed: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    // ========== Bulk Operations ==========

    /// Begin a transaction for bulk operations
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.conn()?.execute_batch("BEGIN IMMEDIATE TRANSACTION")?;
        Ok(())
    }

    /// Commit a transaction
    pub fn commit(&mut self) -> Result<()> {
        self.conn()?.execute_batch("COMMIT")?;
        Ok(())
    }

    /// Rollback a transaction
    pub fn rollback(&mut self) -> Result<()> {
        self.conn()?.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

fn parse_level(idx: usize, s: &str) -> rusqlite::Result<Level> {
    s.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn init_error(path: &Path, e: rusqlite::Error) -> Error {
    match e.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            Error::Locked(path.to_path_buf())
        }
        _ => Error::StorageInit(format!("{}: {}", path.display(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn store_with(rows: &[(&str, &str, Level)]) -> (PhraseStore, Vec<i64>) {
        let store = PhraseStore::open_in_memory().unwrap();
        let ids = rows
            .iter()
            .map(|(s, t, l)| store.insert_phrase(s, t, *l).unwrap())
            .collect();
        (store, ids)
    }

    #[test]
    fn test_insert_and_get() {
        let (store, ids) = store_with(&[("Привет", "Hello", Level::A1)]);

        let phrase = store.get_phrase(ids[0]).unwrap().unwrap();
        assert_eq!(phrase.source_text, "Привет");
        assert_eq!(phrase.target_text, "Hello");
        assert_eq!(phrase.level, Level::A1);
        assert!(!phrase.completed);
        assert_eq!(phrase.created_at, phrase.updated_at);
        assert!(store.get_phrase(ids[0] + 100).unwrap().is_none());
    }

    #[test]
    fn test_ids_are_monotonic() {
        let (_store, ids) = store_with(&[
            ("a", "a", Level::A1),
            ("b", "b", Level::A1),
            ("c", "c", Level::A1),
        ]);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_insert_does_not_dedup() {
        let (store, _) = store_with(&[("a", "b", Level::A1), ("a", "b", Level::A1)]);
        assert_eq!(store.count_phrases().unwrap(), 2);
        assert_eq!(store.all_phrase_keys().unwrap().len(), 2);
    }

    #[test]
    fn test_schema_rejects_bad_rows() {
        let store = PhraseStore::open_in_memory().unwrap();
        assert!(store.insert_phrase("", "x", Level::A1).is_err());
        let bad_level = store.conn().unwrap().execute(
            "INSERT INTO phrases (source_text, target_text, level) VALUES ('a', 'b', 'Z9')",
            [],
        );
        assert!(bad_level.is_err());
    }

    #[test]
    fn test_next_due_orders_by_level_first() {
        let (store, ids) = store_with(&[
            ("c1", "c1", Level::C1),
            ("b2", "b2", Level::B2),
            ("a2", "a2", Level::A2),
        ]);

        assert_eq!(store.next_due_phrase().unwrap().unwrap().id, ids[2]);
        store.set_completed(ids[2], true).unwrap();
        assert_eq!(store.next_due_phrase().unwrap().unwrap().id, ids[1]);
        store.set_completed(ids[1], true).unwrap();
        assert_eq!(store.next_due_phrase().unwrap().unwrap().id, ids[0]);
    }

    #[test]
    fn test_next_due_ties_break_by_id() {
        let (store, ids) = store_with(&[("x", "x", Level::B1), ("y", "y", Level::B1)]);
        // Force identical timestamps.
        store
            .conn()
            .unwrap()
            .execute("UPDATE phrases SET updated_at = '2024-01-01 00:00:00.000'", [])
            .unwrap();
        assert_eq!(store.next_due_phrase().unwrap().unwrap().id, ids[0]);
    }

    #[test]
    fn test_touch_moves_phrase_behind_peers() {
        let (store, ids) = store_with(&[("x", "x", Level::A1), ("y", "y", Level::A1)]);
        sleep(Duration::from_millis(5));

        // Re-marking as incomplete still refreshes updated_at.
        assert_eq!(store.set_completed(ids[0], false).unwrap(), 1);
        assert_eq!(store.next_due_phrase().unwrap().unwrap().id, ids[1]);

        let touched = store.get_phrase(ids[0]).unwrap().unwrap();
        assert!(touched.updated_at > touched.created_at);
    }

    #[test]
    fn test_next_due_in_level() {
        let (store, ids) = store_with(&[("a", "a", Level::A1), ("b", "b", Level::B1)]);
        assert_eq!(store.next_due_in_level(Level::B1).unwrap().unwrap().id, ids[1]);
        assert!(store.next_due_in_level(Level::C2).unwrap().is_none());
    }

    #[test]
    fn test_set_completed_unknown_id() {
        let store = PhraseStore::open_in_memory().unwrap();
        assert_eq!(store.set_completed(42, true).unwrap(), 0);
    }

    #[test]
    fn test_stats_by_level() {
        let (store, ids) = store_with(&[
            ("b", "b", Level::B2),
            ("a", "a", Level::A1),
            ("a2", "a2", Level::A1),
        ]);
        store.set_completed(ids[1], true).unwrap();

        let stats = store.stats_by_level().unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0], LevelStats { level: Level::A1, total: 2, completed: 1, remaining: 1 });
        assert_eq!(stats[1], LevelStats { level: Level::B2, total: 1, completed: 0, remaining: 1 });
    }

    #[test]
    fn test_stats_empty_store() {
        let store = PhraseStore::open_in_memory().unwrap();
        assert!(store.stats_by_level().unwrap().is_empty());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut store = PhraseStore::open_in_memory().unwrap();
        store.shutdown().unwrap();
        store.shutdown().unwrap();
        assert!(store.is_closed());
        assert!(matches!(store.next_due_phrase(), Err(Error::Closed)));
    }

    #[test]
    fn test_rollback_discards_inserts() {
        let mut store = PhraseStore::open_in_memory().unwrap();
        store.begin_transaction().unwrap();
        store.insert_phrase("a", "b", Level::A1).unwrap();
        store.rollback().unwrap();
        assert_eq!(store.count_phrases().unwrap(), 0);
    }
}
