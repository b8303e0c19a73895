//! Database schema definitions

/// SQL to create the phrases table
///
/// Timestamps are UTC text with millisecond precision, so they sort
/// chronologically as plain strings.
pub const CREATE_PHRASES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS phrases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_text TEXT NOT NULL CHECK (length(source_text) > 0),
    target_text TEXT NOT NULL CHECK (length(target_text) > 0),
    level TEXT NOT NULL CHECK (level IN ('A1', 'A2', 'B1', 'B2', 'C1', 'C2')),
    completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
)
"#;

/// Index backing the next-due ordering
pub const CREATE_DUE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_phrases_due ON phrases(completed, level, updated_at)";

/// Refreshes `updated_at` on every row update.
///
/// The WHEN clause skips updates that already moved the timestamp, so the
/// trigger never re-fires on its own write.
pub const CREATE_TOUCH_TRIGGER: &str = r#"
CREATE TRIGGER IF NOT EXISTS phrases_touch_updated_at
AFTER UPDATE ON phrases
FOR EACH ROW
WHEN NEW.updated_at = OLD.updated_at
BEGIN
    UPDATE phrases
    SET updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
    WHERE id = NEW.id;
END
"#;

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![CREATE_PHRASES_TABLE, CREATE_DUE_INDEX, CREATE_TOUCH_TRIGGER]
}
