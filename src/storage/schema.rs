//! Database schema definitions for the badge engine.

/// SQL schema for the engine's key-value state table.
///
/// Persisted engine state is three logical keys (`user_stats`,
/// `user_badges`, `badge_progress`), each a JSON payload.
pub const SCHEMA: &str = r#"
-- Engine state table
CREATE TABLE IF NOT EXISTS engine_state (
    key TEXT PRIMARY KEY,
    value_json TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// Schema version tracking table.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;
