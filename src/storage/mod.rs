//! Persistence layer.
//!
//! Provides the SQLite database wrapper, the key-value persistence seam,
//! and the typed stats store used by the badge engine.

pub mod database;
pub mod schema;
pub mod stats_store;
pub mod store;

// Re-export commonly used types
pub use database::{Database, DatabaseError};
pub use stats_store::{UserStatsStore, KEY_BADGE_PROGRESS, KEY_USER_BADGES, KEY_USER_STATS};
pub use store::{MemoryStore, PersistenceAdapter, SqliteStore, StoreError};
