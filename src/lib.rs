//! WayQuest Badge Engine
//!
//! Badge and achievement progress engine for the WayQuest route discovery
//! app. Consumes activity events (route completions, walked distance,
//! location visits, shares, AR sessions, photos), evaluates unlock
//! conditions against a static badge catalog, persists unlock state, and
//! surfaces unlock alerts one at a time.

pub mod badges;
pub mod config;
pub mod stats;
pub mod storage;

// Re-export commonly used types
pub use badges::catalog::BadgeCatalog;
pub use badges::engine::{BadgeEngine, BadgeUnlocked, EngineEvent};
pub use badges::types::{BadgeDefinition, RouteKind, UnlockCondition};
pub use config::EngineConfig;
pub use stats::UserStats;
pub use storage::{MemoryStore, SqliteStore};
