//! User activity counters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Cumulative activity counters for one user, persisted as a single value.
///
/// All counters start at zero and only grow, except `consecutive_days`,
/// which resets when a calendar day is skipped (see `stats::streak`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    /// Routes completed (any kind)
    pub completed_routes: u32,
    /// Official routes completed
    pub completed_official_routes: u32,
    /// Total distance walked in meters
    pub total_distance_meters: f64,
    /// Distinct locations visited
    pub visited_locations: u32,
    /// Activity shares
    pub social_shares: u32,
    /// AR navigation sessions
    pub ar_navigation_used: u32,
    /// Photos taken
    pub photos_taken: u32,
    /// Current consecutive-day activity streak
    pub consecutive_days: u32,
    /// Accumulated experience points
    pub experience: u32,
    /// Last calendar day (at the configured boundary) with activity
    pub last_active_date: Option<NaiveDate>,
    /// When this stats record was first created
    pub account_created_at: DateTime<Utc>,
    /// First mutating activity, if any yet
    pub first_activity_at: Option<DateTime<Utc>>,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            completed_routes: 0,
            completed_official_routes: 0,
            total_distance_meters: 0.0,
            visited_locations: 0,
            social_shares: 0,
            ar_navigation_used: 0,
            photos_taken: 0,
            consecutive_days: 0,
            experience: 0,
            last_active_date: None,
            account_created_at: Utc::now(),
            first_activity_at: None,
        }
    }
}

impl UserStats {
    /// Record the instant of a mutating call, stamping the first-activity
    /// anchor if absent.
    pub fn mark_activity(&mut self, at: DateTime<Utc>) {
        if self.first_activity_at.is_none() {
            self.first_activity_at = Some(at);
        }
    }
}
