//! Core types for the badge system.
//!
//! Defines badge definitions, unlock conditions, and unlock records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Badge category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    /// Route and location discovery
    Exploration,
    /// Festival-tied events
    Festival,
    /// Cumulative milestones
    Achievement,
    /// Sharing and community
    Social,
    /// One-off or hidden badges
    Special,
    /// Time-windowed badges
    Seasonal,
}

impl BadgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeCategory::Exploration => "exploration",
            BadgeCategory::Festival => "festival",
            BadgeCategory::Achievement => "achievement",
            BadgeCategory::Social => "social",
            BadgeCategory::Special => "special",
            BadgeCategory::Seasonal => "seasonal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "exploration" => Some(BadgeCategory::Exploration),
            "festival" => Some(BadgeCategory::Festival),
            "achievement" => Some(BadgeCategory::Achievement),
            "social" => Some(BadgeCategory::Social),
            "special" => Some(BadgeCategory::Special),
            "seasonal" => Some(BadgeCategory::Seasonal),
            _ => None,
        }
    }
}

/// Badge rarity. Ordinal display weight only; evaluation never consults it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl BadgeRarity {
    /// Get display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            BadgeRarity::Common => "Common",
            BadgeRarity::Rare => "Rare",
            BadgeRarity::Epic => "Epic",
            BadgeRarity::Legendary => "Legendary",
            BadgeRarity::Mythic => "Mythic",
        }
    }
}

impl std::fmt::Display for BadgeRarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Route classification reported with a completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    /// Curated official route
    Official,
    /// User-created route
    Community,
}

/// Metadata attached to a route completion event.
///
/// Festival badges are event-driven: they match on this metadata rather
/// than on any counter, so the engine forwards it into evaluation only for
/// the triggering call.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEvent {
    pub kind: RouteKind,
    pub festival: Option<String>,
}

impl RouteEvent {
    pub fn new(kind: RouteKind, festival: Option<&str>) -> Self {
        Self {
            kind,
            festival: festival.map(str::to_owned),
        }
    }
}

/// Unlock condition for a badge.
///
/// One variant per condition type, carrying only the fields that type
/// needs. Counter targets must be positive; `BadgeCatalog` enforces this
/// at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnlockCondition {
    /// Complete a total number of routes
    RoutesCompleted { target: u32 },
    /// Complete a total number of official routes
    OfficialRoutesCompleted { target: u32 },
    /// Walk a cumulative distance in meters
    DistanceWalked { target_meters: f64 },
    /// Visit a number of distinct locations
    LocationsVisited { target: u32 },
    /// Complete a route during a named festival, optionally pinned to a
    /// route kind
    FestivalRoute {
        festival: String,
        route_kind: Option<RouteKind>,
    },
    /// Share activity a number of times
    SocialShares { target: u32 },
    /// Be active on consecutive calendar days
    ConsecutiveDays { target: u32 },
    /// Joined (per the configured eligibility anchor) before a deadline
    JoinedBefore { deadline: DateTime<Utc> },
    /// Use AR navigation for the first time
    ArNavigation,
    /// Take a number of photos
    PhotosTaken { target: u32 },
}

impl UnlockCondition {
    /// Numeric target, where the condition has one.
    pub fn target(&self) -> Option<f64> {
        match self {
            UnlockCondition::RoutesCompleted { target }
            | UnlockCondition::OfficialRoutesCompleted { target }
            | UnlockCondition::LocationsVisited { target }
            | UnlockCondition::SocialShares { target }
            | UnlockCondition::ConsecutiveDays { target }
            | UnlockCondition::PhotosTaken { target } => Some(f64::from(*target)),
            UnlockCondition::DistanceWalked { target_meters } => Some(*target_meters),
            UnlockCondition::FestivalRoute { .. }
            | UnlockCondition::JoinedBefore { .. }
            | UnlockCondition::ArNavigation => None,
        }
    }
}

/// Badge definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeDefinition {
    /// Stable unique key
    pub id: String,
    /// Display name
    pub name: String,
    /// Description shown with the badge
    pub description: String,
    /// Category
    pub category: BadgeCategory,
    /// Display rarity
    pub rarity: BadgeRarity,
    /// Unlock condition
    pub condition: UnlockCondition,
    /// Experience granted on unlock
    pub reward_experience: u32,
    /// Whether the badge is currently obtainable at all
    pub active: bool,
    /// Badge cannot be unlocked before this instant
    pub available_from: Option<DateTime<Utc>>,
    /// Badge cannot be newly unlocked after this instant
    pub valid_until: Option<DateTime<Utc>>,
}

impl BadgeDefinition {
    /// Create a new badge definition.
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        category: BadgeCategory,
        rarity: BadgeRarity,
        condition: UnlockCondition,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category,
            rarity,
            condition,
            reward_experience: 0,
            active: true,
            available_from: None,
            valid_until: None,
        }
    }

    /// Set experience reward.
    pub fn with_reward(mut self, experience: u32) -> Self {
        self.reward_experience = experience;
        self
    }

    /// Mark as not currently obtainable.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Set the start of the obtainability window.
    pub fn available_from(mut self, instant: DateTime<Utc>) -> Self {
        self.available_from = Some(instant);
        self
    }

    /// Set the unlock deadline. Already-unlocked badges are unaffected.
    pub fn valid_until(mut self, deadline: DateTime<Utc>) -> Self {
        self.valid_until = Some(deadline);
        self
    }

    /// Whether the badge can be newly unlocked at `now`.
    ///
    /// A badge outside its window is excluded from evaluation entirely,
    /// even when its numeric condition is already satisfied.
    pub fn is_obtainable(&self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        if let Some(from) = self.available_from {
            if now < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if now > until {
                return false;
            }
        }
        true
    }
}

/// Persisted record of a badge unlock.
///
/// Created exactly once per badge id and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockedBadge {
    pub id: Uuid,
    pub badge_id: String,
    pub unlocked_at: DateTime<Utc>,
}

impl UnlockedBadge {
    pub fn new(badge_id: &str, unlocked_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            badge_id: badge_id.to_string(),
            unlocked_at,
        }
    }
}

/// Derived per-badge progress fraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeProgress {
    pub badge_id: String,
    /// Normalized progress in [0, 1]
    pub progress: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_category_round_trip() {
        for cat in [
            BadgeCategory::Exploration,
            BadgeCategory::Festival,
            BadgeCategory::Achievement,
            BadgeCategory::Social,
            BadgeCategory::Special,
            BadgeCategory::Seasonal,
        ] {
            assert_eq!(BadgeCategory::from_str(cat.as_str()), Some(cat));
        }
        assert_eq!(BadgeCategory::from_str("unknown"), None);
    }

    #[test]
    fn test_rarity_ordering() {
        assert!(BadgeRarity::Common < BadgeRarity::Rare);
        assert!(BadgeRarity::Legendary < BadgeRarity::Mythic);
    }

    #[test]
    fn test_obtainability_window() {
        let base = BadgeDefinition::new(
            "spring_fling",
            "Spring Fling",
            "Complete a route during the spring event",
            BadgeCategory::Seasonal,
            BadgeRarity::Rare,
            UnlockCondition::RoutesCompleted { target: 1 },
        );
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 5, 31, 23, 59, 59).unwrap();

        let windowed = base.clone().available_from(start).valid_until(end);
        let before = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let during = Utc.with_ymd_and_hms(2025, 4, 15, 12, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        assert!(!windowed.is_obtainable(before));
        assert!(windowed.is_obtainable(during));
        assert!(!windowed.is_obtainable(after));

        assert!(!base.inactive().is_obtainable(during));
    }

    #[test]
    fn test_condition_targets() {
        assert_eq!(
            UnlockCondition::RoutesCompleted { target: 10 }.target(),
            Some(10.0)
        );
        assert_eq!(
            UnlockCondition::DistanceWalked {
                target_meters: 5000.0
            }
            .target(),
            Some(5000.0)
        );
        assert_eq!(UnlockCondition::ArNavigation.target(), None);
    }
}
