//! Badge catalog.
//!
//! An immutable, validated set of badge definitions with O(1) id lookup,
//! plus the built-in definitions shipped with the app.

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use thiserror::Error;

use super::types::{BadgeCategory, BadgeDefinition, BadgeRarity, RouteKind, UnlockCondition};

/// Immutable badge catalog, fixed at construction.
pub struct BadgeCatalog {
    badges: Vec<BadgeDefinition>,
    index: HashMap<String, usize>,
}

impl BadgeCatalog {
    /// Build a catalog, validating id uniqueness and positive targets.
    pub fn new(badges: Vec<BadgeDefinition>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(badges.len());

        for (i, badge) in badges.iter().enumerate() {
            if let Some(target) = badge.condition.target() {
                if target <= 0.0 {
                    return Err(CatalogError::ZeroTarget(badge.id.clone()));
                }
            }
            if index.insert(badge.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(badge.id.clone()));
            }
        }

        Ok(Self { badges, index })
    }

    /// All definitions, in catalog order.
    pub fn all(&self) -> &[BadgeDefinition] {
        &self.badges
    }

    /// Look up a definition by id.
    pub fn get(&self, id: &str) -> Option<&BadgeDefinition> {
        self.index.get(id).map(|&i| &self.badges[i])
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    /// Definitions in a category.
    pub fn by_category(&self, category: BadgeCategory) -> Vec<&BadgeDefinition> {
        self.badges
            .iter()
            .filter(|b| b.category == category)
            .collect()
    }
}

impl Default for BadgeCatalog {
    fn default() -> Self {
        Self::new(default_badges()).expect("built-in badge definitions are valid")
    }
}

/// Catalog validation errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Duplicate badge id: {0}")]
    DuplicateId(String),

    #[error("Badge {0} has a non-positive target")]
    ZeroTarget(String),
}

/// Get all built-in badge definitions.
pub fn default_badges() -> Vec<BadgeDefinition> {
    let mut badges = Vec::new();

    badges.extend(exploration_badges());
    badges.extend(festival_badges());
    badges.extend(achievement_badges());
    badges.extend(social_badges());
    badges.extend(special_badges());
    badges.extend(seasonal_badges());

    badges
}

fn exploration_badges() -> Vec<BadgeDefinition> {
    vec![
        BadgeDefinition::new(
            "first_route",
            "First Steps",
            "Complete your first route",
            BadgeCategory::Exploration,
            BadgeRarity::Common,
            UnlockCondition::RoutesCompleted { target: 1 },
        )
        .with_reward(50),
        BadgeDefinition::new(
            "routes_10",
            "Pathfinder",
            "Complete 10 routes",
            BadgeCategory::Exploration,
            BadgeRarity::Rare,
            UnlockCondition::RoutesCompleted { target: 10 },
        )
        .with_reward(200),
        BadgeDefinition::new(
            "routes_50",
            "Trailblazer",
            "Complete 50 routes",
            BadgeCategory::Exploration,
            BadgeRarity::Epic,
            UnlockCondition::RoutesCompleted { target: 50 },
        )
        .with_reward(500),
        BadgeDefinition::new(
            "official_routes_5",
            "Guided Wanderer",
            "Complete 5 official routes",
            BadgeCategory::Exploration,
            BadgeRarity::Rare,
            UnlockCondition::OfficialRoutesCompleted { target: 5 },
        )
        .with_reward(250),
        BadgeDefinition::new(
            "distance_10km",
            "City Walker",
            "Walk a total of 10 kilometers",
            BadgeCategory::Exploration,
            BadgeRarity::Common,
            UnlockCondition::DistanceWalked {
                target_meters: 10_000.0,
            },
        )
        .with_reward(100),
        BadgeDefinition::new(
            "distance_100km",
            "Long Hauler",
            "Walk a total of 100 kilometers",
            BadgeCategory::Exploration,
            BadgeRarity::Epic,
            UnlockCondition::DistanceWalked {
                target_meters: 100_000.0,
            },
        )
        .with_reward(600),
        BadgeDefinition::new(
            "locations_20",
            "Sightseer",
            "Visit 20 locations",
            BadgeCategory::Exploration,
            BadgeRarity::Rare,
            UnlockCondition::LocationsVisited { target: 20 },
        )
        .with_reward(300),
    ]
}

fn festival_badges() -> Vec<BadgeDefinition> {
    vec![
        BadgeDefinition::new(
            "dragon_boat_official",
            "Dragon Boat Voyager",
            "Complete an official route during the Dragon Boat Festival",
            BadgeCategory::Festival,
            BadgeRarity::Epic,
            UnlockCondition::FestivalRoute {
                festival: "dragon_boat".to_string(),
                route_kind: Some(RouteKind::Official),
            },
        )
        .with_reward(400),
        BadgeDefinition::new(
            "lantern_walk",
            "Lantern Bearer",
            "Complete any route during the Lantern Festival",
            BadgeCategory::Festival,
            BadgeRarity::Rare,
            UnlockCondition::FestivalRoute {
                festival: "lantern".to_string(),
                route_kind: None,
            },
        )
        .with_reward(250),
    ]
}

fn achievement_badges() -> Vec<BadgeDefinition> {
    vec![
        BadgeDefinition::new(
            "streak_3",
            "Warming Up",
            "Be active 3 days in a row",
            BadgeCategory::Achievement,
            BadgeRarity::Common,
            UnlockCondition::ConsecutiveDays { target: 3 },
        )
        .with_reward(100),
        BadgeDefinition::new(
            "streak_7",
            "Week Wanderer",
            "Be active 7 days in a row",
            BadgeCategory::Achievement,
            BadgeRarity::Rare,
            UnlockCondition::ConsecutiveDays { target: 7 },
        )
        .with_reward(300),
        BadgeDefinition::new(
            "streak_30",
            "Committed Explorer",
            "Be active 30 days in a row",
            BadgeCategory::Achievement,
            BadgeRarity::Legendary,
            UnlockCondition::ConsecutiveDays { target: 30 },
        )
        .with_reward(1000),
        BadgeDefinition::new(
            "photos_25",
            "Moment Collector",
            "Take 25 photos on your journeys",
            BadgeCategory::Achievement,
            BadgeRarity::Rare,
            UnlockCondition::PhotosTaken { target: 25 },
        )
        .with_reward(200),
    ]
}

fn social_badges() -> Vec<BadgeDefinition> {
    vec![
        BadgeDefinition::new(
            "first_share",
            "Word of Mouth",
            "Share an activity for the first time",
            BadgeCategory::Social,
            BadgeRarity::Common,
            UnlockCondition::SocialShares { target: 1 },
        )
        .with_reward(50),
        BadgeDefinition::new(
            "shares_10",
            "Community Voice",
            "Share 10 activities",
            BadgeCategory::Social,
            BadgeRarity::Rare,
            UnlockCondition::SocialShares { target: 10 },
        )
        .with_reward(250),
    ]
}

fn special_badges() -> Vec<BadgeDefinition> {
    vec![
        BadgeDefinition::new(
            "ar_pioneer",
            "Through the Lens",
            "Use AR navigation for the first time",
            BadgeCategory::Special,
            BadgeRarity::Rare,
            UnlockCondition::ArNavigation,
        )
        .with_reward(150),
        BadgeDefinition::new(
            "founding_member",
            "Founding Member",
            "Joined during the launch period",
            BadgeCategory::Special,
            BadgeRarity::Mythic,
            UnlockCondition::JoinedBefore {
                deadline: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            },
        )
        .with_reward(500),
    ]
}

fn seasonal_badges() -> Vec<BadgeDefinition> {
    vec![BadgeDefinition::new(
        "summer_2026",
        "Summer Strider",
        "Complete 5 routes during summer 2026",
        BadgeCategory::Seasonal,
        BadgeRarity::Epic,
        UnlockCondition::RoutesCompleted { target: 5 },
    )
    .with_reward(350)
    .available_from(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap())
    .valid_until(Utc.with_ymd_and_hms(2026, 8, 31, 23, 59, 59).unwrap())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = BadgeCatalog::default();
        assert!(catalog.len() > 10);

        // All ids unique and indexed
        for badge in catalog.all() {
            assert_eq!(catalog.get(&badge.id).unwrap().id, badge.id);
        }
    }

    #[test]
    fn test_default_catalog_covers_categories() {
        let catalog = BadgeCatalog::default();
        for category in [
            BadgeCategory::Exploration,
            BadgeCategory::Festival,
            BadgeCategory::Achievement,
            BadgeCategory::Social,
            BadgeCategory::Special,
            BadgeCategory::Seasonal,
        ] {
            assert!(
                !catalog.by_category(category).is_empty(),
                "no badges in {:?}",
                category
            );
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let badge = BadgeDefinition::new(
            "dup",
            "Dup",
            "Duplicate",
            BadgeCategory::Special,
            BadgeRarity::Common,
            UnlockCondition::RoutesCompleted { target: 1 },
        );
        let result = BadgeCatalog::new(vec![badge.clone(), badge]);
        assert!(matches!(result, Err(CatalogError::DuplicateId(_))));
    }

    #[test]
    fn test_zero_target_rejected() {
        let badge = BadgeDefinition::new(
            "zero",
            "Zero",
            "Zero target",
            BadgeCategory::Special,
            BadgeRarity::Common,
            UnlockCondition::PhotosTaken { target: 0 },
        );
        let result = BadgeCatalog::new(vec![badge]);
        assert!(matches!(result, Err(CatalogError::ZeroTarget(_))));
    }

    #[test]
    fn test_unknown_id_lookup() {
        let catalog = BadgeCatalog::default();
        assert!(catalog.get("no_such_badge").is_none());
    }
}
