//! Badge engine.
//!
//! Orchestrates the update-then-evaluate-then-notify cycle: activity events
//! mutate the user stats, every locked and obtainable catalog entry is
//! re-evaluated, and new unlocks are persisted and queued for one-at-a-time
//! acknowledgment.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use crossbeam::channel::{Receiver, Sender};
use thiserror::Error;

use super::catalog::BadgeCatalog;
use super::evaluator::{evaluate, EvalContext};
use super::types::{BadgeDefinition, BadgeProgress, RouteEvent, RouteKind, UnlockedBadge};
use crate::config::{DateEligibility, EngineConfig};
use crate::stats::{streak, UserStats};
use crate::storage::stats_store::UserStatsStore;
use crate::storage::store::{PersistenceAdapter, StoreError};

/// Notification payload for a badge unlock.
#[derive(Debug, Clone)]
pub struct BadgeUnlocked {
    /// Badge that was unlocked
    pub badge: BadgeDefinition,
    /// When it unlocked
    pub unlocked_at: DateTime<Utc>,
    /// Experience granted with the unlock
    pub experience_awarded: u32,
}

impl BadgeUnlocked {
    /// Human-readable unlock message for the alert UI.
    pub fn message(&self) -> String {
        format!(
            "Badge unlocked: {} (+{} XP)",
            self.badge.name, self.experience_awarded
        )
    }
}

/// Events emitted to subscribers.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A badge transitioned from locked to unlocked
    BadgeUnlocked(BadgeUnlocked),
    /// The stats snapshot changed
    StatsChanged,
}

/// Badge engine: owns the user stats, the unlocked set, and the pending
/// alert queue.
///
/// Single-writer by construction: every mutating operation takes
/// `&mut self`, so a multi-threaded host serializes calls through a mutex
/// or a single-owner task.
pub struct BadgeEngine<S: PersistenceAdapter> {
    catalog: BadgeCatalog,
    store: UserStatsStore<S>,
    config: EngineConfig,
    stats: UserStats,
    unlocked: Vec<UnlockedBadge>,
    unlocked_ids: HashSet<String>,
    pending: VecDeque<BadgeUnlocked>,
    subscribers: Vec<Sender<EngineEvent>>,
}

impl<S: PersistenceAdapter> BadgeEngine<S> {
    /// Create an engine over a catalog, a persistence adapter, and policy
    /// configuration. Persisted state is loaded fail-soft.
    pub fn new(catalog: BadgeCatalog, store: S, config: EngineConfig) -> Result<Self, EngineError> {
        let store = UserStatsStore::new(store);
        let stats = store.load_stats()?;
        let unlocked = store.load_unlocked()?;
        let unlocked_ids = unlocked.iter().map(|u| u.badge_id.clone()).collect();

        Ok(Self {
            catalog,
            store,
            config,
            stats,
            unlocked,
            unlocked_ids,
            pending: VecDeque::new(),
            subscribers: Vec::new(),
        })
    }

    // ========== Activity events ==========

    /// Record a completed route.
    ///
    /// Increments the route counters, grants the configured completion
    /// experience, and re-evaluates with the route's festival metadata
    /// attached so event-driven festival badges can match.
    pub fn record_route_completion(
        &mut self,
        kind: RouteKind,
        festival: Option<&str>,
    ) -> Result<Vec<BadgeUnlocked>, EngineError> {
        let xp = self.config.route_completion_xp;
        let event = RouteEvent::new(kind, festival);
        self.apply_activity(Some(event), |stats| {
            stats.completed_routes += 1;
            if kind == RouteKind::Official {
                stats.completed_official_routes += 1;
            }
            stats.experience += xp;
        })
    }

    /// Record walked distance in meters.
    ///
    /// Negative or non-finite input never corrupts the counters: the call
    /// becomes a no-op.
    pub fn record_walk_distance(&mut self, meters: f64) -> Result<Vec<BadgeUnlocked>, EngineError> {
        if !meters.is_finite() || meters <= 0.0 {
            return Ok(Vec::new());
        }
        self.apply_activity(None, |stats| {
            stats.total_distance_meters += meters;
        })
    }

    /// Record a location visit.
    pub fn record_location_visit(&mut self) -> Result<Vec<BadgeUnlocked>, EngineError> {
        self.apply_activity(None, |stats| {
            stats.visited_locations += 1;
        })
    }

    /// Record a social share.
    pub fn record_social_share(&mut self) -> Result<Vec<BadgeUnlocked>, EngineError> {
        self.apply_activity(None, |stats| {
            stats.social_shares += 1;
        })
    }

    /// Record an AR navigation session.
    pub fn record_ar_navigation(&mut self) -> Result<Vec<BadgeUnlocked>, EngineError> {
        self.apply_activity(None, |stats| {
            stats.ar_navigation_used += 1;
        })
    }

    /// Record a photo taken.
    pub fn record_photo_taken(&mut self) -> Result<Vec<BadgeUnlocked>, EngineError> {
        self.apply_activity(None, |stats| {
            stats.photos_taken += 1;
        })
    }

    /// Re-evaluate without mutating any counter.
    ///
    /// Catches badges whose obtainability window opened since the last
    /// activity event.
    pub fn check_for_new_badges(&mut self) -> Result<Vec<BadgeUnlocked>, EngineError> {
        let stats = self.stats.clone();
        self.evaluate_and_commit(stats, None, Utc::now())
    }

    /// Clear all counters, unlock records, and pending alerts.
    ///
    /// Explicit user action only; the engine never resets implicitly.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.store.reset()?;
        self.stats = UserStats::default();
        self.unlocked.clear();
        self.unlocked_ids.clear();
        self.pending.clear();
        self.emit(EngineEvent::StatsChanged);
        Ok(())
    }

    // ========== Queries ==========

    /// Read-only stats snapshot.
    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    /// The badge catalog.
    pub fn catalog(&self) -> &BadgeCatalog {
        &self.catalog
    }

    /// All unlock records, in unlock order.
    pub fn unlocked_badges(&self) -> &[UnlockedBadge] {
        &self.unlocked
    }

    /// Whether a badge is unlocked.
    pub fn is_unlocked(&self, badge_id: &str) -> bool {
        self.unlocked_ids.contains(badge_id)
    }

    /// Number of unlocked badges.
    pub fn unlocked_count(&self) -> usize {
        self.unlocked_ids.len()
    }

    /// Fraction of the catalog unlocked, in [0, 1].
    pub fn completion_fraction(&self) -> f32 {
        if self.catalog.is_empty() {
            return 0.0;
        }
        self.unlocked_count() as f32 / self.catalog.len() as f32
    }

    /// Progress fraction for one badge.
    ///
    /// Returns 1.0 once unlocked (even as the underlying counter keeps
    /// rising), the evaluated fraction while locked, and 0.0 for ids not
    /// in the catalog.
    pub fn badge_progress(&self, badge_id: &str) -> f32 {
        if self.unlocked_ids.contains(badge_id) {
            return 1.0;
        }
        match self.catalog.get(badge_id) {
            Some(badge) => {
                let now = Utc::now();
                let ctx = EvalContext {
                    now,
                    route_event: None,
                    eligibility_anchor: self.eligibility_anchor(now),
                };
                evaluate(&badge.condition, &self.stats, &ctx).progress
            }
            None => 0.0,
        }
    }

    /// Progress fractions for every locked badge.
    pub fn progress_snapshot(&self) -> Vec<BadgeProgress> {
        let now = Utc::now();
        let ctx = EvalContext {
            now,
            route_event: None,
            eligibility_anchor: self.eligibility_anchor(now),
        };
        self.catalog
            .all()
            .iter()
            .filter(|b| !self.unlocked_ids.contains(&b.id))
            .map(|b| BadgeProgress {
                badge_id: b.id.clone(),
                progress: evaluate(&b.condition, &self.stats, &ctx).progress,
            })
            .collect()
    }

    // ========== Pending alerts ==========

    /// The single pending unlock alert, if any. Stays at the queue head
    /// until acknowledged.
    pub fn pending_alert(&self) -> Option<&BadgeUnlocked> {
        self.pending.front()
    }

    /// Acknowledge the current alert, surfacing the next one.
    pub fn acknowledge_alert(&mut self) -> Option<BadgeUnlocked> {
        self.pending.pop_front()
    }

    // ========== Subscriptions ==========

    /// Subscribe to engine events. Dropped receivers are pruned on the
    /// next send.
    pub fn subscribe(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = crossbeam::channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: EngineEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    // ========== Internals ==========

    fn eligibility_anchor(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.config.date_eligibility {
            DateEligibility::AccountCreation => self.stats.account_created_at,
            DateEligibility::FirstActivity => self.stats.first_activity_at.unwrap_or(now),
        }
    }

    /// Apply a counter mutation as one atomic step, then evaluate.
    fn apply_activity(
        &mut self,
        route_event: Option<RouteEvent>,
        mutate: impl FnOnce(&mut UserStats),
    ) -> Result<Vec<BadgeUnlocked>, EngineError> {
        let now = Utc::now();
        let mut stats = self.stats.clone();
        stats.mark_activity(now);
        streak::touch(&mut stats, now, self.config.streak_utc_offset_minutes);
        mutate(&mut stats);
        self.evaluate_and_commit(stats, route_event.as_ref(), now)
    }

    /// Evaluate all locked, obtainable badges against `stats`, persist,
    /// and commit.
    ///
    /// Every mutation happens on working copies; the persisted write is a
    /// single transaction, and in-memory state changes only after it
    /// succeeds. On failure both memory and disk keep their pre-call
    /// values.
    fn evaluate_and_commit(
        &mut self,
        mut stats: UserStats,
        route_event: Option<&RouteEvent>,
        now: DateTime<Utc>,
    ) -> Result<Vec<BadgeUnlocked>, EngineError> {
        let anchor = match self.config.date_eligibility {
            DateEligibility::AccountCreation => stats.account_created_at,
            DateEligibility::FirstActivity => stats.first_activity_at.unwrap_or(now),
        };
        let ctx = EvalContext {
            now,
            route_event,
            eligibility_anchor: anchor,
        };

        let mut newly = Vec::new();
        let mut new_records = Vec::new();
        let mut progress_cache = Vec::new();

        for badge in self.catalog.all() {
            if self.unlocked_ids.contains(&badge.id) {
                continue;
            }
            // A badge outside its window is excluded even when its numeric
            // condition is already satisfied.
            if !badge.is_obtainable(now) {
                continue;
            }

            let eval = evaluate(&badge.condition, &stats, &ctx);
            if eval.unlocked {
                stats.experience += badge.reward_experience;
                new_records.push(UnlockedBadge::new(&badge.id, now));
                newly.push(BadgeUnlocked {
                    badge: badge.clone(),
                    unlocked_at: now,
                    experience_awarded: badge.reward_experience,
                });
            } else {
                progress_cache.push(BadgeProgress {
                    badge_id: badge.id.clone(),
                    progress: eval.progress,
                });
            }
        }

        let mut all_unlocked = self.unlocked.clone();
        all_unlocked.extend(new_records.iter().cloned());

        self.store.persist(&stats, &all_unlocked, &progress_cache)?;

        self.stats = stats;
        for record in &new_records {
            self.unlocked_ids.insert(record.badge_id.clone());
        }
        self.unlocked = all_unlocked;

        for notice in &newly {
            tracing::info!(badge = %notice.badge.id, "Badge unlocked");
            self.pending.push_back(notice.clone());
            self.emit(EngineEvent::BadgeUnlocked(notice.clone()));
        }
        self.emit(EngineEvent::StatsChanged);

        Ok(newly)
    }
}

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badges::catalog::BadgeCatalog;
    use crate::badges::types::{BadgeCategory, BadgeRarity, UnlockCondition};
    use crate::storage::store::MemoryStore;
    use chrono::Duration;

    fn small_catalog() -> BadgeCatalog {
        BadgeCatalog::new(vec![
            BadgeDefinition::new(
                "routes_3",
                "Three Routes",
                "Complete 3 routes",
                BadgeCategory::Exploration,
                BadgeRarity::Common,
                UnlockCondition::RoutesCompleted { target: 3 },
            )
            .with_reward(100),
            BadgeDefinition::new(
                "ar_first",
                "AR First",
                "Use AR navigation",
                BadgeCategory::Special,
                BadgeRarity::Rare,
                UnlockCondition::ArNavigation,
            )
            .with_reward(150),
        ])
        .unwrap()
    }

    fn engine() -> BadgeEngine<MemoryStore> {
        BadgeEngine::new(small_catalog(), MemoryStore::new(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_unlock_fires_once() {
        let mut engine = engine();

        for _ in 0..2 {
            let unlocked = engine
                .record_route_completion(RouteKind::Community, None)
                .unwrap();
            assert!(unlocked.is_empty());
        }

        let unlocked = engine
            .record_route_completion(RouteKind::Community, None)
            .unwrap();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].badge.id, "routes_3");

        // 3 route completions at 10 XP plus the 100 XP reward.
        assert_eq!(engine.stats().experience, 130);

        // Further routes never re-grant the reward.
        let unlocked = engine
            .record_route_completion(RouteKind::Community, None)
            .unwrap();
        assert!(unlocked.is_empty());
        assert_eq!(engine.stats().experience, 140);
    }

    #[test]
    fn test_progress_caps_at_one_when_unlocked() {
        let mut engine = engine();
        for _ in 0..3 {
            engine
                .record_route_completion(RouteKind::Community, None)
                .unwrap();
        }
        assert_eq!(engine.badge_progress("routes_3"), 1.0);

        // Counter keeps rising; progress stays pinned.
        for _ in 0..5 {
            engine
                .record_route_completion(RouteKind::Community, None)
                .unwrap();
        }
        assert_eq!(engine.badge_progress("routes_3"), 1.0);
    }

    #[test]
    fn test_negative_distance_is_noop() {
        let mut engine = engine();
        engine.record_walk_distance(-50.0).unwrap();
        engine.record_walk_distance(f64::NAN).unwrap();
        assert_eq!(engine.stats().total_distance_meters, 0.0);
        assert_eq!(engine.stats().consecutive_days, 0);
    }

    #[test]
    fn test_expired_badge_never_unlocks() {
        let catalog = BadgeCatalog::new(vec![BadgeDefinition::new(
            "gone",
            "Gone",
            "Expired festival badge",
            BadgeCategory::Seasonal,
            BadgeRarity::Rare,
            UnlockCondition::RoutesCompleted { target: 2 },
        )
        .valid_until(Utc::now() - Duration::days(1))])
        .unwrap();

        let mut engine =
            BadgeEngine::new(catalog, MemoryStore::new(), EngineConfig::default()).unwrap();

        for _ in 0..10 {
            let unlocked = engine
                .record_route_completion(RouteKind::Community, None)
                .unwrap();
            assert!(unlocked.is_empty());
        }
        assert!(!engine.is_unlocked("gone"));
    }

    #[test]
    fn test_window_opening_is_caught_by_check() {
        let opens_soon = Utc::now() + Duration::milliseconds(150);
        let catalog = BadgeCatalog::new(vec![BadgeDefinition::new(
            "windowed",
            "Windowed",
            "Opens shortly",
            BadgeCategory::Seasonal,
            BadgeRarity::Rare,
            UnlockCondition::RoutesCompleted { target: 1 },
        )
        .available_from(opens_soon)])
        .unwrap();

        let mut engine =
            BadgeEngine::new(catalog, MemoryStore::new(), EngineConfig::default()).unwrap();

        // Satisfy the counter before the window opens.
        let unlocked = engine
            .record_route_completion(RouteKind::Community, None)
            .unwrap();
        assert!(unlocked.is_empty());

        std::thread::sleep(std::time::Duration::from_millis(200));

        // No counter mutation, but the window has opened.
        let unlocked = engine.check_for_new_badges().unwrap();
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].badge.id, "windowed");
    }

    #[test]
    fn test_pending_alerts_surface_one_at_a_time() {
        let catalog = BadgeCatalog::new(vec![
            BadgeDefinition::new(
                "one_route",
                "One Route",
                "Complete a route",
                BadgeCategory::Exploration,
                BadgeRarity::Common,
                UnlockCondition::RoutesCompleted { target: 1 },
            ),
            BadgeDefinition::new(
                "one_official",
                "One Official",
                "Complete an official route",
                BadgeCategory::Exploration,
                BadgeRarity::Common,
                UnlockCondition::OfficialRoutesCompleted { target: 1 },
            ),
        ])
        .unwrap();

        let mut engine =
            BadgeEngine::new(catalog, MemoryStore::new(), EngineConfig::default()).unwrap();

        // One event satisfies both badges.
        let unlocked = engine
            .record_route_completion(RouteKind::Official, None)
            .unwrap();
        assert_eq!(unlocked.len(), 2);

        assert_eq!(engine.pending_alert().unwrap().badge.id, "one_route");
        // Still the same alert until acknowledged.
        assert_eq!(engine.pending_alert().unwrap().badge.id, "one_route");

        let first = engine.acknowledge_alert().unwrap();
        assert_eq!(first.badge.id, "one_route");
        assert_eq!(engine.pending_alert().unwrap().badge.id, "one_official");

        engine.acknowledge_alert().unwrap();
        assert!(engine.pending_alert().is_none());
    }

    #[test]
    fn test_subscribers_receive_unlock_events() {
        let mut engine = engine();
        let rx = engine.subscribe();

        engine.record_ar_navigation().unwrap();

        let mut saw_unlock = false;
        while let Ok(event) = rx.try_recv() {
            if let EngineEvent::BadgeUnlocked(notice) = event {
                assert_eq!(notice.badge.id, "ar_first");
                saw_unlock = true;
            }
        }
        assert!(saw_unlock);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut engine = engine();
        engine.record_ar_navigation().unwrap();
        assert_eq!(engine.unlocked_count(), 1);

        engine.reset().unwrap();
        assert_eq!(engine.unlocked_count(), 0);
        assert_eq!(engine.stats().experience, 0);
        assert!(engine.pending_alert().is_none());
        assert_eq!(engine.badge_progress("ar_first"), 0.0);
    }

    #[test]
    fn test_completion_fraction() {
        let mut engine = engine();
        assert_eq!(engine.completion_fraction(), 0.0);
        engine.record_ar_navigation().unwrap();
        assert!((engine.completion_fraction() - 0.5).abs() < f32::EPSILON);
    }

    /// Store that accepts reads but refuses every write.
    struct FailingStore;

    impl PersistenceAdapter for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn put_many(&mut self, _entries: &[(&str, String)]) -> Result<(), StoreError> {
            Err(StoreError::WriteFailed("disk full".to_string()))
        }

        fn remove_many(&mut self, _keys: &[&str]) -> Result<(), StoreError> {
            Err(StoreError::WriteFailed("disk full".to_string()))
        }
    }

    #[test]
    fn test_write_failure_leaves_state_untouched() {
        let mut engine =
            BadgeEngine::new(small_catalog(), FailingStore, EngineConfig::default()).unwrap();

        let result = engine.record_route_completion(RouteKind::Community, None);
        assert!(result.is_err());

        // Neither the counter nor the experience moved.
        assert_eq!(engine.stats().completed_routes, 0);
        assert_eq!(engine.stats().experience, 0);
        assert!(engine.pending_alert().is_none());
    }
}
