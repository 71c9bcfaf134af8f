//! Pure unlock-condition evaluation.
//!
//! Maps a condition plus the current stats to a progress fraction and an
//! unlocked flag. No clocks and no storage: the engine supplies the
//! evaluation context.

use chrono::{DateTime, Utc};

use super::types::{RouteEvent, UnlockCondition};
use crate::stats::UserStats;

/// Result of evaluating one condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Normalized progress in [0, 1]
    pub progress: f32,
    /// Whether the condition is satisfied
    pub unlocked: bool,
}

impl Evaluation {
    fn locked(progress: f32) -> Self {
        Self {
            progress: progress.clamp(0.0, 1.0),
            unlocked: false,
        }
    }

    fn done() -> Self {
        Self {
            progress: 1.0,
            unlocked: true,
        }
    }
}

/// Context the engine supplies for one evaluation pass.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Evaluation instant
    pub now: DateTime<Utc>,
    /// Metadata of the triggering route completion, when there is one.
    /// Festival conditions only match against this; passes without a route
    /// event leave them unsatisfied for the round.
    pub route_event: Option<&'a RouteEvent>,
    /// Policy-selected anchor for date-eligibility conditions
    pub eligibility_anchor: DateTime<Utc>,
}

/// Evaluate a condition against the current stats.
pub fn evaluate(condition: &UnlockCondition, stats: &UserStats, ctx: &EvalContext) -> Evaluation {
    match condition {
        UnlockCondition::RoutesCompleted { target } => {
            counter_progress(stats.completed_routes, *target)
        }
        UnlockCondition::OfficialRoutesCompleted { target } => {
            counter_progress(stats.completed_official_routes, *target)
        }
        UnlockCondition::DistanceWalked { target_meters } => {
            let fraction = (stats.total_distance_meters / target_meters) as f32;
            if stats.total_distance_meters >= *target_meters {
                Evaluation::done()
            } else {
                Evaluation::locked(fraction)
            }
        }
        UnlockCondition::LocationsVisited { target } => {
            counter_progress(stats.visited_locations, *target)
        }
        UnlockCondition::SocialShares { target } => counter_progress(stats.social_shares, *target),
        UnlockCondition::ConsecutiveDays { target } => {
            counter_progress(stats.consecutive_days, *target)
        }
        UnlockCondition::PhotosTaken { target } => counter_progress(stats.photos_taken, *target),
        UnlockCondition::ArNavigation => {
            // Always a first-occurrence condition, whatever the catalog says.
            if stats.ar_navigation_used >= 1 {
                Evaluation::done()
            } else {
                Evaluation::locked(0.0)
            }
        }
        UnlockCondition::FestivalRoute {
            festival,
            route_kind,
        } => match ctx.route_event {
            Some(event) => {
                let festival_matches = event.festival.as_deref() == Some(festival.as_str());
                let kind_matches = route_kind.map_or(true, |kind| event.kind == kind);
                if festival_matches && kind_matches {
                    Evaluation::done()
                } else {
                    Evaluation::locked(0.0)
                }
            }
            None => Evaluation::locked(0.0),
        },
        UnlockCondition::JoinedBefore { deadline } => {
            // One-time eligibility, never fractional.
            if ctx.eligibility_anchor < *deadline {
                Evaluation::done()
            } else {
                Evaluation::locked(0.0)
            }
        }
    }
}

fn counter_progress(current: u32, target: u32) -> Evaluation {
    if current >= target {
        Evaluation::done()
    } else {
        Evaluation::locked(current as f32 / target as f32)
    }
}
