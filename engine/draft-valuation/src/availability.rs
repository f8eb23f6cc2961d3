//! Positional scarcity and single-drafter availability risk

use crate::config::AvailabilityConfig;
use crate::context::DraftHorizon;
use crate::draft_math;
use crate::types::{Player, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scarcity of one position between now and the horizon pick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScarcityMetric {
    /// Remaining players at the position
    pub count: usize,
    /// Remaining players whose ADP falls at or before the horizon pick
    pub in_window: usize,
    pub urgency: f64,
}

/// Availability signals for one player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub risk: f64,
    pub take_now: bool,
    /// Probability the player survives to the horizon pick; `None` when the
    /// opponent simulation did not run
    pub make_it_back: Option<f64>,
}

pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Scarcity per position: `1 - in_window / window_size`, floored at 0
pub fn positional_scarcity(players: &[Player], horizon: &DraftHorizon) -> BTreeMap<Position, ScarcityMetric> {
    if players.is_empty() {
        return BTreeMap::new();
    }

    let window_size = (horizon.horizon_pick.saturating_sub(horizon.current_overall) + 1).max(1);
    let horizon_pick = horizon.horizon_pick as f64;

    Position::ALL
        .iter()
        .map(|&pos| {
            let at_pos = players.iter().filter(|p| p.position == Some(pos));
            let (count, in_window) = at_pos.fold((0, 0), |(count, in_window), p| {
                let inside = p.adp_estimate().is_some_and(|adp| adp <= horizon_pick);
                (count + 1, in_window + usize::from(inside))
            });
            let urgency = (1.0 - in_window as f64 / window_size as f64).max(0.0);
            (pos, ScarcityMetric { count, in_window, urgency })
        })
        .collect()
}

/// Round a third-source target round lands in for a league of `teams`
pub fn rescale_target_round(target_round: f64, teams: u32, cfg: &AvailabilityConfig) -> f64 {
    (target_round - 1.0) * cfg.target_round_teams as f64 / teams.max(1) as f64 + 1.0
}

/// Risk that a single drafter pass takes the player before the horizon pick.
///
/// `risk = 1 - logistic((horizon - adp) / sensitivity)`, where sensitivity
/// widens as the draft progresses. A player whose target round has been
/// reached gets a small extra bias and is always flagged take-now.
pub fn availability_risk(
    player: &Player,
    horizon: &DraftHorizon,
    teams: u32,
    cfg: &AvailabilityConfig,
) -> (f64, bool) {
    let Some(adp) = player.adp_estimate() else {
        return (0.5, false);
    };

    let horizon_pick = horizon.horizon_pick as f64;
    let sensitivity = cfg.sensitivity(horizon.current_round);
    let mut risk = 1.0 - logistic((horizon_pick - adp) / sensitivity);
    let mut take_now = adp <= horizon_pick;

    if let Some(target) = player.source_c_target_round {
        let target_round = rescale_target_round(target, teams, cfg);
        let horizon_round = draft_math::round_of(horizon.horizon_pick, teams) as f64;
        if horizon_round >= target_round {
            risk += cfg.target_window_bias;
            take_now = true;
        }
    }

    (risk.clamp(0.0, 1.0), take_now)
}
