//! Immutable draft state handed to the engine on every recompute

use crate::config::{validate_weights, LeagueConfig};
use crate::draft_math;
use crate::error::{DraftError, ValuationError};
use crate::types::{DraftedBy, DraftedPick, Player, RosterCounts, Weights};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Everything the engine needs to value the remaining pool.
///
/// Transitions (`draft`, `undo`) return a new context; the caller owns history
/// and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftContext {
    /// Players still on the board
    pub remaining: Vec<Player>,
    /// Completed picks in draft order
    #[serde(default)]
    pub picks: Vec<DraftedPick>,
    #[serde(default)]
    pub league: LeagueConfig,
    #[serde(default)]
    pub weights: Weights,
}

/// Where the draft stands relative to the user's turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftHorizon {
    /// Overall pick currently on the clock
    pub current_overall: u32,
    pub current_round: u32,
    pub user_on_clock: bool,
    /// The user pick that "make it back" refers to: the next one, or the
    /// following one when the user is already on the clock. Risk, take-now
    /// and scarcity are measured against this pick too, so an on-the-clock
    /// user sees what survives to their next turn rather than the current one.
    pub horizon_pick: u32,
    /// Round of `horizon_pick`
    pub horizon_round: u32,
}

impl DraftHorizon {
    /// Overall picks made by other drafters before `horizon_pick`, in order
    pub fn intervening_picks(&self) -> std::ops::Range<u32> {
        let first = if self.user_on_clock { self.current_overall + 1 } else { self.current_overall };
        first..self.horizon_pick.max(first)
    }
}

impl DraftContext {
    pub fn new(
        remaining: Vec<Player>,
        league: LeagueConfig,
        weights: Weights,
    ) -> Result<Self, ValuationError> {
        league.validate()?;
        validate_weights(&weights)?;
        Ok(Self { remaining, picks: Vec::new(), league, weights })
    }

    /// Overall pick on the clock
    pub fn current_overall(&self) -> u32 {
        self.picks.len() as u32 + 1
    }

    pub fn horizon(&self) -> DraftHorizon {
        let teams = self.league.teams;
        let slot = self.league.slot;
        let current = self.current_overall();
        let (next, following) = draft_math::next_two_user_picks(current, slot, teams);
        let user_on_clock = next == current;
        let horizon_pick = if user_on_clock { following } else { next };
        DraftHorizon {
            current_overall: current,
            current_round: draft_math::round_of(current, teams),
            user_on_clock,
            horizon_pick,
            horizon_round: draft_math::round_of(horizon_pick, teams),
        }
    }

    /// The user's roster, rebuilt from picks tagged as theirs
    pub fn user_roster(&self) -> RosterCounts {
        RosterCounts::from_picks(self.picks.iter().filter(|p| p.drafted_by == DraftedBy::Me))
    }

    /// Every slot's roster, keyed by draft slot, rebuilt from the snake order
    pub fn rosters_by_slot(&self) -> BTreeMap<u32, RosterCounts> {
        let teams = self.league.teams;
        let mut rosters: BTreeMap<u32, RosterCounts> =
            (1..=teams).map(|slot| (slot, RosterCounts::default())).collect();
        for pick in &self.picks {
            if pick.overall == 0 {
                warn!("Ignoring pick of {} with overall number 0", pick.player.name);
                continue;
            }
            let (_, column) = draft_math::overall_pick_to_round_and_column(pick.overall, teams);
            if let Some(roster) = rosters.get_mut(&column) {
                roster.add(pick.position);
            }
        }
        rosters
    }

    /// Draft a player off the board at the current pick
    pub fn draft(&self, name: &str, drafted_by: DraftedBy) -> Result<Self, DraftError> {
        let index = self
            .remaining
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| DraftError::PlayerNotFound(name.to_string()))?;

        let teams = self.league.teams;
        let overall = self.current_overall();
        let mut next = self.clone();
        let player = next.remaining.remove(index);
        debug!("Pick {}: {} ({:?})", draft_math::format_pick(overall, teams), player.name, drafted_by);

        next.picks.push(DraftedPick {
            position: player.position,
            player,
            round: draft_math::round_of(overall, teams),
            pick_in_round: draft_math::pick_in_round(overall, teams),
            overall,
            drafted_by,
            timestamp: Some(Utc::now()),
        });
        Ok(next)
    }

    /// Revert the most recent pick and return the player to the board
    pub fn undo(&self) -> Result<Self, DraftError> {
        let mut next = self.clone();
        let last = next.picks.pop().ok_or(DraftError::NothingToUndo)?;
        debug!("Undo pick {}: {}", last.overall, last.player.name);
        next.remaining.push(last.player);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Position;

    fn pool() -> Vec<Player> {
        (1..=30)
            .map(|i| {
                let pos = match i % 3 {
                    0 => Position::RB,
                    1 => Position::WR,
                    _ => Position::QB,
                };
                let mut p = Player::new(format!("P{i}"), Some(pos));
                p.blend_rank = Some(i as f64);
                p
            })
            .collect()
    }

    fn ctx() -> DraftContext {
        DraftContext::new(pool(), LeagueConfig::default(), Weights::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_weights() {
        let weights = Weights { value: -1.0, ..Default::default() };
        assert!(DraftContext::new(pool(), LeagueConfig::default(), weights).is_err());
    }

    #[test]
    fn test_draft_and_undo_round_trip() {
        let start = ctx();
        let after = start.draft("P3", DraftedBy::Opponent).unwrap();
        assert_eq!(after.remaining.len(), 29);
        assert_eq!(after.picks.len(), 1);
        assert_eq!(after.picks[0].overall, 1);
        assert_eq!(after.picks[0].position, Some(Position::RB));
        assert_eq!(after.current_overall(), 2);

        let undone = after.undo().unwrap();
        assert_eq!(undone.picks.len(), 0);
        assert_eq!(undone.remaining.len(), 30);
        assert!(undone.remaining.iter().any(|p| p.name == "P3"));
    }

    #[test]
    fn test_draft_errors() {
        let start = ctx();
        assert_eq!(
            start.draft("Nobody", DraftedBy::Me).unwrap_err(),
            DraftError::PlayerNotFound("Nobody".to_string())
        );
        assert_eq!(start.undo().unwrap_err(), DraftError::NothingToUndo);
    }

    #[test]
    fn test_horizon_before_and_on_clock() {
        let mut c = ctx();
        let h = c.horizon();
        assert_eq!(h.current_overall, 1);
        assert!(!h.user_on_clock);
        assert_eq!(h.horizon_pick, 7);
        assert_eq!(h.intervening_picks(), 1..7);

        for i in 1..=6 {
            c = c.draft(&format!("P{i}"), DraftedBy::Opponent).unwrap();
        }
        let h = c.horizon();
        assert!(h.user_on_clock);
        assert_eq!(h.current_overall, 7);
        assert_eq!(h.horizon_pick, 14);
        assert_eq!(h.intervening_picks(), 8..14);
    }

    #[test]
    fn test_back_to_back_turn_has_no_intervening_picks() {
        let league = LeagueConfig { slot: 10, ..Default::default() };
        let mut c = DraftContext::new(pool(), league, Weights::default()).unwrap();
        for i in 1..=9 {
            c = c.draft(&format!("P{i}"), DraftedBy::Opponent).unwrap();
        }
        let h = c.horizon();
        assert!(h.user_on_clock);
        assert_eq!(h.horizon_pick, 11);
        assert!(h.intervening_picks().is_empty());
    }

    #[test]
    fn test_rosters_by_slot_follow_snake_order() {
        let mut c = ctx();
        // Picks 1..=11: pick 10 and 11 both belong to slot 10
        for i in 1..=11 {
            let by = if i == 7 { DraftedBy::Me } else { DraftedBy::Opponent };
            c = c.draft(&format!("P{i}"), by).unwrap();
        }
        let rosters = c.rosters_by_slot();
        assert_eq!(rosters[&10].total, 2);
        assert_eq!(rosters[&1].total, 1);
        assert_eq!(rosters[&7].total, 1);
        assert_eq!(c.user_roster().total, 1);
        assert_eq!(c.user_roster().wr, 1); // P7: 7 % 3 == 1
    }
}
