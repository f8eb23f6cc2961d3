//! Roster need per position for a single drafter

use crate::config::{LeagueConfig, NeedConfig};
use crate::types::{Position, RosterCounts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Need vector for one drafter, each entry in [0, 1]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterNeeds {
    pub needs: BTreeMap<Position, f64>,
    /// Share of the RB/WR flex slots not yet covered by surplus RB/WR picks
    pub flex_pressure: f64,
}

impl RosterNeeds {
    pub fn need(&self, position: Position) -> f64 {
        self.needs.get(&position).copied().unwrap_or(0.0)
    }
}

/// Flex slots that surplus RB/WR picks have not covered, as a fraction
pub fn flex_pressure(roster: &RosterCounts, league: &LeagueConfig) -> f64 {
    if league.flex_count == 0 {
        return 0.0;
    }
    let open = open_flex_slots(roster, league);
    (open as f64 / league.flex_count as f64).clamp(0.0, 1.0)
}

fn open_flex_slots(roster: &RosterCounts, league: &LeagueConfig) -> u32 {
    let surplus = roster.rb.saturating_sub(league.starters.rb) + roster.wr.saturating_sub(league.starters.wr);
    league.flex_count.saturating_sub(surplus)
}

/// Core starter slots (QB/RB/WR/TE/flex) still unfilled
pub fn open_core_slots(roster: &RosterCounts, league: &LeagueConfig) -> u32 {
    let s = &league.starters;
    [
        (Position::QB, s.qb),
        (Position::RB, s.rb),
        (Position::WR, s.wr),
        (Position::TE, s.te),
    ]
    .iter()
    .map(|&(pos, req)| req.saturating_sub(roster.count(pos)))
    .sum::<u32>()
        + open_flex_slots(roster, league)
}

/// Need per position from starter deficits, flex pressure and draft phase.
///
/// A position with nobody drafted against a non-zero requirement has need
/// 1.0; need falls linearly as the position fills. RB/WR absorb a blended
/// share of the flex deficit. K/DEF are held down while the core roster is
/// still open, and RB/WR get a small lift during the drafter's first picks.
pub fn roster_needs(roster: &RosterCounts, league: &LeagueConfig, cfg: &NeedConfig) -> RosterNeeds {
    let pressure = flex_pressure(roster, league);
    let open_core = open_core_slots(roster, league);
    let early = roster.total < cfg.early_flex_picks;

    let needs = Position::ALL
        .iter()
        .map(|&pos| {
            let required = league.starters.required(pos);
            let base = if required == 0 {
                0.0
            } else {
                (1.0 - roster.count(pos) as f64 / required as f64).max(0.0)
            };

            let mut need = base;
            if pos.is_flex_eligible() {
                need += (1.0 - base) * cfg.flex_blend * pressure;
                if early {
                    need += cfg.early_flex_boost;
                }
            }
            if pos.is_late_priority() && open_core > cfg.late_position_open_slots {
                need *= cfg.late_position_suppression;
            }
            (pos, need.clamp(0.0, 1.0))
        })
        .collect();

    RosterNeeds { needs, flex_pressure: pressure }
}
