//! Core draft records shared by every stage of the valuation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Fantasy football roster position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    DEF,
}

impl Position {
    /// Every draftable position, in display order
    pub const ALL: [Position; 6] =
        [Position::QB, Position::RB, Position::WR, Position::TE, Position::K, Position::DEF];

    /// Parse a source position label. Unknown or empty labels yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "QB" => Some(Position::QB),
            "RB" => Some(Position::RB),
            "WR" => Some(Position::WR),
            "TE" => Some(Position::TE),
            "K" | "PK" => Some(Position::K),
            "DEF" | "DST" | "D/ST" => Some(Position::DEF),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::K => "K",
            Position::DEF => "DEF",
        }
    }

    /// Positions that can fill the shared RB/WR flex slot
    pub fn is_flex_eligible(&self) -> bool {
        matches!(self, Position::RB | Position::WR)
    }

    /// Single-slot positions that drafters leave until the end
    pub fn is_late_priority(&self) -> bool {
        matches!(self, Position::K | Position::DEF)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deserialize a free-form position label, mapping anything unrecognized to `None`
fn lenient_position<'de, D>(deserializer: D) -> Result<Option<Position>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Position::parse))
}

/// League scoring format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoringFormat {
    Standard,
    HalfPpr,
    #[default]
    Ppr,
}

/// One draftable player with its rank signals and derived fields.
///
/// Source A and B are the two primary ADP-style feeds; source C is an optional
/// third feed that may also carry an authoritative tier and a target round
/// (expressed for a 12-team league).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_position")]
    pub position: Option<Position>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub bye: Option<u32>,
    #[serde(default)]
    pub is_rookie: bool,
    #[serde(default)]
    pub source_a_rank: Option<f64>,
    #[serde(default)]
    pub source_b_rank: Option<f64>,
    #[serde(default)]
    pub source_c_rank: Option<f64>,
    #[serde(default)]
    pub source_c_tier: Option<u32>,
    #[serde(default)]
    pub source_c_target_round: Option<f64>,
    /// Source B minus source A; positive means the market undervalues the player
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub blend_rank: Option<f64>,
    /// Tier within the player's position (1 = elite)
    #[serde(default)]
    pub tier: Option<u32>,
}

impl Player {
    pub fn new(name: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            name: name.into(),
            position,
            team: None,
            bye: None,
            is_rookie: false,
            source_a_rank: None,
            source_b_rank: None,
            source_c_rank: None,
            source_c_tier: None,
            source_c_target_round: None,
            value: None,
            blend_rank: None,
            tier: None,
        }
    }

    /// Best available estimate of where the market drafts this player.
    ///
    /// Source B is the draft-room ADP feed; the others are fallbacks in order
    /// of how closely they track live drafts.
    pub fn adp_estimate(&self) -> Option<f64> {
        self.source_b_rank.or(self.source_a_rank).or(self.source_c_rank).or(self.blend_rank)
    }

    /// Rank used to order players when nothing better is known
    pub fn sort_rank(&self) -> f64 {
        self.blend_rank.or_else(|| self.adp_estimate()).unwrap_or(f64::MAX)
    }
}

/// Drafted player counts by position for one drafter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RosterCounts {
    pub qb: u32,
    pub rb: u32,
    pub wr: u32,
    pub te: u32,
    pub k: u32,
    pub def: u32,
    pub total: u32,
}

impl RosterCounts {
    pub fn count(&self, position: Position) -> u32 {
        match position {
            Position::QB => self.qb,
            Position::RB => self.rb,
            Position::WR => self.wr,
            Position::TE => self.te,
            Position::K => self.k,
            Position::DEF => self.def,
        }
    }

    fn slot_mut(&mut self, position: Position) -> &mut u32 {
        match position {
            Position::QB => &mut self.qb,
            Position::RB => &mut self.rb,
            Position::WR => &mut self.wr,
            Position::TE => &mut self.te,
            Position::K => &mut self.k,
            Position::DEF => &mut self.def,
        }
    }

    /// Record a drafted player. Players without a known position still count toward the total.
    pub fn add(&mut self, position: Option<Position>) {
        if let Some(pos) = position {
            *self.slot_mut(pos) += 1;
        }
        self.total += 1;
    }

    /// Revert a drafted player; counts saturate at zero
    pub fn remove(&mut self, position: Option<Position>) {
        if let Some(pos) = position {
            let slot = self.slot_mut(pos);
            *slot = slot.saturating_sub(1);
        }
        self.total = self.total.saturating_sub(1);
    }

    pub fn from_picks<'a>(picks: impl IntoIterator<Item = &'a DraftedPick>) -> Self {
        let mut counts = Self::default();
        for pick in picks {
            counts.add(pick.position);
        }
        counts
    }
}

/// Coefficients of the linear Player Priority Score. Not constrained to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub value: f64,
    pub tier: f64,
    pub need: f64,
    pub scarcity: f64,
    pub availability: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self { value: 0.30, tier: 0.25, need: 0.20, scarcity: 0.15, availability: 0.10 }
    }
}

impl Weights {
    pub fn is_valid(&self) -> bool {
        [self.value, self.tier, self.need, self.scarcity, self.availability]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Who made a pick, from the user's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftedBy {
    Me,
    Opponent,
}

/// Immutable record of one completed pick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftedPick {
    /// Full record as it stood in the pool, so an undo can restore it
    pub player: Player,
    pub round: u32,
    pub pick_in_round: u32,
    pub overall: u32,
    pub drafted_by: DraftedBy,
    pub position: Option<Position>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}
