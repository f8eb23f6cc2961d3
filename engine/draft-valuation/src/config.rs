//! Configuration for the valuation engine
//!
//! League settings describe the draft being run. Everything else is a tuning
//! parameter: the constants that shape tiering, urgency, availability and the
//! opponent model are heuristics, so they live here with sane defaults instead
//! of being baked into the algorithms.

use crate::error::ConfigError;
use crate::types::{Position, ScoringFormat, Weights};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Default number of memoized pool-signal entries
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// League-level draft settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueConfig {
    /// Number of drafting teams
    pub teams: u32,

    /// The user's draft slot (1-based)
    pub slot: u32,

    /// Scoring format
    pub scoring: ScoringFormat,

    /// Number of RB/WR flex starters
    pub flex_count: u32,

    /// Dedicated starter slots per position
    pub starters: StarterRequirements,
}

/// Dedicated starter slots per position (flex slots excluded)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarterRequirements {
    pub qb: u32,
    pub rb: u32,
    pub wr: u32,
    pub te: u32,
    pub k: u32,
    pub def: u32,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            teams: 10,
            slot: 7,
            scoring: ScoringFormat::Ppr,
            flex_count: 2,
            starters: StarterRequirements::default(),
        }
    }
}

impl Default for StarterRequirements {
    fn default() -> Self {
        Self { qb: 1, rb: 2, wr: 2, te: 1, k: 1, def: 1 }
    }
}

impl StarterRequirements {
    pub fn required(&self, position: Position) -> u32 {
        match position {
            Position::QB => self.qb,
            Position::RB => self.rb,
            Position::WR => self.wr,
            Position::TE => self.te,
            Position::K => self.k,
            Position::DEF => self.def,
        }
    }
}

impl LeagueConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.teams < 2 {
            return Err(ConfigError::TooFewTeams { teams: self.teams });
        }
        if self.slot == 0 || self.slot > self.teams {
            return Err(ConfigError::SlotOutOfRange { slot: self.slot, teams: self.teams });
        }
        Ok(())
    }

    /// Starter slots outside K/DEF, including flex
    pub fn core_starters(&self) -> u32 {
        let s = &self.starters;
        s.qb + s.rb + s.wr + s.te + self.flex_count
    }
}

/// How raw source ranks are blended into `blend_rank`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    pub source_a_weight: f64,
    pub source_b_weight: f64,
    /// Third-source weight; zero keeps source C out of the blend
    pub source_c_weight: f64,
    /// Multiplier when only one of the two primary signals exists
    pub single_signal_penalty: f64,
    /// Multiplier when only the third source exists
    pub third_source_penalty: f64,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            source_a_weight: 0.6,
            source_b_weight: 0.4,
            source_c_weight: 0.0,
            single_signal_penalty: 1.2,
            third_source_penalty: 1.25,
        }
    }
}

/// Tier Builder parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    /// Minimum untiered players at a position before k-means is used
    pub kmeans_min_players: usize,
    pub k_min: usize,
    pub k_max: usize,
    /// k is further bounded by `n / min_points_per_cluster`
    pub min_points_per_cluster: usize,
    pub max_iterations: usize,
    pub convergence_epsilon: f64,
    /// Minimum players for the quantile fallback; below this everyone is tier 1
    pub quantile_min_players: usize,
    pub quantile_buckets: usize,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            kmeans_min_players: 12,
            k_min: 4,
            k_max: 7,
            min_points_per_cluster: 3,
            max_iterations: 100,
            convergence_epsilon: 1e-3,
            quantile_min_players: 5,
            quantile_buckets: 5,
        }
    }
}

/// Tier-cliff urgency threshold parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierUrgencyConfig {
    /// Percentile of a position's inter-tier gaps used as the cliff threshold
    pub gap_percentile: f64,
    pub early_scale: f64,
    /// Last round that uses `early_scale`
    pub early_rounds: u32,
    pub late_scale: f64,
    /// First round that uses `late_scale`
    pub late_round: u32,
    /// Threshold for positions with no observed inter-tier gap
    pub fallback_threshold: f64,
}

impl Default for TierUrgencyConfig {
    fn default() -> Self {
        Self {
            gap_percentile: 0.75,
            early_scale: 0.8,
            early_rounds: 3,
            late_scale: 1.25,
            late_round: 10,
            fallback_threshold: 8.0,
        }
    }
}

impl TierUrgencyConfig {
    /// Threshold multiplier for a round, linear between the early and late plateaus
    pub fn phase_scale(&self, round: u32) -> f64 {
        if round <= self.early_rounds {
            return self.early_scale;
        }
        if round >= self.late_round {
            return self.late_scale;
        }
        let span = (self.late_round - self.early_rounds) as f64;
        let t = (round - self.early_rounds) as f64 / span;
        self.early_scale + t * (self.late_scale - self.early_scale)
    }
}

/// Availability risk parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailabilityConfig {
    /// Logistic sensitivity in round 1, in picks
    pub base_sensitivity: f64,
    /// Added sensitivity per completed round
    pub sensitivity_per_round: f64,
    /// League size the third-source target rounds are expressed for
    pub target_round_teams: u32,
    /// Risk added when the horizon reaches a player's target round
    pub target_window_bias: f64,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            base_sensitivity: 6.0,
            sensitivity_per_round: 0.25,
            target_round_teams: 12,
            target_window_bias: 0.10,
        }
    }
}

impl AvailabilityConfig {
    pub fn sensitivity(&self, round: u32) -> f64 {
        self.base_sensitivity + self.sensitivity_per_round * round.saturating_sub(1) as f64
    }
}

/// Roster need parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedConfig {
    /// Share of the remaining need gap that flex pressure can fill for RB/WR
    pub flex_blend: f64,
    /// Multiplier applied to K/DEF need while the core roster is still open
    pub late_position_suppression: f64,
    /// K/DEF suppression lifts once at most this many core slots are open
    pub late_position_open_slots: u32,
    /// Additive RB/WR need during a drafter's first picks
    pub early_flex_boost: f64,
    pub early_flex_picks: u32,
}

impl Default for NeedConfig {
    fn default() -> Self {
        Self {
            flex_blend: 0.6,
            late_position_suppression: 0.25,
            late_position_open_slots: 1,
            early_flex_boost: 0.10,
            early_flex_picks: 4,
        }
    }
}

/// Opponent pick model parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentConfig {
    /// Softmax temperature; low values concentrate mass on the top candidates
    pub temperature: f64,
    /// Candidate window half-width around the current pick, in picks
    pub base_window: f64,
    /// Relative window growth per round
    pub window_growth_per_round: f64,
    pub min_candidates: usize,
    pub market_weight: f64,
    pub tier_weight: f64,
    pub scarcity_weight: f64,
    pub need_weight: f64,
    pub overdue_weight: f64,
    /// Extra relative overdue weight in round 1, fading out by `overdue_boost_rounds`
    pub overdue_early_boost: f64,
    pub overdue_boost_rounds: u32,
    /// Logistic scale of the overdue signal, in picks
    pub overdue_scale: f64,
    /// Strength of the early RB/WR-over-QB/K/DEF prior in round 1
    pub prior_strength: f64,
    pub prior_fade_rounds: u32,
    pub ppr_bonus: f64,
    pub flex_bonus: f64,
    pub rookie_bonus: f64,
    /// Candidate count at which scoring fans out across the rayon pool
    pub parallel_threshold: usize,
}

impl Default for OpponentConfig {
    fn default() -> Self {
        Self {
            temperature: 0.15,
            base_window: 6.0,
            window_growth_per_round: 0.15,
            min_candidates: 8,
            market_weight: 0.10,
            tier_weight: 0.10,
            scarcity_weight: 0.10,
            need_weight: 0.20,
            overdue_weight: 0.45,
            overdue_early_boost: 0.5,
            overdue_boost_rounds: 8,
            overdue_scale: 4.0,
            prior_strength: 0.20,
            prior_fade_rounds: 6,
            ppr_bonus: 0.03,
            flex_bonus: 0.02,
            rookie_bonus: 0.02,
            parallel_threshold: 64,
        }
    }
}

impl OpponentConfig {
    pub fn window(&self, round: u32) -> f64 {
        self.base_window * (1.0 + self.window_growth_per_round * round.saturating_sub(1) as f64)
    }

    pub fn overdue_weight_for(&self, round: u32) -> f64 {
        let fade = fade_factor(round, self.overdue_boost_rounds);
        self.overdue_weight * (1.0 + self.overdue_early_boost * fade)
    }

    pub fn prior_strength_for(&self, round: u32) -> f64 {
        self.prior_strength * fade_factor(round, self.prior_fade_rounds)
    }
}

/// 1.0 in round 1, falling linearly to 0.0 at `fade_rounds`
fn fade_factor(round: u32, fade_rounds: u32) -> f64 {
    if fade_rounds <= 1 {
        return if round <= 1 { 1.0 } else { 0.0 };
    }
    let progressed = round.saturating_sub(1) as f64 / (fade_rounds - 1) as f64;
    (1.0 - progressed).max(0.0)
}

/// Score Aggregator parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Market value z-scores are clipped to +/- this many standard deviations
    pub z_clip: f64,
    /// Number of top PPS values averaged into a position's PVI
    pub pvi_depth: usize,
    pub ppr_bonus: f64,
    pub half_ppr_bonus: f64,
    pub flex_bonus: f64,
    pub rookie_bonus: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            z_clip: 2.0,
            pvi_depth: 6,
            ppr_bonus: 0.03,
            half_ppr_bonus: 0.015,
            flex_bonus: 0.02,
            rookie_bonus: 0.02,
        }
    }
}

/// Memoization settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_CACHE_CAPACITY }
    }
}

/// All tuning parameters of the engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub blend: BlendConfig,
    pub tiers: TierConfig,
    pub urgency: TierUrgencyConfig,
    pub availability: AvailabilityConfig,
    pub needs: NeedConfig,
    pub opponent: OpponentConfig,
    pub scoring: ScoringConfig,
    pub cache: CacheConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(t) = env_parse::<f64>("DRAFT_SIM_TEMPERATURE") {
            config.opponent.temperature = t;
        }

        if let Some(s) = env_parse::<f64>("DRAFT_AVAIL_SENSITIVITY") {
            config.availability.base_sensitivity = s;
        }

        if let Some(capacity) = env_parse::<usize>("DRAFT_CACHE_CAPACITY") {
            config.cache.capacity = capacity;
        }

        if let Some(threshold) = env_parse::<usize>("DRAFT_PARALLEL_THRESHOLD") {
            config.opponent.parallel_threshold = threshold;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tiers;
        if t.k_min < 2 || t.k_min > t.k_max {
            return Err(invalid("tiers.k_min", format!("need 2 <= k_min <= k_max, got {}..={}", t.k_min, t.k_max)));
        }
        if t.min_points_per_cluster == 0 {
            return Err(invalid("tiers.min_points_per_cluster", "must be positive".into()));
        }
        if t.quantile_buckets == 0 {
            return Err(invalid("tiers.quantile_buckets", "must be positive".into()));
        }
        if t.max_iterations == 0 {
            return Err(invalid("tiers.max_iterations", "must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.urgency.gap_percentile) {
            return Err(invalid("urgency.gap_percentile", "must lie in [0, 1]".into()));
        }
        if self.urgency.late_round <= self.urgency.early_rounds {
            return Err(invalid("urgency.late_round", "must come after early_rounds".into()));
        }
        if self.availability.base_sensitivity <= 0.0 {
            return Err(invalid("availability.base_sensitivity", "must be positive".into()));
        }
        if self.availability.target_round_teams == 0 {
            return Err(invalid("availability.target_round_teams", "must be positive".into()));
        }
        if self.opponent.temperature.is_nan() || self.opponent.temperature <= 0.0 {
            return Err(invalid("opponent.temperature", "must be positive".into()));
        }
        if self.opponent.overdue_scale <= 0.0 {
            return Err(invalid("opponent.overdue_scale", "must be positive".into()));
        }
        if self.opponent.min_candidates == 0 {
            return Err(invalid("opponent.min_candidates", "must be positive".into()));
        }
        if self.scoring.z_clip <= 0.0 {
            return Err(invalid("scoring.z_clip", "must be positive".into()));
        }
        if self.scoring.pvi_depth == 0 {
            return Err(invalid("scoring.pvi_depth", "must be positive".into()));
        }
        if self.cache.capacity == 0 {
            return Err(invalid("cache.capacity", "must be positive".into()));
        }
        Ok(())
    }
}

/// Validate a weight vector, naming the first bad coefficient
pub fn validate_weights(weights: &Weights) -> Result<(), ConfigError> {
    let named = [
        ("value", weights.value),
        ("tier", weights.tier),
        ("need", weights.need),
        ("scarcity", weights.scarcity),
        ("availability", weights.availability),
    ];
    for (name, value) in named {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidWeight { name, value });
        }
    }
    Ok(())
}

fn invalid(name: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidParameter { name, reason }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring unparseable {}={}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(LeagueConfig::default().validate().is_ok());
    }

    #[test]
    fn test_league_validation() {
        let league = LeagueConfig { slot: 11, ..Default::default() };
        assert!(matches!(league.validate(), Err(ConfigError::SlotOutOfRange { slot: 11, teams: 10 })));

        let league = LeagueConfig { teams: 1, slot: 1, ..Default::default() };
        assert!(matches!(league.validate(), Err(ConfigError::TooFewTeams { teams: 1 })));

        let league = LeagueConfig { slot: 0, ..Default::default() };
        assert!(league.validate().is_err());
    }

    #[test]
    fn test_core_starters() {
        assert_eq!(LeagueConfig::default().core_starters(), 8);
    }

    #[test]
    fn test_phase_scale_plateaus_and_interpolation() {
        let cfg = TierUrgencyConfig::default();
        assert_eq!(cfg.phase_scale(1), 0.8);
        assert_eq!(cfg.phase_scale(3), 0.8);
        assert_eq!(cfg.phase_scale(10), 1.25);
        assert_eq!(cfg.phase_scale(15), 1.25);
        let mid = cfg.phase_scale(6);
        assert!(mid > 0.8 && mid < 1.25);
        assert!(cfg.phase_scale(7) > mid);
    }

    #[test]
    fn test_sensitivity_grows_with_round() {
        let cfg = AvailabilityConfig::default();
        assert_eq!(cfg.sensitivity(1), 6.0);
        assert!(cfg.sensitivity(8) > cfg.sensitivity(2));
    }

    #[test]
    fn test_opponent_fades() {
        let cfg = OpponentConfig::default();
        assert!((cfg.overdue_weight_for(1) - 0.675).abs() < 1e-12);
        assert!((cfg.overdue_weight_for(8) - 0.45).abs() < 1e-12);
        assert!((cfg.prior_strength_for(1) - 0.20).abs() < 1e-12);
        assert_eq!(cfg.prior_strength_for(6), 0.0);
        assert_eq!(cfg.prior_strength_for(12), 0.0);
        assert!(cfg.window(5) > cfg.window(1));
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.opponent.temperature = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidParameter { name: "opponent.temperature", .. })
        ));

        let mut cfg = EngineConfig::default();
        cfg.tiers.k_min = 8;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.cache.capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_weights() {
        assert!(validate_weights(&Weights::default()).is_ok());
        let w = Weights { scarcity: f64::NAN, ..Default::default() };
        assert!(matches!(
            validate_weights(&w),
            Err(ConfigError::InvalidWeight { name: "scarcity", .. })
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");

        let mut config = EngineConfig::default();
        config.opponent.temperature = 0.3;
        config.cache.capacity = 16;
        config.to_file(&path).unwrap();

        let loaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[cache]\ncapacity = 4\n").unwrap();

        let loaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(loaded.cache.capacity, 4);
        assert_eq!(loaded.opponent, OpponentConfig::default());
    }
}
