//! Recompute pipeline tying the four valuation stages together

use crate::availability::{self, Availability, ScarcityMetric};
use crate::blend;
use crate::cache::ValuationCache;
use crate::config::EngineConfig;
use crate::context::{DraftContext, DraftHorizon};
use crate::error::ConfigError;
use crate::needs;
use crate::opponent::{self, SimulationInputs};
use crate::scoring::{self, PpsInputs};
use crate::tiers::{self, TierMetrics};
use crate::types::{Player, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Everything a caller needs to render recommendations after one draft event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    /// Player Priority Score per player name
    pub pps: BTreeMap<String, f64>,
    /// Positional Value Index
    pub pvi: BTreeMap<Position, f64>,
    /// The user's raw need per position
    pub roster_needs: BTreeMap<Position, f64>,
    pub flex_pressure: f64,
    pub scarcity: BTreeMap<Position, ScarcityMetric>,
    pub tier_urgency: BTreeMap<String, f64>,
    pub availability: BTreeMap<String, Availability>,
    pub talent: BTreeMap<String, f64>,
    /// Remaining pool with blended ranks and tiers filled in
    pub players: Vec<Player>,
    pub tier_metrics: TierMetrics,
    pub horizon: DraftHorizon,
}

impl EngineOutput {
    fn empty(horizon: DraftHorizon) -> Self {
        Self {
            pps: BTreeMap::new(),
            pvi: BTreeMap::new(),
            roster_needs: BTreeMap::new(),
            flex_pressure: 0.0,
            scarcity: BTreeMap::new(),
            tier_urgency: BTreeMap::new(),
            availability: BTreeMap::new(),
            talent: BTreeMap::new(),
            players: Vec::new(),
            tier_metrics: TierMetrics::default(),
            horizon,
        }
    }

    /// The `n` best players by PPS; ties go to the better blend rank, then name
    pub fn top(&self, n: usize) -> Vec<(&Player, f64)> {
        let mut ranked: Vec<(&Player, f64)> = self
            .players
            .iter()
            .map(|p| (p, self.pps.get(&p.name).copied().unwrap_or(0.0)))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| a.0.sort_rank().total_cmp(&b.0.sort_rank()))
                .then_with(|| a.0.name.cmp(&b.0.name))
        });
        ranked.truncate(n);
        ranked
    }
}

/// Owns the tuning configuration and the pool-signal cache across picks
#[derive(Debug)]
pub struct ValuationEngine {
    config: EngineConfig,
    cache: ValuationCache,
}

impl ValuationEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let cache = ValuationCache::new(config.cache.capacity);
        Ok(Self { config, cache })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ValuationCache {
        &self.cache
    }

    pub fn recompute(&mut self, ctx: &DraftContext) -> EngineOutput {
        recompute_with_cache(ctx, &self.config, &mut self.cache)
    }
}

/// One-shot recompute without memoization across calls
pub fn recompute(ctx: &DraftContext, config: &EngineConfig) -> EngineOutput {
    let mut cache = ValuationCache::new(1);
    recompute_with_cache(ctx, config, &mut cache)
}

/// Min-max normalize `values` over the positions present in the pool
fn normalize_positions(values: &BTreeMap<Position, f64>, present: &[Position]) -> BTreeMap<Position, f64> {
    let raw: Vec<f64> = present.iter().map(|p| values.get(p).copied().unwrap_or(0.0)).collect();
    present.iter().copied().zip(scoring::min_max_normalize(&raw)).collect()
}

/// Min-max normalize risk over positioned players; the rest stay neutral
fn normalize_positioned_risk(players: &[Player], risks: &[(f64, bool)]) -> Vec<f64> {
    let positioned: Vec<usize> = (0..players.len()).filter(|&i| players[i].position.is_some()).collect();
    let raw: Vec<f64> = positioned.iter().map(|&i| risks[i].0).collect();
    let mut normalized = vec![scoring::NEUTRAL; players.len()];
    for (&i, value) in positioned.iter().zip(scoring::min_max_normalize(&raw)) {
        normalized[i] = value;
    }
    normalized
}

/// Full recompute against a caller-owned cache
pub fn recompute_with_cache(ctx: &DraftContext, config: &EngineConfig, cache: &mut ValuationCache) -> EngineOutput {
    let horizon = ctx.horizon();
    if ctx.remaining.is_empty() {
        return EngineOutput::empty(horizon);
    }

    // Blend and tier
    let mut players = ctx.remaining.clone();
    blend::derive_all(&mut players, &config.blend);
    tiers::build_tiers(&mut players, &config.tiers);
    let tier_metrics = TierMetrics::from_players(&players);

    let signals = cache.signals_for(&players, &config.scoring);
    let thresholds = scoring::tier_drop_thresholds(&tier_metrics, horizon.current_round, &config.urgency);
    let urgency: Vec<f64> =
        players.iter().map(|p| scoring::tier_urgency(p, &tier_metrics, &thresholds)).collect();

    // Need, scarcity, single-drafter availability
    let user_needs = needs::roster_needs(&ctx.user_roster(), &ctx.league, &config.needs);
    let scarcity = availability::positional_scarcity(&players, &horizon);
    let risks: Vec<(f64, bool)> = players
        .iter()
        .map(|p| match p.position {
            Some(_) => availability::availability_risk(p, &horizon, ctx.league.teams, &config.availability),
            None => (scoring::NEUTRAL, false),
        })
        .collect();

    // Opponent simulation up to the horizon pick
    let scarcity_urgency: BTreeMap<Position, f64> = scarcity.iter().map(|(pos, m)| (*pos, m.urgency)).collect();
    let inputs = SimulationInputs {
        players: &players,
        market: &signals.market,
        tier_urgency: &urgency,
        scarcity: &scarcity,
    };
    let forecast = opponent::simulate(
        &inputs,
        &ctx.league,
        &ctx.rosters_by_slot(),
        horizon.intervening_picks(),
        config,
    );

    // Normalize across the current pool before aggregating
    let mut present: Vec<Position> = players.iter().filter_map(|p| p.position).collect();
    present.sort();
    present.dedup();
    let need_norm = normalize_positions(&user_needs.needs, &present);
    let scarcity_norm = normalize_positions(&scarcity_urgency, &present);
    let risk_norm = normalize_positioned_risk(&players, &risks);

    let pps = scoring::player_priority_scores(
        &players,
        &PpsInputs {
            market: &signals.market,
            tier_urgency: &urgency,
            availability: &risk_norm,
            need: &need_norm,
            scarcity: &scarcity_norm,
        },
        &ctx.weights,
        ctx.league.scoring,
        &config.scoring,
    );
    let pvi = scoring::positional_value_index(&players, &pps, &config.scoring);

    debug!(
        "Recomputed {} players at pick {} (horizon {}, {} simulated picks)",
        players.len(),
        horizon.current_overall,
        horizon.horizon_pick,
        forecast.picks_simulated
    );

    let by_name = |values: &[f64]| -> BTreeMap<String, f64> {
        players.iter().zip(values).map(|(p, v)| (p.name.clone(), *v)).collect()
    };
    let availability = players
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let (risk, take_now) = risks[i];
            let make_it_back = p.position.map(|_| forecast.survival[i]);
            (p.name.clone(), Availability { risk, take_now, make_it_back })
        })
        .collect();

    EngineOutput {
        pps: by_name(&pps),
        pvi,
        roster_needs: user_needs.needs,
        flex_pressure: user_needs.flex_pressure,
        scarcity,
        tier_urgency: by_name(&urgency),
        availability,
        talent: by_name(&signals.talent),
        tier_metrics,
        horizon,
        players,
    }
}
