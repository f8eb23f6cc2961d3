//! Opponent Pick Simulator
//!
//! Walks the overall picks other drafters make before the user's horizon
//! pick. At each one the drafter's roster need is rebuilt from pick history,
//! a candidate pool is scored, and a softmax turns the scores into pick
//! probabilities. Every candidate's running survival is multiplied by
//! `1 - P(picked)`.
//!
//! This treats picks as independent events: a player's chance of going at
//! one pick does not remove them from later pools, and simulated picks do
//! not update simulated rosters. The result is a ranking-quality
//! approximation of make-it-back odds, not a joint probability over pick
//! sequences.

use crate::availability::{logistic, ScarcityMetric};
use crate::config::{EngineConfig, LeagueConfig, OpponentConfig};
use crate::draft_math;
use crate::needs::{roster_needs, RosterNeeds};
use crate::types::{Player, Position, RosterCounts, ScoringFormat};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Per-player signals the simulator scores with, index-aligned with `players`
pub struct SimulationInputs<'a> {
    pub players: &'a [Player],
    pub market: &'a [f64],
    pub tier_urgency: &'a [f64],
    pub scarcity: &'a BTreeMap<Position, ScarcityMetric>,
}

/// Survival odds produced by one simulation pass
#[derive(Debug, Clone, PartialEq)]
pub struct OpponentForecast {
    /// Make-it-back probability, index-aligned with the input players
    pub survival: Vec<f64>,
    pub picks_simulated: usize,
}

/// Temperature-scaled softmax, shifted by the max score for stability
pub fn softmax(scores: &[f64], temperature: f64) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let t = temperature.max(f64::EPSILON);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| ((s - max) / t).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Early-draft lean toward RB/WR and away from QB/K/DEF
fn positional_prior(position: Position) -> f64 {
    match position {
        Position::RB | Position::WR => 1.0,
        Position::TE => 0.0,
        Position::QB | Position::K | Position::DEF => -1.0,
    }
}

fn format_bonus(position: Position, scoring: ScoringFormat, cfg: &OpponentConfig) -> f64 {
    let receiving = matches!(position, Position::WR | Position::TE);
    let ppr = match scoring {
        ScoringFormat::Ppr if receiving => cfg.ppr_bonus,
        ScoringFormat::HalfPpr if receiving => cfg.ppr_bonus / 2.0,
        _ => 0.0,
    };
    let flex = if position.is_flex_eligible() { cfg.flex_bonus } else { 0.0 };
    ppr + flex
}

/// Players the drafter at `overall` plausibly considers.
///
/// Anyone whose ADP is due within the round's window (including overdue
/// players) qualifies; short pools are backfilled by rank.
pub fn candidate_pool(players: &[Player], overall: u32, round: u32, cfg: &OpponentConfig) -> Vec<usize> {
    let reach = overall as f64 + cfg.window(round);
    let mut ranked: Vec<usize> = (0..players.len()).filter(|&i| players[i].position.is_some()).collect();
    ranked.sort_by(|&a, &b| {
        players[a]
            .sort_rank()
            .total_cmp(&players[b].sort_rank())
            .then_with(|| players[a].name.cmp(&players[b].name))
    });

    let (mut pool, rest): (Vec<usize>, Vec<usize>) =
        ranked.into_iter().partition(|&i| players[i].adp_estimate().is_some_and(|adp| adp <= reach));
    if pool.len() < cfg.min_candidates {
        let short = cfg.min_candidates - pool.len();
        pool.extend(rest.into_iter().take(short));
    }
    pool
}

fn score_candidate(
    i: usize,
    overall: u32,
    round: u32,
    inputs: &SimulationInputs<'_>,
    need: &RosterNeeds,
    scoring: ScoringFormat,
    cfg: &OpponentConfig,
) -> f64 {
    let player = &inputs.players[i];
    let Some(position) = player.position else {
        return f64::NEG_INFINITY;
    };

    let scarcity = inputs.scarcity.get(&position).map_or(0.0, |s| s.urgency);
    let overdue = player
        .adp_estimate()
        .map_or(0.0, |adp| logistic((overall as f64 - adp) / cfg.overdue_scale));

    let mut score = cfg.market_weight * inputs.market[i]
        + cfg.tier_weight * inputs.tier_urgency[i]
        + cfg.scarcity_weight * scarcity
        + cfg.need_weight * need.need(position)
        + cfg.overdue_weight_for(round) * overdue
        + cfg.prior_strength_for(round) * positional_prior(position)
        + format_bonus(position, scoring, cfg);
    if player.is_rookie {
        score += cfg.rookie_bonus;
    }
    score
}

/// Run the simulation over explicit overall picks.
///
/// Picks owned by `league.slot` are skipped. Rosters are the current
/// per-slot rosters reconstructed from history.
pub fn simulate_picks(
    inputs: &SimulationInputs<'_>,
    league: &LeagueConfig,
    rosters: &BTreeMap<u32, RosterCounts>,
    picks: impl IntoIterator<Item = u32>,
    cfg: &EngineConfig,
) -> OpponentForecast {
    let opp = &cfg.opponent;
    let mut survival = vec![1.0; inputs.players.len()];
    let mut picks_simulated = 0;
    let empty = RosterCounts::default();

    for overall in picks {
        let (round, column) = draft_math::overall_pick_to_round_and_column(overall, league.teams);
        if column == league.slot {
            warn!("Skipping pick {} owned by the user's slot", overall);
            continue;
        }

        let roster = rosters.get(&column).unwrap_or(&empty);
        let need = roster_needs(roster, league, &cfg.needs);
        let pool = candidate_pool(inputs.players, overall, round, opp);
        if pool.is_empty() {
            break;
        }

        let score = |&i: &usize| score_candidate(i, overall, round, inputs, &need, league.scoring, opp);
        let scores: Vec<f64> = if pool.len() >= opp.parallel_threshold {
            pool.par_iter().map(score).collect()
        } else {
            pool.iter().map(score).collect()
        };

        for (&i, p) in pool.iter().zip(softmax(&scores, opp.temperature)) {
            survival[i] *= 1.0 - p;
        }
        picks_simulated += 1;
    }

    OpponentForecast { survival, picks_simulated }
}

/// Simulate every pick between now and the horizon pick
pub fn simulate(
    inputs: &SimulationInputs<'_>,
    league: &LeagueConfig,
    rosters: &BTreeMap<u32, RosterCounts>,
    intervening: std::ops::Range<u32>,
    cfg: &EngineConfig,
) -> OpponentForecast {
    let forecast = simulate_picks(inputs, league, rosters, intervening.clone(), cfg);
    debug!(
        "Simulated {} opponent picks over {:?} for {} players",
        forecast.picks_simulated,
        intervening,
        inputs.players.len()
    );
    forecast
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: usize) -> Vec<Player> {
        (1..=n)
            .map(|i| {
                let pos = [Position::RB, Position::WR, Position::QB, Position::TE][i % 4];
                let mut p = Player::new(format!("P{i:03}"), Some(pos));
                p.source_b_rank = Some(i as f64);
                p.blend_rank = Some(i as f64);
                p
            })
            .collect()
    }

    fn at(name: &str, position: Position, adp: f64) -> Player {
        let mut p = Player::new(name, Some(position));
        p.source_b_rank = Some(adp);
        p
    }

    fn rosters_of(counts: RosterCounts) -> BTreeMap<u32, RosterCounts> {
        (1..=10).map(|s| (s, counts)).collect()
    }

    fn run_with(
        players: &[Player],
        picks: std::ops::Range<u32>,
        cfg: &EngineConfig,
        rosters: &BTreeMap<u32, RosterCounts>,
    ) -> OpponentForecast {
        let market = vec![0.5; players.len()];
        let tiers = vec![0.0; players.len()];
        let scarcity = BTreeMap::new();
        let inputs = SimulationInputs { players, market: &market, tier_urgency: &tiers, scarcity: &scarcity };
        simulate_picks(&inputs, &LeagueConfig::default(), rosters, picks, cfg)
    }

    fn run(players: &[Player], picks: std::ops::Range<u32>, cfg: &EngineConfig) -> OpponentForecast {
        run_with(players, picks, cfg, &rosters_of(RosterCounts::default()))
    }

    #[test]
    fn test_softmax_sums_to_one_and_sharpens() {
        let p = softmax(&[1.0, 0.5, 0.0], 0.15);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[0] > 0.9);
        let flat = softmax(&[1.0, 0.5, 0.0], 10.0);
        assert!(flat[0] < 0.4);
        assert!(softmax(&[], 0.15).is_empty());
    }

    #[test]
    fn test_candidate_pool_window_and_backfill() {
        let players = pool(60);
        let cfg = OpponentConfig::default();
        let picks = candidate_pool(&players, 1, 1, &cfg);
        // ADP 1..=7 is inside pick 1 + window 6; backfilled to 8
        assert_eq!(picks.len(), 8);
        assert_eq!(players[picks[0]].name, "P001");

        let wide = candidate_pool(&players, 30, 3, &cfg);
        assert!(wide.len() > 30);
    }

    #[test]
    fn test_empty_interval_keeps_everyone() {
        let players = pool(20);
        let forecast = run(&players, 5..5, &EngineConfig::default());
        assert_eq!(forecast.picks_simulated, 0);
        assert!(forecast.survival.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_survival_falls_with_more_picks() {
        let players = pool(40);
        let cfg = EngineConfig::default();
        let short = run(&players, 1..3, &cfg);
        let long = run(&players, 1..7, &cfg);
        for (s, l) in short.survival.iter().zip(&long.survival) {
            assert!(l <= s);
        }
        // Top ADP is the most likely to be gone
        assert!(long.survival[0] < long.survival[30]);
        assert!(long.survival.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_user_slot_is_skipped() {
        let players = pool(20);
        // Pick 7 belongs to slot 7 in a 10-team league
        let forecast = run(&players, 7..8, &EngineConfig::default());
        assert_eq!(forecast.picks_simulated, 0);
    }

    #[test]
    fn test_parallel_scoring_matches_serial() {
        let players = pool(120);
        let serial = run(&players, 30..35, &EngineConfig::default());
        let mut cfg = EngineConfig::default();
        cfg.opponent.parallel_threshold = 1;
        let parallel = run(&players, 30..35, &cfg);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_filled_quarterback_need_raises_qb_survival() {
        let players = pool(40);
        let cfg = EngineConfig::default();
        let qb = players.iter().position(|p| p.name == "P022").unwrap();
        assert_eq!(players[qb].position, Some(Position::QB));

        let open = run(&players, 21..27, &cfg);
        let filled = run_with(
            &players,
            21..27,
            &cfg,
            &rosters_of(RosterCounts { qb: 1, total: 1, ..Default::default() }),
        );
        assert!(filled.survival[qb] > open.survival[qb]);
    }

    #[test]
    fn test_rookie_is_taken_sooner_than_veteran_at_same_adp() {
        let mut players: Vec<Player> = (1..=10).map(|i| at(&format!("W{i:02}"), Position::WR, i as f64)).collect();
        let mut rookie = at("Rookie", Position::RB, 5.0);
        rookie.is_rookie = true;
        players.push(rookie);
        players.push(at("Veteran", Position::RB, 5.0));

        let forecast = run(&players, 1..5, &EngineConfig::default());
        assert!(forecast.survival[10] < forecast.survival[11]);
    }

    #[test]
    fn test_positional_prior_favors_rb_early_and_fades() {
        let mut cfg = EngineConfig::default();
        cfg.opponent.flex_bonus = 0.0;

        let early: Vec<Player> = vec![
            at("Back", Position::RB, 3.0),
            at("Passer", Position::QB, 3.0),
            at("W1", Position::WR, 1.0),
            at("W2", Position::WR, 2.0),
        ];
        let forecast = run(&early, 1..5, &cfg);
        assert!(forecast.survival[1] > forecast.survival[0]);

        // Round 9: prior has faded, identical ADP and need give identical odds
        let late: Vec<Player> = vec![
            at("Back", Position::RB, 82.0),
            at("Passer", Position::QB, 82.0),
            at("W1", Position::WR, 80.0),
            at("W2", Position::WR, 81.0),
        ];
        let forecast = run(&late, 81..85, &cfg);
        assert!(forecast.survival[0] < 1.0);
        assert_eq!(forecast.survival[1], forecast.survival[0]);
    }

    #[test]
    fn test_early_prior_prefers_rb_over_qb() {
        let cfg = OpponentConfig::default();
        assert!(format_bonus(Position::WR, ScoringFormat::Ppr, &cfg) > format_bonus(Position::WR, ScoringFormat::Standard, &cfg));
        assert!(positional_prior(Position::RB) > positional_prior(Position::QB));
    }
}
