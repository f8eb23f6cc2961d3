//! Score Aggregator: market value, talent, tier urgency, PPS and PVI

use crate::config::{ScoringConfig, TierUrgencyConfig};
use crate::tiers::TierMetrics;
use crate::types::{Player, Position, ScoringFormat, Weights};
use std::collections::BTreeMap;

/// Below this, a population's spread is treated as zero
const STDEV_EPSILON: f64 = 1e-9;

/// Neutral contribution for missing signals
pub const NEUTRAL: f64 = 0.5;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Linear-interpolated percentile, `q` in [0, 1]
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Min-max rescale into [0, 1]. A degenerate range keeps the inputs, clamped.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range <= STDEV_EPSILON {
        return values.iter().map(|v| v.clamp(0.0, 1.0)).collect();
    }
    values.iter().map(|v| (v - min) / range).collect()
}

/// Z-score of `value` across the positioned pool, clipped and rescaled to [0, 1].
///
/// Missing values and a zero-spread population score the neutral 0.5.
/// Players without a position are left out of the population and score 0.5.
pub fn market_values(players: &[Player], cfg: &ScoringConfig) -> Vec<f64> {
    let present: Vec<f64> = players.iter().filter(|p| p.position.is_some()).filter_map(|p| p.value).collect();
    let (Some(m), Some(sd)) = (mean(&present), std_dev(&present)) else {
        return vec![NEUTRAL; players.len()];
    };

    players
        .iter()
        .map(|p| match (p.position, p.value) {
            (Some(_), Some(v)) => {
                let z = if sd > STDEV_EPSILON { (v - m) / sd } else { 0.0 };
                let clipped = z.clamp(-cfg.z_clip, cfg.z_clip);
                (clipped + cfg.z_clip) / (2.0 * cfg.z_clip)
            }
            _ => NEUTRAL,
        })
        .collect()
}

/// Inverse min-max of `blend_rank` over positioned players: 1.0 for the best-ranked
pub fn talent_scores(players: &[Player]) -> Vec<f64> {
    let ranks: Vec<f64> = players.iter().filter(|p| p.position.is_some()).filter_map(|p| p.blend_rank).collect();
    let min = ranks.iter().copied().fold(f64::INFINITY, f64::min);
    let max = ranks.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    players
        .iter()
        .map(|p| match (p.position, p.blend_rank) {
            (Some(_), Some(r)) if range > 0.0 => (max - r) / range,
            _ => NEUTRAL,
        })
        .collect()
}

/// Tier-cliff threshold per position for the current round
pub fn tier_drop_thresholds(
    metrics: &TierMetrics,
    round: u32,
    cfg: &TierUrgencyConfig,
) -> BTreeMap<Position, f64> {
    let scale = cfg.phase_scale(round);
    Position::ALL
        .iter()
        .map(|&pos| {
            let gaps: Vec<f64> = metrics
                .get(pos)
                .map(|m| m.gaps().into_iter().filter(|g| *g > 0.0).collect())
                .unwrap_or_default();
            let base = percentile(&gaps, cfg.gap_percentile).unwrap_or(cfg.fallback_threshold);
            (pos, base * scale)
        })
        .collect()
}

/// 1.0 / 0.7 / 0.3 for the last member of a tier by the size of the drop
/// to the next tier, 0 for everyone else and for the final tier
pub fn tier_urgency(player: &Player, metrics: &TierMetrics, thresholds: &BTreeMap<Position, f64>) -> f64 {
    let (Some(pos), Some(tier)) = (player.position, player.tier) else {
        return 0.0;
    };
    let Some(gap) = metrics
        .get(pos)
        .and_then(|m| m.last_in_tier(&player.name, tier))
        .and_then(|t| t.gap_to_next_tier)
    else {
        return 0.0;
    };
    let threshold = thresholds.get(&pos).copied().unwrap_or(0.0);

    if gap >= threshold {
        1.0
    } else if gap >= threshold / 2.0 {
        0.7
    } else {
        0.3
    }
}

/// Normalized per-player and per-position signals feeding PPS
pub struct PpsInputs<'a> {
    pub market: &'a [f64],
    pub tier_urgency: &'a [f64],
    pub availability: &'a [f64],
    pub need: &'a BTreeMap<Position, f64>,
    pub scarcity: &'a BTreeMap<Position, f64>,
}

pub fn format_bonus(position: Position, scoring: ScoringFormat, is_rookie: bool, cfg: &ScoringConfig) -> f64 {
    let receiving = matches!(position, Position::WR | Position::TE);
    let mut bonus = match scoring {
        ScoringFormat::Ppr if receiving => cfg.ppr_bonus,
        ScoringFormat::HalfPpr if receiving => cfg.half_ppr_bonus,
        _ => 0.0,
    };
    if position.is_flex_eligible() {
        bonus += cfg.flex_bonus;
    }
    if is_rookie {
        bonus += cfg.rookie_bonus;
    }
    bonus
}

/// Player Priority Score per player, index-aligned, clamped to [0, 1]
pub fn player_priority_scores(
    players: &[Player],
    inputs: &PpsInputs<'_>,
    weights: &Weights,
    scoring: ScoringFormat,
    cfg: &ScoringConfig,
) -> Vec<f64> {
    players
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let Some(pos) = p.position else {
                return 0.0;
            };
            let score = weights.value * inputs.market[i]
                + weights.tier * inputs.tier_urgency[i]
                + weights.need * inputs.need.get(&pos).copied().unwrap_or(0.0)
                + weights.scarcity * inputs.scarcity.get(&pos).copied().unwrap_or(0.0)
                + weights.availability * inputs.availability[i]
                + format_bonus(pos, scoring, p.is_rookie, cfg);
            score.clamp(0.0, 1.0)
        })
        .collect()
}

/// Positional Value Index: mean of each position's top PPS values, scaled so
/// the strongest position is 1.0
pub fn positional_value_index(players: &[Player], pps: &[f64], cfg: &ScoringConfig) -> BTreeMap<Position, f64> {
    if players.is_empty() {
        return BTreeMap::new();
    }

    let mut by_position: BTreeMap<Position, Vec<f64>> =
        Position::ALL.iter().map(|&pos| (pos, Vec::new())).collect();
    for (p, &score) in players.iter().zip(pps) {
        if let Some(pos) = p.position {
            by_position.entry(pos).or_default().push(score);
        }
    }

    let mut pvi: BTreeMap<Position, f64> = by_position
        .into_iter()
        .map(|(pos, mut scores)| {
            scores.sort_by(|a, b| b.total_cmp(a));
            scores.truncate(cfg.pvi_depth);
            (pos, mean(&scores).unwrap_or(0.0))
        })
        .collect();

    let max = pvi.values().copied().fold(0.0, f64::max);
    if max > 0.0 {
        for v in pvi.values_mut() {
            *v /= max;
        }
    }
    pvi
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valued(name: &str, value: Option<f64>) -> Player {
        let mut p = Player::new(name, Some(Position::WR));
        p.value = value;
        p
    }

    #[test]
    fn test_percentile_interpolates() {
        assert_eq!(percentile(&[], 0.5), None);
        assert_eq!(percentile(&[4.0], 0.75), Some(4.0));
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.75), Some(4.0));
        assert_eq!(percentile(&[10.0, 0.0], 0.75), Some(7.5));
    }

    #[test]
    fn test_min_max_normalize() {
        assert_eq!(min_max_normalize(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
        assert_eq!(min_max_normalize(&[0.3, 0.3]), vec![0.3, 0.3]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn test_market_values() {
        let cfg = ScoringConfig::default();
        let players = vec![valued("a", Some(-10.0)), valued("b", Some(10.0)), valued("c", None)];
        let mv = market_values(&players, &cfg);
        // z = -1 and +1
        assert!((mv[0] - 0.25).abs() < 1e-12);
        assert!((mv[1] - 0.75).abs() < 1e-12);
        assert_eq!(mv[2], 0.5);
    }

    #[test]
    fn test_market_values_degenerate() {
        let cfg = ScoringConfig::default();
        let same = vec![valued("a", Some(3.0)), valued("b", Some(3.0))];
        assert_eq!(market_values(&same, &cfg), vec![0.5, 0.5]);
        let none = vec![valued("a", None)];
        assert_eq!(market_values(&none, &cfg), vec![0.5]);
    }

    #[test]
    fn test_market_values_clip() {
        let cfg = ScoringConfig::default();
        let mut players: Vec<Player> = (0..20).map(|i| valued(&format!("p{i}"), Some(0.0))).collect();
        players.push(valued("outlier", Some(1000.0)));
        let mv = market_values(&players, &cfg);
        assert_eq!(mv[20], 1.0);
        assert!(mv[0] > 0.0 && mv[0] < 0.5);
    }

    #[test]
    fn test_market_values_ignore_unpositioned_players() {
        let cfg = ScoringConfig::default();
        let base = vec![valued("a", Some(-10.0)), valued("b", Some(10.0))];
        let mut with_unknown = base.clone();
        let mut unknown = Player::new("unknown", None);
        unknown.value = Some(400.0);
        with_unknown.insert(0, unknown);

        let mv = market_values(&with_unknown, &cfg);
        assert_eq!(mv[0], NEUTRAL);
        assert_eq!(&mv[1..], market_values(&base, &cfg).as_slice());
    }

    #[test]
    fn test_talent_scores() {
        let mut players = vec![valued("a", None), valued("b", None), valued("c", None)];
        players[0].blend_rank = Some(1.0);
        players[1].blend_rank = Some(11.0);
        assert_eq!(talent_scores(&players), vec![1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_tier_urgency_bands() {
        let mut players: Vec<Player> = [(1.0, 1), (2.0, 1), (14.0, 2), (15.0, 2), (16.0, 2)]
            .iter()
            .enumerate()
            .map(|(i, &(rank, tier))| {
                let mut p = Player::new(format!("RB{i}"), Some(Position::RB));
                p.blend_rank = Some(rank);
                p.tier = Some(tier);
                p
            })
            .collect();
        let metrics = TierMetrics::from_players(&players);

        let mut thresholds = BTreeMap::new();
        thresholds.insert(Position::RB, 10.0);
        assert_eq!(tier_urgency(&players[1], &metrics, &thresholds), 1.0);
        assert_eq!(tier_urgency(&players[0], &metrics, &thresholds), 0.0);
        assert_eq!(tier_urgency(&players[4], &metrics, &thresholds), 0.0);

        thresholds.insert(Position::RB, 20.0);
        assert_eq!(tier_urgency(&players[1], &metrics, &thresholds), 0.7);
        thresholds.insert(Position::RB, 30.0);
        assert_eq!(tier_urgency(&players[1], &metrics, &thresholds), 0.3);

        players[1].tier = None;
        assert_eq!(tier_urgency(&players[1], &metrics, &thresholds), 0.0);
    }

    #[test]
    fn test_thresholds_scale_with_round() {
        let metrics = TierMetrics::default();
        let cfg = TierUrgencyConfig::default();
        let early = tier_drop_thresholds(&metrics, 1, &cfg);
        let late = tier_drop_thresholds(&metrics, 12, &cfg);
        assert!((early[&Position::QB] - 6.4).abs() < 1e-12);
        assert!((late[&Position::QB] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_pps_clamped_and_unknown_position_is_zero() {
        let cfg = ScoringConfig::default();
        let mut players = vec![valued("wr", None), Player::new("mystery", None)];
        players[0].is_rookie = true;
        let ones = vec![1.0; 2];
        let need: BTreeMap<Position, f64> = Position::ALL.iter().map(|&p| (p, 1.0)).collect();
        let inputs = PpsInputs {
            market: &ones,
            tier_urgency: &ones,
            availability: &ones,
            need: &need,
            scarcity: &need,
        };
        let heavy = Weights { value: 1.0, tier: 1.0, need: 1.0, scarcity: 1.0, availability: 1.0 };
        let pps = player_priority_scores(&players, &inputs, &heavy, ScoringFormat::Ppr, &cfg);
        assert_eq!(pps, vec![1.0, 0.0]);
    }

    #[test]
    fn test_format_bonus() {
        let cfg = ScoringConfig::default();
        assert!((format_bonus(Position::WR, ScoringFormat::Ppr, false, &cfg) - 0.05).abs() < 1e-12);
        assert!((format_bonus(Position::TE, ScoringFormat::HalfPpr, false, &cfg) - 0.015).abs() < 1e-12);
        assert!((format_bonus(Position::RB, ScoringFormat::Standard, true, &cfg) - 0.04).abs() < 1e-12);
        assert_eq!(format_bonus(Position::QB, ScoringFormat::Ppr, false, &cfg), 0.0);
    }

    #[test]
    fn test_pvi_top_depth_and_scaling() {
        let cfg = ScoringConfig::default();
        let mut players = Vec::new();
        let mut pps = Vec::new();
        for i in 0..8 {
            players.push(Player::new(format!("rb{i}"), Some(Position::RB)));
            pps.push(if i < 6 { 0.8 } else { 0.0 });
        }
        players.push(Player::new("qb", Some(Position::QB)));
        pps.push(0.4);

        let pvi = positional_value_index(&players, &pps, &cfg);
        assert_eq!(pvi[&Position::RB], 1.0);
        assert!((pvi[&Position::QB] - 0.5).abs() < 1e-12);
        assert_eq!(pvi[&Position::K], 0.0);
        assert!(positional_value_index(&[], &[], &cfg).is_empty());
    }
}
