//! Tier Builder
//!
//! Groups the players at each position into ordered tiers (1 = elite) from
//! their `blend_rank`. Large pools are clustered with 1-D k-means, choosing k
//! by silhouette score; mid-sized pools fall back to equal-depth quantile
//! buckets; tiny pools are a single tier. Externally supplied tiers are
//! trusted and never re-clustered.

use crate::config::TierConfig;
use crate::types::{Player, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Result of one k-means run with cluster ids ordered by ascending centroid
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Cluster index per input value; 0 holds the lowest values
    pub assignments: Vec<usize>,
    /// Centroids of the non-empty clusters, ascending
    pub centroids: Vec<f64>,
    pub iterations: usize,
}

impl Clustering {
    pub fn cluster_count(&self) -> usize {
        self.centroids.len()
    }
}

/// Strategy that produced a position's tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TierMethod {
    /// `k` is the requested cluster count; `clusters` the non-empty ones that became tiers
    KMeans { k: usize, clusters: usize, silhouette: f64 },
    Quantile { buckets: usize },
    Single,
    Empty,
}

/// 1-D k-means with centroids seeded evenly across `[min, max]`.
///
/// Raw k-means cluster ids carry no ordering, so ids are remapped by ascending
/// centroid before returning. Empty clusters are dropped from the result.
pub fn kmeans_1d(values: &[f64], k: usize, cfg: &TierConfig) -> Clustering {
    if values.is_empty() || k == 0 {
        return Clustering { assignments: Vec::new(), centroids: Vec::new(), iterations: 0 };
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut centroids: Vec<f64> =
        (0..k).map(|i| min + (i as f64 + 0.5) * (max - min) / k as f64).collect();
    let mut assignments = vec![0usize; values.len()];
    let mut iterations = 0;

    while iterations < cfg.max_iterations {
        for (slot, &value) in assignments.iter_mut().zip(values) {
            *slot = nearest(&centroids, value);
        }

        let mut sums = vec![0.0; k];
        let mut counts = vec![0usize; k];
        for (&cluster, &value) in assignments.iter().zip(values) {
            sums[cluster] += value;
            counts[cluster] += 1;
        }
        let updated: Vec<f64> = (0..k)
            .map(|i| if counts[i] > 0 { sums[i] / counts[i] as f64 } else { centroids[i] })
            .collect();

        iterations += 1;
        let converged = centroids
            .iter()
            .zip(&updated)
            .all(|(old, new)| (old - new).abs() < cfg.convergence_epsilon);
        centroids = updated;
        if converged {
            break;
        }
    }

    // Final assignment against the settled centroids
    for (slot, &value) in assignments.iter_mut().zip(values) {
        *slot = nearest(&centroids, value);
    }

    reorder_by_centroid(&assignments, &centroids, iterations)
}

fn nearest(centroids: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let distance = (value - c).abs();
        if distance < best_distance {
            best_distance = distance;
            best = i;
        }
    }
    best
}

fn reorder_by_centroid(assignments: &[usize], centroids: &[f64], iterations: usize) -> Clustering {
    let mut used: Vec<usize> = assignments.to_vec();
    used.sort_unstable();
    used.dedup();
    used.sort_by(|a, b| centroids[*a].total_cmp(&centroids[*b]));

    let mut remap = vec![0usize; centroids.len()];
    for (ordered, &raw) in used.iter().enumerate() {
        remap[raw] = ordered;
    }

    Clustering {
        assignments: assignments.iter().map(|&raw| remap[raw]).collect(),
        centroids: used.iter().map(|&raw| centroids[raw]).collect(),
        iterations,
    }
}

/// Mean silhouette coefficient of a 1-D clustering.
///
/// Returns 0 for a single cluster. Points alone in their cluster score 0.
pub fn silhouette_1d(values: &[f64], assignments: &[usize]) -> f64 {
    if values.is_empty() || values.len() != assignments.len() {
        return 0.0;
    }
    let clusters = assignments.iter().copied().max().map_or(0, |m| m + 1);
    let mut members: Vec<Vec<f64>> = vec![Vec::new(); clusters];
    for (&cluster, &value) in assignments.iter().zip(values) {
        members[cluster].push(value);
    }
    if members.iter().filter(|m| !m.is_empty()).count() <= 1 {
        return 0.0;
    }

    let mean_distance = |value: f64, group: &[f64]| -> f64 {
        group.iter().map(|v| (v - value).abs()).sum::<f64>() / group.len() as f64
    };

    let mut total = 0.0;
    for (&cluster, &value) in assignments.iter().zip(values) {
        let own = &members[cluster];
        if own.len() <= 1 {
            continue;
        }
        // `own` includes the point itself at distance zero
        let a = own.iter().map(|v| (v - value).abs()).sum::<f64>() / (own.len() - 1) as f64;
        let b = members
            .iter()
            .enumerate()
            .filter(|(i, group)| *i != cluster && !group.is_empty())
            .map(|(_, group)| mean_distance(value, group.as_slice()))
            .fold(f64::INFINITY, f64::min);
        let denom = a.max(b);
        if denom > 0.0 && b.is_finite() {
            total += (b - a) / denom;
        }
    }
    total / values.len() as f64
}

/// Run k-means for every admissible k and keep the best silhouette.
///
/// Ties keep the smaller k. Returns the chosen k with its clustering and
/// score, or `None` when the pool is too small for the configured minimum k.
pub fn select_k(values: &[f64], cfg: &TierConfig) -> Option<(usize, Clustering, f64)> {
    let upper = cfg.k_max.min(values.len() / cfg.min_points_per_cluster.max(1));
    if upper < cfg.k_min {
        return None;
    }

    let mut best: Option<(usize, Clustering, f64)> = None;
    for k in cfg.k_min..=upper {
        let clustering = kmeans_1d(values, k, cfg);
        let score = silhouette_1d(values, &clustering.assignments);
        if best.as_ref().map_or(true, |(_, _, s)| score > *s) {
            best = Some((k, clustering, score));
        }
    }
    best
}

/// Tier numbers for players sorted by ascending rank, in equal-depth buckets
pub fn quantile_tiers(count: usize, buckets: usize) -> Vec<u32> {
    let size = count.div_ceil(buckets.max(1)).max(1);
    (0..count).map(|i| (i / size) as u32 + 1).collect()
}

/// Assign `tier` to every player, position by position.
///
/// Returns the method chosen for each position that has at least one player.
pub fn build_tiers(players: &mut [Player], cfg: &TierConfig) -> BTreeMap<Position, TierMethod> {
    let mut by_position: BTreeMap<Position, Vec<usize>> = BTreeMap::new();
    for (i, player) in players.iter_mut().enumerate() {
        player.tier = player.source_c_tier;
        if let (Some(pos), None) = (player.position, player.source_c_tier) {
            by_position.entry(pos).or_default().push(i);
        }
    }

    let mut methods = BTreeMap::new();
    for (position, indices) in by_position {
        let mut ranked: Vec<usize> =
            indices.into_iter().filter(|&i| players[i].blend_rank.is_some()).collect();
        ranked.sort_by(|&a, &b| {
            players[a]
                .sort_rank()
                .total_cmp(&players[b].sort_rank())
                .then_with(|| players[a].name.cmp(&players[b].name))
        });

        let method = tier_position(players, &ranked, cfg);
        debug!("{} tiers: {} players via {:?}", position, ranked.len(), method);
        methods.insert(position, method);
    }
    methods
}

fn tier_position(players: &mut [Player], ranked: &[usize], cfg: &TierConfig) -> TierMethod {
    let n = ranked.len();
    if n == 0 {
        return TierMethod::Empty;
    }

    if n >= cfg.kmeans_min_players {
        let values: Vec<f64> = ranked.iter().map(|&i| players[i].sort_rank()).collect();
        if let Some((k, clustering, silhouette)) = select_k(&values, cfg) {
            for (&i, &cluster) in ranked.iter().zip(&clustering.assignments) {
                players[i].tier = Some(cluster as u32 + 1);
            }
            return TierMethod::KMeans { k, clusters: clustering.cluster_count(), silhouette };
        }
    }

    if n >= cfg.quantile_min_players {
        for (&i, tier) in ranked.iter().zip(quantile_tiers(n, cfg.quantile_buckets)) {
            players[i].tier = Some(tier);
        }
        return TierMethod::Quantile { buckets: cfg.quantile_buckets };
    }

    for &i in ranked {
        players[i].tier = Some(1);
    }
    TierMethod::Single
}

/// Drop-off from one tier to the next at a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierGap {
    pub tier: u32,
    /// Worst-ranked remaining member of the tier
    pub last_player: String,
    /// Rank distance from `last_player` to the best player of the next tier;
    /// `None` for the final tier
    pub gap_to_next_tier: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionTierMetrics {
    /// One entry per tier present, ascending
    pub tiers: Vec<TierGap>,
}

impl PositionTierMetrics {
    /// Every observed inter-tier gap
    pub fn gaps(&self) -> Vec<f64> {
        self.tiers.iter().filter_map(|t| t.gap_to_next_tier).collect()
    }

    /// Gap entry for `tier` when `name` is its last remaining member
    pub fn last_in_tier(&self, name: &str, tier: u32) -> Option<&TierGap> {
        self.tiers.iter().find(|t| t.tier == tier && t.last_player == name)
    }
}

/// Per-position tier drop-off metrics, rebuilt every recompute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierMetrics {
    pub positions: BTreeMap<Position, PositionTierMetrics>,
}

impl TierMetrics {
    pub fn from_players(players: &[Player]) -> Self {
        let mut grouped: BTreeMap<Position, BTreeMap<u32, Vec<(&str, f64)>>> = BTreeMap::new();
        for p in players {
            if let (Some(pos), Some(tier), Some(rank)) = (p.position, p.tier, p.blend_rank) {
                grouped.entry(pos).or_default().entry(tier).or_default().push((p.name.as_str(), rank));
            }
        }

        let mut positions = BTreeMap::new();
        for (pos, tiers) in grouped {
            // (tier, worst member, worst rank, best rank)
            let bounds: Vec<(u32, &str, f64, f64)> = tiers
                .into_iter()
                .filter_map(|(tier, members)| {
                    let worst = members
                        .iter()
                        .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)))?;
                    let best = members.iter().map(|m| m.1).fold(f64::INFINITY, f64::min);
                    Some((tier, worst.0, worst.1, best))
                })
                .collect();

            let tiers = bounds
                .iter()
                .enumerate()
                .map(|(i, &(tier, name, worst, _))| TierGap {
                    tier,
                    last_player: name.to_string(),
                    gap_to_next_tier: bounds.get(i + 1).map(|next| (next.3 - worst).max(0.0)),
                })
                .collect();
            positions.insert(pos, PositionTierMetrics { tiers });
        }
        Self { positions }
    }

    pub fn get(&self, position: Position) -> Option<&PositionTierMetrics> {
        self.positions.get(&position)
    }
}
