//! Blending raw source ranks into `blend_rank` and `value`

use crate::config::BlendConfig;
use crate::types::Player;

/// Fill `value` and `blend_rank` when they are absent.
///
/// Values the caller already set are kept, so a player record that has been
/// through the engine once blends to the same numbers again.
pub fn derive_signals(player: &mut Player, cfg: &BlendConfig) {
    if player.value.is_none() {
        player.value = market_value_gap(player);
    }
    if player.blend_rank.is_none() {
        player.blend_rank = blend_rank(player, cfg);
    }
}

pub fn derive_all(players: &mut [Player], cfg: &BlendConfig) {
    for player in players {
        derive_signals(player, cfg);
    }
}

/// Source B minus source A, when both exist
pub fn market_value_gap(player: &Player) -> Option<f64> {
    match (player.source_a_rank, player.source_b_rank) {
        (Some(a), Some(b)) => Some(b - a),
        _ => None,
    }
}

/// Weighted blend of the available signals, penalized when one is missing
pub fn blend_rank(player: &Player, cfg: &BlendConfig) -> Option<f64> {
    match (player.source_a_rank, player.source_b_rank) {
        (Some(a), Some(b)) => {
            let mut weighted = cfg.source_a_weight * a + cfg.source_b_weight * b;
            let mut total = cfg.source_a_weight + cfg.source_b_weight;
            if let Some(c) = player.source_c_rank.filter(|_| cfg.source_c_weight > 0.0) {
                weighted += cfg.source_c_weight * c;
                total += cfg.source_c_weight;
            }
            if total > 0.0 {
                Some(weighted / total)
            } else {
                Some((a + b) / 2.0)
            }
        }
        (Some(single), None) | (None, Some(single)) => Some(single * cfg.single_signal_penalty),
        (None, None) => player.source_c_rank.map(|c| c * cfg.third_source_penalty),
    }
}
