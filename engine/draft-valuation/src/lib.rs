//! # Draft Valuation
//!
//! Live valuation engine for fantasy snake drafts.
//!
//! Every draft event (pick, undo, weight change) produces a new immutable
//! [`DraftContext`]; [`recompute`] turns it into an [`EngineOutput`] holding a
//! Player Priority Score per player and a Positional Value Index per position.
//! The pipeline runs four stages in order: per-position tiering, need /
//! scarcity / availability, a forward simulation of opponent picks up to the
//! user's next turn, and score aggregation.
//!
//! The engine never fails on missing data; absent signals fall back to
//! neutral values. Errors only arise when building configuration or applying
//! a draft transition.

pub mod availability;
pub mod blend;
pub mod cache;
pub mod config;
pub mod context;
pub mod draft_math;
pub mod engine;
pub mod error;
pub mod needs;
pub mod opponent;
pub mod scoring;
pub mod tiers;
pub mod types;



pub use availability::{Availability, ScarcityMetric};
pub use cache::{CacheStats, ValuationCache};
pub use config::{EngineConfig, LeagueConfig, StarterRequirements};
pub use context::{DraftContext, DraftHorizon};
pub use engine::{recompute, recompute_with_cache, EngineOutput, ValuationEngine};
pub use error::{ConfigError, DraftError, ValuationError};
pub use tiers::TierMetrics;
pub use types::{DraftedBy, DraftedPick, Player, Position, RosterCounts, ScoringFormat, Weights};

/// Current version of the valuation engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
