//! Error types for the valuation engine

use thiserror::Error;

/// Top-level error for the valuation crate
#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),
}

/// Invalid league or tuning configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("League must have at least 2 teams, got {teams}")]
    TooFewTeams { teams: u32 },

    #[error("Draft slot {slot} is outside 1..={teams}")]
    SlotOutOfRange { slot: u32, teams: u32 },

    #[error("Weight '{name}' must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("Invalid tuning parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Failed draft transition
#[derive(Error, Debug, PartialEq)]
pub enum DraftError {
    #[error("Player '{0}' is not in the remaining pool")]
    PlayerNotFound(String),

    #[error("No picks to undo")]
    NothingToUndo,
}
