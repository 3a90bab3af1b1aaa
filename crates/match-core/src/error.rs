use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the match collector and analyzer.
#[derive(Error, Debug)]
pub enum MatchError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be created, written or renamed.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The remote service could not be reached at all.
    #[error("Request failed: {0}")]
    Request(String),

    /// A player's hero does not appear in the given match.
    #[error("Hero {hero_id} not in match {match_id}")]
    HeroNotInMatch { hero_id: u32, match_id: u64 },

    /// A hero is missing from a winrate table.
    #[error("No winrate for hero {0}")]
    HeroNotInTable(u32),

    /// The match has no `radiant_win` outcome (aborted during the draft).
    #[error("Match {0} does not have 'radiant_win'")]
    MissingOutcome(u64),

    /// A named per-minute metric is absent or not numeric on a player.
    #[error("Player with hero {hero_id} has no numeric metric '{metric}'")]
    MissingMetric { hero_id: u32, metric: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the match crates.
pub type Result<T> = std::result::Result<T, MatchError>;
