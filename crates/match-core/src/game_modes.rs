//! Game-mode code → label lookup table.
//!
//! The histogram aggregate takes a [`GameModeTable`] explicitly, so new modes
//! can be added from a JSON file without touching code.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};

/// Labels for the game-mode codes known to the public match API.
const DEFAULT_GAME_MODES: [(u32, &str); 24] = [
    (0, "Unknown"),
    (1, "All pick"),
    (2, "Captains mode"),
    (3, "Random draft"),
    (4, "Single draft"),
    (5, "All random"),
    (6, "Intro"),
    (7, "The Diretide"),
    (8, "Reverse captains mode"),
    (9, "Greeviling"),
    (10, "Tutorial"),
    (11, "Mid only"),
    (12, "Least played"),
    (13, "New player pool"),
    (14, "Compendium matchmaking"),
    (15, "Custom"),
    (16, "Captains draft"),
    (17, "Balanced draft"),
    (18, "Ability draft"),
    (19, "Event"),
    (20, "All random death match"),
    (21, "1 vs. 1 solo mid"),
    (22, "Ranked all pick"),
    (23, "Ranked Roles"),
];

/// Mapping of game-mode codes to human-readable labels, ordered by code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameModeTable {
    modes: BTreeMap<u32, String>,
}

impl Default for GameModeTable {
    fn default() -> Self {
        Self {
            modes: DEFAULT_GAME_MODES
                .iter()
                .map(|(code, label)| (*code, (*label).to_string()))
                .collect(),
        }
    }
}

impl GameModeTable {
    /// Build a table from explicit `(code, label)` pairs.
    pub fn new<I, S>(modes: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        Self {
            modes: modes.into_iter().map(|(c, l)| (c, l.into())).collect(),
        }
    }

    /// Load a table from a JSON object such as `{"1": "All pick", "22": "Ranked all pick"}`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| MatchError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let table: Self = serde_json::from_str(&content)?;
        if table.modes.is_empty() {
            return Err(MatchError::Config(format!(
                "game mode table {} is empty",
                path.display()
            )));
        }
        tracing::debug!("Loaded {} game modes from {}", table.modes.len(), path.display());
        Ok(table)
    }

    pub fn label(&self, code: u32) -> Option<&str> {
        self.modes.get(&code).map(String::as_str)
    }

    pub fn contains(&self, code: u32) -> bool {
        self.modes.contains_key(&code)
    }

    /// `(code, label)` pairs in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.modes.iter().map(|(c, l)| (*c, l.as_str()))
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}
