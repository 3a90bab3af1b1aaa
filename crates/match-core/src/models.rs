use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Highest `player_slot` value that still belongs to the Radiant side.
pub const RADIANT_MAX_SLOT: u32 = 4;

/// Number of players on one side of a regular match.
pub const ROSTER_SIZE: usize = 5;

/// One of the two opposing sides in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Radiant,
    Dire,
}

impl Team {
    /// Resolve a side from a player slot: `0..=4` is Radiant, anything else
    /// (`128..=132` in practice) is Dire.
    pub fn from_slot(player_slot: u32) -> Self {
        if player_slot <= RADIANT_MAX_SLOT {
            Team::Radiant
        } else {
            Team::Dire
        }
    }

    /// Whether this side won, given the match's `radiant_win` outcome.
    pub fn won(self, radiant_win: bool) -> bool {
        match self {
            Team::Radiant => radiant_win,
            Team::Dire => !radiant_win,
        }
    }
}

/// A single player entry inside a match's `players` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Hero picked by this player.
    pub hero_id: u32,
    /// Seat identifier; encodes the side (see [`Team::from_slot`]).
    pub player_slot: u32,
    /// Every other field of the player object (per-minute stats, items,
    /// account id, ...), kept verbatim.
    #[serde(flatten)]
    pub stats: Map<String, Value>,
}

impl Player {
    /// Side this player was on.
    pub fn team(&self) -> Team {
        Team::from_slot(self.player_slot)
    }

    /// Numeric stat addressed by name, e.g. `"gold_per_min"`.
    ///
    /// Returns `None` when the field is absent or not a number.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.stats.get(name).and_then(Value::as_f64)
    }
}

/// The `result` object returned by the match-details endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetails {
    pub match_id: u64,
    /// Absent for matches aborted during the draft.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radiant_win: Option<bool>,
    /// Match length in seconds.
    pub duration: u64,
    pub game_mode: u32,
    #[serde(default)]
    pub radiant_score: u32,
    #[serde(default)]
    pub dire_score: u32,
    pub players: Vec<Player>,
    /// Remaining response fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MatchDetails {
    /// First player that picked `hero_id`, if any.
    pub fn player_for_hero(&self, hero_id: u32) -> Option<&Player> {
        self.players.iter().find(|p| p.hero_id == hero_id)
    }

    pub fn has_hero(&self, hero_id: u32) -> bool {
        self.player_for_hero(hero_id).is_some()
    }

    /// Whether the match carries a `radiant_win` outcome.
    pub fn has_outcome(&self) -> bool {
        self.radiant_win.is_some()
    }
}

/// One persisted match: the endpoint's response body, keyed by `result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub result: MatchDetails,
}

impl MatchRecord {
    pub fn match_id(&self) -> u64 {
        self.result.match_id
    }
}

/// An ordered, in-memory collection of match records.
pub type Dataset = Vec<MatchRecord>;

/// Final kill scores for both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamScores {
    pub radiant_score: u32,
    pub dire_score: u32,
}
