//! Dataset-wide tallies: win counts, game-mode distribution, duration bands,
//! hero winrates and team metric averages.

use std::collections::BTreeMap;

use match_core::calculations::{calculate_per_min_metrics, calculate_win_percent, WinrateTable};
use match_core::error::MatchError;
use match_core::game_modes::GameModeTable;
use match_core::heroes::HeroList;
use match_core::models::{MatchRecord, Team};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::analyzer::{determine_teams, did_hero_win_match, team_scores};

// ── WinTally ──────────────────────────────────────────────────────────────────

/// Radiant win/loss counts; matches without an outcome land in `errors`.
///
/// Serializes as `{wins, losses, errors, total}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinTally {
    pub wins: usize,
    pub losses: usize,
    pub errors: usize,
}

impl WinTally {
    pub fn total(&self) -> usize {
        self.wins + self.losses + self.errors
    }

    /// Radiant win percentage over matches that have an outcome.
    pub fn win_percent(&self) -> f64 {
        calculate_win_percent(self.wins + self.losses, self.wins)
    }
}

impl Serialize for WinTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("WinTally", 4)?;
        state.serialize_field("wins", &self.wins)?;
        state.serialize_field("losses", &self.losses)?;
        state.serialize_field("errors", &self.errors)?;
        state.serialize_field("total", &self.total())?;
        state.end()
    }
}

/// Count Radiant wins and losses across `data`.
pub fn radiant_wins(data: &[MatchRecord]) -> WinTally {
    let mut tally = WinTally::default();
    for record in data {
        match record.result.radiant_win {
            Some(true) => tally.wins += 1,
            Some(false) => tally.losses += 1,
            None => tally.errors += 1,
        }
    }
    tally
}

// ── GameModeHistogram ─────────────────────────────────────────────────────────

/// Number of matches for one game mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameModeCount {
    pub code: u32,
    pub label: String,
    pub count: usize,
}

/// Game-mode distribution over a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameModeHistogram {
    /// One bucket per table entry, in code order, including empty ones.
    pub buckets: Vec<GameModeCount>,
    /// Matches whose code is not in the table, keyed by code.
    pub unknown: BTreeMap<u32, usize>,
}

impl GameModeHistogram {
    /// Count for `code`, whether it is a table bucket or unknown.
    pub fn count(&self, code: u32) -> usize {
        self.buckets
            .iter()
            .find(|b| b.code == code)
            .map(|b| b.count)
            .or_else(|| self.unknown.get(&code).copied())
            .unwrap_or(0)
    }

    pub fn unknown_total(&self) -> usize {
        self.unknown.values().sum()
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum::<usize>() + self.unknown_total()
    }
}

/// Bucket `data` by game mode using the labels in `modes`.
///
/// Codes missing from `modes` do not get a bucket; they are tallied in
/// [`GameModeHistogram::unknown`] and reported once per code.
pub fn game_mode_histogram(data: &[MatchRecord], modes: &GameModeTable) -> GameModeHistogram {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for record in data {
        *counts.entry(record.result.game_mode).or_default() += 1;
    }

    let buckets = modes
        .iter()
        .map(|(code, label)| GameModeCount {
            code,
            label: label.to_string(),
            count: counts.remove(&code).unwrap_or(0),
        })
        .collect();

    for (code, count) in &counts {
        warn!("Unknown game mode {} in {} matches", code, count);
    }

    GameModeHistogram {
        buckets,
        unknown: counts,
    }
}

// ── Duration bands ────────────────────────────────────────────────────────────

/// Match-length category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationBand {
    /// 0–1199 s
    Early,
    /// 1200–2399 s
    Mid,
    /// 2400–3599 s
    Late,
    /// 3600 s and up
    UltraLate,
}

impl DurationBand {
    pub const ALL: [DurationBand; 4] = [
        DurationBand::Early,
        DurationBand::Mid,
        DurationBand::Late,
        DurationBand::UltraLate,
    ];

    pub fn from_seconds(duration: u64) -> Self {
        match duration {
            0..=1199 => DurationBand::Early,
            1200..=2399 => DurationBand::Mid,
            2400..=3599 => DurationBand::Late,
            _ => DurationBand::UltraLate,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DurationBand::Early => "Early",
            DurationBand::Mid => "Mid",
            DurationBand::Late => "Late",
            DurationBand::UltraLate => "Ultra Late",
        }
    }
}

/// Matches split into the four duration bands.
#[derive(Debug, Clone, Default)]
pub struct DurationBuckets<'a> {
    pub early: Vec<&'a MatchRecord>,
    pub mid: Vec<&'a MatchRecord>,
    pub late: Vec<&'a MatchRecord>,
    pub ultra_late: Vec<&'a MatchRecord>,
}

impl<'a> DurationBuckets<'a> {
    pub fn band(&self, band: DurationBand) -> &[&'a MatchRecord] {
        match band {
            DurationBand::Early => &self.early,
            DurationBand::Mid => &self.mid,
            DurationBand::Late => &self.late,
            DurationBand::UltraLate => &self.ultra_late,
        }
    }

    pub fn counts(&self) -> DurationCounts {
        DurationCounts {
            early: self.early.len(),
            mid: self.mid.len(),
            late: self.late.len(),
            ultra_late: self.ultra_late.len(),
        }
    }
}

/// Per-band match counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DurationCounts {
    pub early: usize,
    pub mid: usize,
    pub late: usize,
    pub ultra_late: usize,
}

/// Split `data` by match length.
pub fn bucket_by_duration(data: &[MatchRecord]) -> DurationBuckets<'_> {
    let mut buckets = DurationBuckets::default();
    for record in data {
        let slot = match DurationBand::from_seconds(record.result.duration) {
            DurationBand::Early => &mut buckets.early,
            DurationBand::Mid => &mut buckets.mid,
            DurationBand::Late => &mut buckets.late,
            DurationBand::UltraLate => &mut buckets.ultra_late,
        };
        slot.push(record);
    }
    buckets
}

// ── Hero winrates ─────────────────────────────────────────────────────────────

/// Win statistics for one hero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroWinrate {
    pub hero_id: u32,
    pub name: String,
    /// Matches featuring the hero that have an outcome.
    pub matches: usize,
    pub wins: usize,
    /// Win percentage, `0.0` when the hero has no matches.
    pub winrate: f64,
}

/// Winrate of every hero in `heroes` over `data`.
///
/// Matches without an outcome are left out of both wins and match count.
pub fn hero_winrates(data: &[MatchRecord], heroes: &HeroList) -> Vec<HeroWinrate> {
    heroes
        .iter()
        .map(|hero| {
            let mut matches = 0usize;
            let mut wins = 0usize;
            for record in data.iter().filter(|m| m.result.has_hero(hero.id)) {
                match did_hero_win_match(record, hero.id) {
                    Ok(won) => {
                        matches += 1;
                        if won {
                            wins += 1;
                        }
                    }
                    Err(MatchError::MissingOutcome(match_id)) => {
                        debug!("Match {} has no outcome; skipped for hero {}", match_id, hero.id);
                    }
                    Err(e) => warn!("{}", e),
                }
            }
            HeroWinrate {
                hero_id: hero.id,
                name: hero.display_name().to_string(),
                matches,
                wins,
                winrate: calculate_win_percent(matches, wins),
            }
        })
        .collect()
}

/// Hero id → winrate lookup for [`calculate_winrate_average`](match_core::calculations::calculate_winrate_average).
pub fn winrate_table(winrates: &[HeroWinrate]) -> WinrateTable {
    winrates.iter().map(|w| (w.hero_id, w.winrate)).collect()
}

// ── Team metric averages ──────────────────────────────────────────────────────

/// Mean per-team totals of one per-minute metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMetricAverage {
    pub metric: String,
    /// Matches where every player carried the metric.
    pub matches: usize,
    /// Matches skipped because a player lacked the metric.
    pub skipped: usize,
    pub radiant: f64,
    pub dire: f64,
}

/// Average Radiant and Dire totals of `metric` (e.g. `"gold_per_min"`),
/// each total being the per-minute rate scaled back over the match duration.
pub fn average_team_metric(data: &[MatchRecord], metric: &str) -> TeamMetricAverage {
    let mut matches = 0usize;
    let mut skipped = 0usize;
    let mut radiant_sum = 0.0;
    let mut dire_sum = 0.0;

    for record in data {
        let teams = determine_teams(&record.result);
        let duration = record.result.duration;
        let totals = calculate_per_min_metrics(teams.roster(Team::Radiant), duration, metric)
            .and_then(|r| {
                calculate_per_min_metrics(teams.roster(Team::Dire), duration, metric).map(|d| (r, d))
            });
        match totals {
            Ok((radiant, dire)) => {
                matches += 1;
                radiant_sum += radiant;
                dire_sum += dire;
            }
            Err(e) => {
                debug!("Match {}: {}", record.match_id(), e);
                skipped += 1;
            }
        }
    }

    let mean = |sum: f64| if matches == 0 { 0.0 } else { sum / matches as f64 };
    TeamMetricAverage {
        metric: metric.to_string(),
        matches,
        skipped,
        radiant: mean(radiant_sum),
        dire: mean(dire_sum),
    }
}

// ── Match averages ────────────────────────────────────────────────────────────

/// Mean duration and final kill scores over a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MatchAverages {
    pub duration_secs: u64,
    pub radiant_score: f64,
    pub dire_score: f64,
}

pub fn match_averages(data: &[MatchRecord]) -> MatchAverages {
    if data.is_empty() {
        return MatchAverages::default();
    }
    let n = data.len();
    let mut duration = 0u64;
    let (mut radiant, mut dire) = (0u64, 0u64);
    for record in data {
        duration += record.result.duration;
        let scores = team_scores(&record.result);
        radiant += u64::from(scores.radiant_score);
        dire += u64::from(scores.dire_score);
    }
    MatchAverages {
        duration_secs: duration / n as u64,
        radiant_score: radiant as f64 / n as f64,
        dire_score: dire as f64 / n as f64,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
