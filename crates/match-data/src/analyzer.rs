//! Filters and per-match lookups over match records.
//!
//! Every function here is pure: inputs are borrowed and never modified, so
//! applying the same filter twice yields the same dataset.

use match_core::error::{MatchError, Result};
use match_core::models::{Dataset, MatchDetails, MatchRecord, Player, Team, TeamScores};
use tracing::debug;

// ── Filters ───────────────────────────────────────────────────────────────────

/// Matches played in game mode `mode`.
pub fn filter_by_game_mode(data: &[MatchRecord], mode: u32) -> Dataset {
    data.iter()
        .filter(|m| m.result.game_mode == mode)
        .cloned()
        .collect()
}

/// Matches in which `hero_id` was picked, each match at most once.
pub fn filter_by_hero(data: &[MatchRecord], hero_id: u32) -> Dataset {
    data.iter()
        .filter(|m| m.result.has_hero(hero_id))
        .cloned()
        .collect()
}

/// Every `(match, player)` pair where the player picked `hero_id`.
///
/// Unlike [`filter_by_hero`] a match can appear more than once if several of
/// its players picked the hero (custom lobbies allow duplicates).
pub fn hero_participations(data: &[MatchRecord], hero_id: u32) -> Vec<(&MatchRecord, &Player)> {
    data.iter()
        .flat_map(|m| {
            m.result
                .players
                .iter()
                .filter(move |p| p.hero_id == hero_id)
                .map(move |p| (m, p))
        })
        .collect()
}

/// Drop matches that have no `radiant_win` outcome.
///
/// These are generally matches aborted during the draft phase.
pub fn filter_bad_data(data: &[MatchRecord]) -> Dataset {
    let kept: Dataset = data
        .iter()
        .filter(|m| m.result.has_outcome())
        .cloned()
        .collect();
    debug!("Dropped {} matches without an outcome", data.len() - kept.len());
    kept
}

// ── Per-match lookups ─────────────────────────────────────────────────────────

/// Whether `hero_id` was on the winning side of `record`.
///
/// Errors with [`MatchError::HeroNotInMatch`] when nobody picked the hero and
/// [`MatchError::MissingOutcome`] when the match has no `radiant_win`.
pub fn did_hero_win_match(record: &MatchRecord, hero_id: u32) -> Result<bool> {
    let details = &record.result;
    let player = details
        .player_for_hero(hero_id)
        .ok_or(MatchError::HeroNotInMatch {
            hero_id,
            match_id: details.match_id,
        })?;
    let radiant_win = details
        .radiant_win
        .ok_or(MatchError::MissingOutcome(details.match_id))?;
    Ok(player.team().won(radiant_win))
}

/// Players of one match split by side.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamRosters<'a> {
    pub radiant: Vec<&'a Player>,
    pub dire: Vec<&'a Player>,
}

impl<'a> TeamRosters<'a> {
    pub fn roster(&self, team: Team) -> &[&'a Player] {
        match team {
            Team::Radiant => &self.radiant,
            Team::Dire => &self.dire,
        }
    }
}

/// Partition a match's players into Radiant (`player_slot <= 4`) and Dire.
pub fn determine_teams(details: &MatchDetails) -> TeamRosters<'_> {
    let (radiant, dire): (Vec<&Player>, Vec<&Player>) = details
        .players
        .iter()
        .partition(|p| p.team() == Team::Radiant);
    TeamRosters { radiant, dire }
}

/// Final scores of both sides.
pub fn team_scores(details: &MatchDetails) -> TeamScores {
    TeamScores {
        radiant_score: details.radiant_score,
        dire_score: details.dire_score,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
