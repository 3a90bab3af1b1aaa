use std::collections::BTreeMap;

use crate::error::{MatchError, Result};
use crate::models::{Player, ROSTER_SIZE};

/// Hero id → win percentage (0–100).
pub type WinrateTable = BTreeMap<u32, f64>;

/// `wins / total_matches * 100`.
///
/// Returns `0.0` when `total_matches` is zero.
pub fn calculate_win_percent(total_matches: usize, wins: usize) -> f64 {
    if total_matches == 0 {
        return 0.0;
    }
    (wins as f64 / total_matches as f64) * 100.0
}

/// Team total of a per-minute metric over the whole match.
///
/// Each player's rate is converted to a per-second rate and multiplied by
/// `duration_secs`, i.e. `Σ (value / 60) * duration`.
pub fn calculate_per_min_metrics(
    team_roster: &[&Player],
    duration_secs: u64,
    metric: &str,
) -> Result<f64> {
    let mut metric_total = 0.0;

    for player in team_roster {
        let per_minute = player
            .metric(metric)
            .ok_or_else(|| MatchError::MissingMetric {
                hero_id: player.hero_id,
                metric: metric.to_string(),
            })?;
        metric_total += (per_minute / 60.0) * duration_secs as f64;
    }

    Ok(metric_total)
}

/// Average hero winrate of a roster.
///
/// The sum is always divided by [`ROSTER_SIZE`], so a short roster pulls the
/// average down.
pub fn calculate_winrate_average(team_roster: &[&Player], winrates: &WinrateTable) -> Result<f64> {
    let mut winrate = 0.0;
    for player in team_roster {
        winrate += winrates
            .get(&player.hero_id)
            .ok_or(MatchError::HeroNotInTable(player.hero_id))?;
    }
    Ok(winrate / ROSTER_SIZE as f64)
}
