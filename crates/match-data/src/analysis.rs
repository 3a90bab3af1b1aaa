//! Statistics report over a loaded dataset.
//!
//! Applies the requested filters, then runs every aggregate and bundles the
//! results into an [`AnalysisReport`] ready for printing or JSON output.

use std::fmt;

use chrono::Utc;
use match_core::formatting::{format_match_duration, format_number, format_percent};
use match_core::game_modes::GameModeTable;
use match_core::heroes::HeroList;
use match_core::models::Dataset;
use serde::Serialize;

use crate::aggregator::{
    average_team_metric, bucket_by_duration, game_mode_histogram, hero_winrates, match_averages,
    radiant_wins, DurationBand, DurationCounts, GameModeHistogram, HeroWinrate, MatchAverages,
    TeamMetricAverage, WinTally,
};
use crate::analyzer::{filter_bad_data, filter_by_game_mode, filter_by_hero};
use crate::reader::dedupe_by_match_id;

/// Per-minute metrics summarised by default.
pub const DEFAULT_METRICS: [&str; 2] = ["gold_per_min", "xp_per_min"];

// ── Public types ──────────────────────────────────────────────────────────────

/// Which subset of the dataset to analyze.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub game_mode: Option<u32>,
    pub hero: Option<u32>,
    /// Drop matches without an outcome before aggregating.
    pub skip_incomplete: bool,
    /// Drop repeated match ids before aggregating.
    pub dedupe: bool,
    /// Per-minute metrics to total per team; empty means [`DEFAULT_METRICS`].
    pub metrics: Vec<String>,
}

/// Metadata produced alongside the report.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Matches in the dataset before filtering.
    pub matches_loaded: usize,
    /// Matches left after filtering.
    pub matches_analyzed: usize,
    pub game_mode_filter: Option<u32>,
    pub hero_filter: Option<u32>,
}

/// Complete output of [`analyze_dataset`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metadata: AnalysisMetadata,
    pub radiant_wins: WinTally,
    pub game_modes: GameModeHistogram,
    pub durations: DurationCounts,
    pub averages: MatchAverages,
    pub team_metrics: Vec<TeamMetricAverage>,
    /// Present only when a hero list was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_winrates: Option<Vec<HeroWinrate>>,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Filter `data` per `options`, then compute every aggregate.
pub fn analyze_dataset(
    data: Dataset,
    modes: &GameModeTable,
    heroes: Option<&HeroList>,
    options: &AnalysisOptions,
) -> AnalysisReport {
    let matches_loaded = data.len();

    let mut data = if options.dedupe {
        dedupe_by_match_id(data)
    } else {
        data
    };
    if options.skip_incomplete {
        data = filter_bad_data(&data);
    }
    if let Some(mode) = options.game_mode {
        data = filter_by_game_mode(&data, mode);
    }
    if let Some(hero) = options.hero {
        data = filter_by_hero(&data, hero);
    }

    let metrics: Vec<String> = if options.metrics.is_empty() {
        DEFAULT_METRICS.iter().map(|m| m.to_string()).collect()
    } else {
        options.metrics.clone()
    };

    tracing::debug!(
        loaded = matches_loaded,
        analyzed = data.len(),
        "running aggregates"
    );

    AnalysisReport {
        metadata: AnalysisMetadata {
            generated_at: Utc::now().to_rfc3339(),
            matches_loaded,
            matches_analyzed: data.len(),
            game_mode_filter: options.game_mode,
            hero_filter: options.hero,
        },
        radiant_wins: radiant_wins(&data),
        game_modes: game_mode_histogram(&data, modes),
        durations: bucket_by_duration(&data).counts(),
        averages: match_averages(&data),
        team_metrics: metrics
            .iter()
            .map(|m| average_team_metric(&data, m))
            .collect(),
        hero_winrates: heroes.map(|h| hero_winrates(&data, h)),
    }
}

// ── Text rendering ────────────────────────────────────────────────────────────

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = &self.metadata;
        writeln!(
            f,
            "Matches: {} analyzed of {} loaded",
            meta.matches_analyzed, meta.matches_loaded
        )?;

        let tally = &self.radiant_wins;
        writeln!(f)?;
        writeln!(f, "Radiant results")?;
        writeln!(f, "  Wins: {}", tally.wins)?;
        writeln!(f, "  Losses: {}", tally.losses)?;
        writeln!(f, "  Errors: {}", tally.errors)?;
        writeln!(f, "  Total: {}", tally.total())?;
        writeln!(f, "  Radiant win rate: {}", format_percent(tally.win_percent()))?;

        writeln!(f)?;
        writeln!(f, "Game modes")?;
        for bucket in &self.game_modes.buckets {
            writeln!(f, "  {}: {}", bucket.label, bucket.count)?;
        }
        for (code, count) in &self.game_modes.unknown {
            writeln!(f, "  Unknown mode {}: {}", code, count)?;
        }
        writeln!(f, "  total {}", self.game_modes.total())?;

        writeln!(f)?;
        writeln!(f, "Durations")?;
        let d = &self.durations;
        for (band, count) in DurationBand::ALL.iter().zip([d.early, d.mid, d.late, d.ultra_late]) {
            writeln!(f, "  {} matches: {}", band.label(), count)?;
        }
        writeln!(
            f,
            "  Average duration: {}",
            format_match_duration(self.averages.duration_secs)
        )?;
        writeln!(
            f,
            "  Average score: Radiant {:.1}, Dire {:.1}",
            self.averages.radiant_score, self.averages.dire_score
        )?;

        if !self.team_metrics.is_empty() {
            writeln!(f)?;
            writeln!(f, "Team totals (average per match)")?;
            for m in &self.team_metrics {
                writeln!(
                    f,
                    "  {}: Radiant {}, Dire {} ({} matches, {} skipped)",
                    m.metric,
                    format_number(m.radiant, 0),
                    format_number(m.dire, 0),
                    m.matches,
                    m.skipped
                )?;
            }
        }

        if let Some(rates) = &self.hero_winrates {
            writeln!(f)?;
            writeln!(f, "Hero winrates")?;
            for r in rates.iter().filter(|r| r.matches > 0) {
                writeln!(
                    f,
                    "  {:>4} {:<24} {:>7} ({}/{})",
                    r.hero_id,
                    r.name,
                    format_percent(r.winrate),
                    r.wins,
                    r.matches
                )?;
            }
        }

        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
