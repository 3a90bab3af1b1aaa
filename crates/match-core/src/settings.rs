use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Steam Web API match-details endpoint.
pub const DEFAULT_MATCH_DETAILS_URL: &str =
    "https://api.steampowered.com/IDOTA2Match_570/GetMatchDetails/v1/";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Collect and analyze Dota 2 match data
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dota-matches",
    about = "Collect and analyze Dota 2 match data",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,

    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path (logs go to stderr when omitted)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fetch matches by scanning sequential match IDs
    Collect(CollectArgs),
    /// Print statistics for one or more dataset files
    Analyze(AnalyzeArgs),
    /// Append a newly collected dataset to the current one
    Merge(MergeArgs),
}

// ── collect ────────────────────────────────────────────────────────────────────

#[derive(Args, Debug, Clone)]
pub struct CollectArgs {
    /// Steam Web API key
    #[arg(long, short = 'k', env = "STEAM_API_KEY", hide_env_values = true)]
    pub key: String,

    /// Starting match ID for lookup cycle
    #[arg(long, short = 'm')]
    pub match_id: u64,

    /// Number of matches to collect
    #[arg(long, short = 'n', default_value = "5000")]
    pub num_matches: usize,

    /// Data output file
    #[arg(long, short = 'o', default_value = "match_data.json")]
    pub outfile: PathBuf,

    /// Increment between consecutive match IDs
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    pub stride: u64,

    /// Pause after every request, in milliseconds
    #[arg(long, default_value = "2000")]
    pub delay_ms: u64,

    /// HTTP request timeout in seconds (1-600)
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout_secs: u64,

    /// Retries per match ID on rate limiting or connection failures
    #[arg(long, default_value = "5")]
    pub max_retries: u32,

    /// Skip matches whose ID is already in the output file
    #[arg(long)]
    pub dedupe: bool,

    /// Match-details endpoint
    #[arg(long, default_value = DEFAULT_MATCH_DETAILS_URL)]
    pub base_url: String,
}

// ── analyze ────────────────────────────────────────────────────────────────────

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Dataset files, or directories to search for `*.json` files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Hero reference list; enables the hero winrate table
    #[arg(long)]
    pub heroes: Option<PathBuf>,

    /// Game-mode label table overriding the built-in one
    #[arg(long)]
    pub game_modes: Option<PathBuf>,

    /// Only analyze matches of this game-mode code
    #[arg(long)]
    pub game_mode: Option<u32>,

    /// Only analyze matches featuring this hero ID
    #[arg(long)]
    pub hero: Option<u32>,

    /// Drop matches without an outcome before aggregating
    #[arg(long)]
    pub skip_incomplete: bool,

    /// Drop repeated match IDs (first occurrence wins)
    #[arg(long)]
    pub dedupe: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

// ── merge ──────────────────────────────────────────────────────────────────────

#[derive(Args, Debug, Clone)]
pub struct MergeArgs {
    /// Dataset that receives the new records
    pub current: PathBuf,

    /// Newly collected dataset; emptied after a successful merge
    pub new: PathBuf,

    /// Leave the new dataset untouched
    #[arg(long)]
    pub keep_new: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments.
    pub fn load() -> Self {
        Self::load_from(std::env::args_os())
    }

    /// Parse an explicit argument list and apply the `--debug` override.
    pub fn load_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_args(settings: Settings) -> CollectArgs {
        match settings.command {
            Command::Collect(args) => args,
            other => panic!("expected collect, got {:?}", other),
        }
    }

    #[test]
    fn test_collect_defaults() {
        let settings = Settings::load_from(["dota-matches", "collect", "-k", "KEY", "-m", "5000012926"]);
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());

        let args = collect_args(settings);
        assert_eq!(args.key, "KEY");
        assert_eq!(args.match_id, 5_000_012_926);
        assert_eq!(args.num_matches, 5000);
        assert_eq!(args.outfile, PathBuf::from("match_data.json"));
        assert_eq!(args.stride, 1);
        assert_eq!(args.delay_ms, 2000);
        assert_eq!(args.timeout_secs, 30);
        assert_eq!(args.max_retries, 5);
        assert!(!args.dedupe);
        assert_eq!(args.base_url, DEFAULT_MATCH_DETAILS_URL);
    }

    #[test]
    fn test_collect_long_flags() {
        let settings = Settings::load_from([
            "dota-matches",
            "collect",
            "--key",
            "KEY",
            "--match-id",
            "10",
            "--num-matches",
            "3",
            "--outfile",
            "out.json",
            "--stride",
            "2",
            "--dedupe",
        ]);
        let args = collect_args(settings);
        assert_eq!(args.num_matches, 3);
        assert_eq!(args.outfile, PathBuf::from("out.json"));
        assert_eq!(args.stride, 2);
        assert!(args.dedupe);
    }

    #[test]
    fn test_collect_requires_match_id() {
        let result = Settings::try_parse_from(["dota-matches", "collect", "-k", "KEY"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_collect_rejects_zero_stride() {
        let result = Settings::try_parse_from([
            "dota-matches", "collect", "-k", "KEY", "-m", "1", "--stride", "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let settings = Settings::load_from(["dota-matches", "--debug", "merge", "a.json", "b.json"]);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_analyze_args() {
        let settings = Settings::load_from([
            "dota-matches",
            "analyze",
            "data/",
            "extra.json",
            "--heroes",
            "heroes.json",
            "--game-mode",
            "22",
            "--json",
        ]);
        match settings.command {
            Command::Analyze(args) => {
                assert_eq!(args.inputs.len(), 2);
                assert_eq!(args.heroes, Some(PathBuf::from("heroes.json")));
                assert_eq!(args.game_mode, Some(22));
                assert!(args.hero.is_none());
                assert!(args.json);
                assert!(!args.skip_incomplete);
            }
            other => panic!("expected analyze, got {:?}", other),
        }
    }

    #[test]
    fn test_analyze_requires_input() {
        assert!(Settings::try_parse_from(["dota-matches", "analyze"]).is_err());
    }

    #[test]
    fn test_merge_args() {
        let settings = Settings::load_from(["dota-matches", "merge", "cur.json", "new.json", "--keep-new"]);
        match settings.command {
            Command::Merge(args) => {
                assert_eq!(args.current, PathBuf::from("cur.json"));
                assert_eq!(args.new, PathBuf::from("new.json"));
                assert!(args.keep_new);
            }
            other => panic!("expected merge, got {:?}", other),
        }
    }
}
