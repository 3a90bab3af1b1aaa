mod bootstrap;

use std::time::Duration;

use anyhow::{Context, Result};
use match_core::formatting::format_number;
use match_core::game_modes::GameModeTable;
use match_core::heroes::HeroList;
use match_core::settings::{AnalyzeArgs, CollectArgs, Command, MergeArgs, Settings};
use match_data::analysis::{analyze_dataset, AnalysisOptions};
use match_data::reader::{combine_data, load_datasets};
use match_runtime::backoff::BackoffPolicy;
use match_runtime::client::{ClientConfig, SteamMatchClient};
use match_runtime::collector::{Collector, CollectorConfig, ScanStrategy};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("dota-matches v{} starting", env!("CARGO_PKG_VERSION"));

    match settings.command {
        Command::Collect(args) => run_collect(args),
        Command::Analyze(args) => run_analyze(args),
        Command::Merge(args) => run_merge(args),
    }
}

fn run_collect(args: CollectArgs) -> Result<()> {
    let client = SteamMatchClient::new(&ClientConfig {
        base_url: args.base_url.clone(),
        api_key: args.key.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
        connect_timeout: CONNECT_TIMEOUT.min(Duration::from_secs(args.timeout_secs)),
    })?;

    let config = CollectorConfig {
        scan: ScanStrategy {
            start_id: args.match_id,
            stride: args.stride,
            count: args.num_matches,
        },
        outfile: args.outfile.clone(),
        request_delay: Duration::from_millis(args.delay_ms),
        backoff: BackoffPolicy::new(args.max_retries),
        dedupe: args.dedupe,
    };

    let summary = Collector::new(client, config)
        .run()
        .with_context(|| format!("collecting into {}", args.outfile.display()))?;

    println!("Matches attempted: {}", count(summary.attempted));
    println!("Matches loaded: {}", count(summary.matches_loaded));
    println!("Valid matches: {}", count(summary.valid));
    println!("Invalid match IDs: {}", count(summary.invalid));
    if args.dedupe {
        println!("Duplicates skipped: {}", count(summary.duplicates));
    }
    if summary.rate_limited > 0 {
        println!("Rate-limited responses: {}", count(summary.rate_limited));
    }
    Ok(())
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let data = load_datasets(&args.inputs).context("loading datasets")?;

    let modes = match &args.game_modes {
        Some(path) => GameModeTable::from_json_file(path)?,
        None => GameModeTable::default(),
    };
    let heroes = args
        .heroes
        .as_deref()
        .map(HeroList::from_json_file)
        .transpose()?;

    let options = AnalysisOptions {
        game_mode: args.game_mode,
        hero: args.hero,
        skip_incomplete: args.skip_incomplete,
        dedupe: args.dedupe,
        metrics: Vec::new(),
    };
    let report = analyze_dataset(data, &modes, heroes.as_ref(), &options);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

fn count(n: usize) -> String {
    format_number(n as f64, 0)
}

fn run_merge(args: MergeArgs) -> Result<()> {
    let summary = combine_data(&args.current, &args.new, args.keep_new)
        .with_context(|| format!("merging {} into {}", args.new.display(), args.current.display()))?;

    println!("Current data size: {}", count(summary.current));
    println!("New data size: {}", count(summary.new));
    println!("Combined data size: {}", count(summary.combined));
    Ok(())
}
