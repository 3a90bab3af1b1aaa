//! Sequential match collection.
//!
//! Walks match IDs from a [`ScanStrategy`], fetching one match at a time from
//! a [`MatchSource`] and pausing a fixed delay after every request to stay
//! under the remote rate limit. Valid matches are streamed into the output
//! dataset; everything else is counted and skipped.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use match_core::error::{MatchError, Result};
use match_data::reader::{raw_match_id, read_raw_file};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backoff::BackoffPolicy;
use crate::client::{FetchOutcome, MatchSource};
use crate::writer::DatasetWriter;

/// Default pause after every request.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(2);

// ── Public types ──────────────────────────────────────────────────────────────

/// Which match IDs to try: `count` IDs from `start_id`, `stride` apart.
///
/// Sequential IDs are an approximation; not every ID is a valid public match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanStrategy {
    pub start_id: u64,
    pub stride: u64,
    pub count: usize,
}

impl ScanStrategy {
    pub fn sequential(start_id: u64, count: usize) -> Self {
        Self {
            start_id,
            stride: 1,
            count,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> {
        let ScanStrategy {
            start_id,
            stride,
            count,
        } = *self;
        (0..count as u64).map(move |i| start_id.saturating_add(i.saturating_mul(stride)))
    }
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub scan: ScanStrategy,
    pub outfile: PathBuf,
    /// Fixed pause after every request.
    pub request_delay: Duration,
    /// Pacing for 429 responses and connection failures.
    pub backoff: BackoffPolicy,
    /// Skip matches already present in the output.
    pub dedupe: bool,
}

/// Counts reported at the end of a collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    /// Match IDs tried; always `valid + invalid`.
    pub attempted: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Valid matches not written because the output already had them.
    pub duplicates: usize,
    /// 429 responses received (each one retried or counted invalid).
    pub rate_limited: usize,
    /// Records in the output file after the run.
    pub matches_loaded: usize,
    pub started_at: String,
    pub finished_at: String,
}

// ── Collector ─────────────────────────────────────────────────────────────────

pub struct Collector<S: MatchSource> {
    source: S,
    config: CollectorConfig,
}

impl<S: MatchSource> Collector<S> {
    pub fn new(source: S, config: CollectorConfig) -> Self {
        Self { source, config }
    }

    /// Run the whole scan.
    ///
    /// An unreachable service or a rejected API key aborts the run. Every
    /// match written before that stays in the output, which is a complete
    /// JSON array after each record.
    pub fn run(&mut self) -> Result<CollectionSummary> {
        let scan = self.config.scan;
        info!(
            start_id = scan.start_id,
            stride = scan.stride,
            count = scan.count,
            "Start collecting into {}",
            self.config.outfile.display()
        );

        let mut summary = CollectionSummary {
            started_at: Utc::now().to_rfc3339(),
            ..Default::default()
        };
        let mut writer = DatasetWriter::open(&self.config.outfile)?;

        for (n, match_id) in scan.ids().enumerate() {
            let outcome = match self.fetch_with_retry(match_id, &mut summary) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        attempted = summary.attempted,
                        valid = summary.valid,
                        invalid = summary.invalid,
                        "Aborting collection at match {}: {}",
                        match_id,
                        e
                    );
                    writer.finish()?;
                    return Err(e);
                }
            };
            summary.attempted += 1;
            debug!("Response {}: match {}", n + 1, match_id);

            match outcome {
                FetchOutcome::Match(body) => {
                    summary.valid += 1;
                    let id = raw_match_id(&body).unwrap_or(match_id);
                    if self.config.dedupe && writer.contains(id) {
                        summary.duplicates += 1;
                        debug!("Match {} already collected", id);
                    } else {
                        writer.push(id, &body)?;
                    }
                }
                FetchOutcome::Invalid(reason) => {
                    summary.invalid += 1;
                    debug!("Match {} invalid: {}", match_id, reason);
                }
                FetchOutcome::Malformed(reason) => {
                    summary.invalid += 1;
                    warn!("Match {} malformed response: {}", match_id, reason);
                }
                FetchOutcome::RateLimited { .. } => {
                    summary.invalid += 1;
                    warn!("Match {} still rate limited after retries", match_id);
                }
                FetchOutcome::Unauthorized(status) => {
                    writer.finish()?;
                    return Err(MatchError::Config(format!(
                        "API key rejected (HTTP {}) at match {}",
                        status, match_id
                    )));
                }
            }
        }

        writer.finish()?;
        summary.matches_loaded = read_raw_file(&self.config.outfile)?.len();
        summary.finished_at = Utc::now().to_rfc3339();

        info!("Matches loaded: {}", summary.matches_loaded);
        info!("Invalid match IDs: {}", summary.invalid);
        Ok(summary)
    }

    /// One logical attempt at `match_id`: the request plus any back-off
    /// retries for 429 responses and connection failures.
    fn fetch_with_retry(&mut self, match_id: u64, summary: &mut CollectionSummary) -> Result<FetchOutcome> {
        let backoff = self.config.backoff.clone();
        let mut attempt = 0u32;

        loop {
            let result = self.source.fetch_match(match_id);
            thread::sleep(self.config.request_delay);

            let retry = match &result {
                Ok(FetchOutcome::RateLimited { retry_after }) => {
                    summary.rate_limited += 1;
                    Some(*retry_after)
                }
                Err(e) => {
                    warn!(attempt, "Request for match {} failed: {}", match_id, e);
                    Some(None)
                }
                Ok(_) => None,
            };
            let Some(retry_after) = retry else {
                return result;
            };
            if attempt >= backoff.max_retries {
                return result;
            }

            let delay = backoff.delay(attempt, retry_after);
            debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off before retrying match {}", match_id);
            thread::sleep(delay);
            attempt += 1;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Scripted source: pops one response per request, then answers with a
    /// valid match for whatever ID is asked.
    #[derive(Default)]
    struct FakeSource {
        script: VecDeque<Result<FetchOutcome>>,
        requested: Vec<u64>,
    }

    impl FakeSource {
        fn scripted(script: Vec<Result<FetchOutcome>>) -> Self {
            Self {
                script: script.into(),
                requested: Vec::new(),
            }
        }
    }

    impl MatchSource for FakeSource {
        fn fetch_match(&mut self, match_id: u64) -> Result<FetchOutcome> {
            self.requested.push(match_id);
            self.script
                .pop_front()
                .unwrap_or_else(|| Ok(FetchOutcome::Match(body(match_id))))
        }
    }

    fn body(match_id: u64) -> Value {
        json!({
            "result": {
                "match_id": match_id,
                "radiant_win": true,
                "duration": 1500,
                "game_mode": 22,
                "players": []
            }
        })
    }

    fn config(dir: &TempDir, scan: ScanStrategy) -> CollectorConfig {
        CollectorConfig {
            scan,
            outfile: dir.path().join("match_data.json"),
            request_delay: Duration::ZERO,
            backoff: BackoffPolicy::immediate(2),
            dedupe: false,
        }
    }

    fn written_ids(path: &std::path::Path) -> Vec<u64> {
        read_raw_file(path)
            .unwrap()
            .iter()
            .filter_map(raw_match_id)
            .collect()
    }

    // ── ScanStrategy ──────────────────────────────────────────────────────────

    #[test]
    fn test_scan_strategy_ids() {
        let ids: Vec<u64> = ScanStrategy::sequential(100, 3).ids().collect();
        assert_eq!(ids, vec![100, 101, 102]);

        let strided = ScanStrategy {
            start_id: 10,
            stride: 5,
            count: 4,
        };
        assert_eq!(strided.ids().collect::<Vec<_>>(), vec![10, 15, 20, 25]);
        assert_eq!(ScanStrategy::sequential(1, 0).ids().count(), 0);
    }

    // ── Collector::run ────────────────────────────────────────────────────────

    #[test]
    fn test_run_all_valid() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, ScanStrategy::sequential(5000, 4));
        let outfile = cfg.outfile.clone();
        let mut collector = Collector::new(FakeSource::default(), cfg);

        let summary = collector.run().unwrap();
        assert_eq!(summary.attempted, 4);
        assert_eq!(summary.valid, 4);
        assert_eq!(summary.invalid, 0);
        assert_eq!(summary.matches_loaded, 4);
        assert_eq!(collector.source.requested, vec![5000, 5001, 5002, 5003]);
        assert_eq!(written_ids(&outfile), vec![5000, 5001, 5002, 5003]);
    }

    #[test]
    fn test_run_all_invalid_writes_empty_array() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, ScanStrategy::sequential(1, 3));
        let outfile = cfg.outfile.clone();
        let source = FakeSource::scripted(vec![
            Ok(FetchOutcome::Invalid("Match ID not found".into())),
            Ok(FetchOutcome::Malformed("missing 'result'".into())),
            Ok(FetchOutcome::Invalid("HTTP 500".into())),
        ]);
        let mut collector = Collector::new(source, cfg);

        let summary = collector.run().unwrap();
        assert_eq!((summary.valid, summary.invalid), (0, 3));
        assert_eq!(summary.valid + summary.invalid, summary.attempted);
        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&outfile).unwrap()).unwrap();
        assert_eq!(parsed, json!([]));
    }

    #[test]
    fn test_run_mixed_counts_and_strided_ids() {
        let dir = TempDir::new().unwrap();
        let scan = ScanStrategy {
            start_id: 10,
            stride: 3,
            count: 5,
        };
        let cfg = config(&dir, scan);
        let outfile = cfg.outfile.clone();
        let source = FakeSource::scripted(vec![
            Ok(FetchOutcome::Match(body(10))),
            Ok(FetchOutcome::Invalid("not found".into())),
            Ok(FetchOutcome::Match(body(16))),
            Ok(FetchOutcome::Malformed("bad".into())),
            Ok(FetchOutcome::Match(body(22))),
        ]);
        let mut collector = Collector::new(source, cfg);

        let summary = collector.run().unwrap();
        assert_eq!(collector.source.requested, vec![10, 13, 16, 19, 22]);
        assert_eq!((summary.attempted, summary.valid, summary.invalid), (5, 3, 2));
        assert_eq!(written_ids(&outfile), vec![10, 16, 22]);
    }

    #[test]
    fn test_run_retries_rate_limited_same_id() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, ScanStrategy::sequential(7, 2));
        let source = FakeSource::scripted(vec![
            Ok(FetchOutcome::RateLimited { retry_after: None }),
            Ok(FetchOutcome::RateLimited { retry_after: None }),
            Ok(FetchOutcome::Match(body(7))),
        ]);
        let mut collector = Collector::new(source, cfg);

        let summary = collector.run().unwrap();
        assert_eq!(collector.source.requested, vec![7, 7, 7, 8]);
        assert_eq!(summary.rate_limited, 2);
        assert_eq!((summary.attempted, summary.valid, summary.invalid), (2, 2, 0));
    }

    #[test]
    fn test_run_rate_limited_past_retries_counts_invalid() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, ScanStrategy::sequential(7, 2));
        let source = FakeSource::scripted(vec![
            Ok(FetchOutcome::RateLimited { retry_after: None }),
            Ok(FetchOutcome::RateLimited { retry_after: None }),
            Ok(FetchOutcome::RateLimited { retry_after: None }),
        ]);
        let mut collector = Collector::new(source, cfg);

        let summary = collector.run().unwrap();
        assert_eq!(collector.source.requested, vec![7, 7, 7, 8]);
        assert_eq!(summary.rate_limited, 3);
        assert_eq!((summary.attempted, summary.valid, summary.invalid), (2, 1, 1));
    }

    #[test]
    fn test_run_recovers_from_transient_connection_failure() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, ScanStrategy::sequential(1, 1));
        let source = FakeSource::scripted(vec![Err(MatchError::Request("connection reset".into()))]);
        let mut collector = Collector::new(source, cfg);

        let summary = collector.run().unwrap();
        assert_eq!(collector.source.requested, vec![1, 1]);
        assert_eq!(summary.valid, 1);
    }

    #[test]
    fn test_run_unreachable_service_aborts_with_valid_output() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, ScanStrategy::sequential(1, 5));
        let outfile = cfg.outfile.clone();
        let down = || -> Result<FetchOutcome> { Err(MatchError::Request("connection refused".into())) };
        let source = FakeSource::scripted(vec![
            Ok(FetchOutcome::Match(body(1))),
            down(),
            down(),
            down(),
        ]);
        let mut collector = Collector::new(source, cfg);

        let err = collector.run().unwrap_err();
        assert!(matches!(err, MatchError::Request(_)));
        assert_eq!(collector.source.requested, vec![1, 2, 2, 2]);
        assert_eq!(written_ids(&outfile), vec![1]);
    }

    #[test]
    fn test_run_appends_to_existing_output() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, ScanStrategy::sequential(3, 2));
        let outfile = cfg.outfile.clone();
        std::fs::write(&outfile, serde_json::to_string(&vec![body(1), body(2)]).unwrap()).unwrap();

        let summary = Collector::new(FakeSource::default(), cfg).run().unwrap();
        assert_eq!(summary.valid, 2);
        assert_eq!(summary.matches_loaded, 4);
        assert_eq!(written_ids(&outfile), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_run_dedupe_skips_known_ids() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, ScanStrategy::sequential(2, 3));
        cfg.dedupe = true;
        let outfile = cfg.outfile.clone();
        std::fs::write(&outfile, serde_json::to_string(&vec![body(1), body(2)]).unwrap()).unwrap();

        let summary = Collector::new(FakeSource::default(), cfg).run().unwrap();
        assert_eq!((summary.attempted, summary.valid, summary.duplicates), (3, 3, 1));
        assert_eq!(written_ids(&outfile), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_run_without_dedupe_appends_duplicates() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, ScanStrategy::sequential(2, 1));
        let outfile = cfg.outfile.clone();
        std::fs::write(&outfile, serde_json::to_string(&vec![body(2)]).unwrap()).unwrap();

        let summary = Collector::new(FakeSource::default(), cfg).run().unwrap();
        assert_eq!(summary.duplicates, 0);
        assert_eq!(written_ids(&outfile), vec![2, 2]);
    }

    #[test]
    fn test_run_rejected_key_aborts() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, ScanStrategy::sequential(1, 5000));
        let outfile = cfg.outfile.clone();
        let source = FakeSource::scripted(vec![
            Ok(FetchOutcome::Match(body(1))),
            Ok(FetchOutcome::Unauthorized(403)),
        ]);
        let mut collector = Collector::new(source, cfg);

        let err = collector.run().unwrap_err();
        assert!(matches!(err, MatchError::Config(_)));
        assert!(err.to_string().contains("HTTP 403"));
        assert_eq!(collector.source.requested, vec![1, 2]);
        assert_eq!(written_ids(&outfile), vec![1]);
    }

    /// Answers valid matches, then panics as if the process were killed.
    struct DyingSource {
        remaining: usize,
    }

    impl MatchSource for DyingSource {
        fn fetch_match(&mut self, match_id: u64) -> Result<FetchOutcome> {
            if self.remaining == 0 {
                panic!("collector process killed");
            }
            self.remaining -= 1;
            Ok(FetchOutcome::Match(body(match_id)))
        }
    }

    #[test]
    fn test_run_interrupted_keeps_collected_matches() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, ScanStrategy::sequential(100, 50));
        let outfile = cfg.outfile.clone();
        std::fs::write(&outfile, serde_json::to_string(&vec![body(1)]).unwrap()).unwrap();

        let mut collector = Collector::new(DyingSource { remaining: 5 }, cfg);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| collector.run()));
        assert!(result.is_err());

        assert_eq!(written_ids(&outfile), vec![1, 100, 101, 102, 103, 104]);
    }

    #[test]
    fn test_run_sleeps_after_every_request() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, ScanStrategy::sequential(1, 3));
        cfg.request_delay = Duration::from_millis(40);
        let source = FakeSource::scripted(vec![
            Ok(FetchOutcome::Invalid("not found".into())),
            Ok(FetchOutcome::Match(body(2))),
            Ok(FetchOutcome::Malformed("bad".into())),
        ]);

        let started = std::time::Instant::now();
        let summary = Collector::new(source, cfg).run().unwrap();
        assert_eq!(summary.attempted, 3);
        assert!(started.elapsed() >= Duration::from_millis(120));
    }
}
