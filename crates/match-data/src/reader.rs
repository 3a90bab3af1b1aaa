//! Dataset file discovery, loading and merging.
//!
//! A dataset file is a single JSON array of match objects. An empty (or
//! whitespace-only) file is read as an empty dataset.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use match_core::error::{MatchError, Result};
use match_core::models::{Dataset, MatchRecord};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// Expand `input` into dataset files.
///
/// A file path is returned as-is; a directory is searched recursively for
/// `*.json` files, sorted by path.
pub fn find_dataset_files(input: &Path) -> Vec<PathBuf> {
    if !input.exists() {
        warn!("Data path does not exist: {}", input.display());
        return Vec::new();
    }
    if input.is_file() {
        return vec![input.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "json")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Read a dataset file into typed match records.
///
/// Records without the match shape (kept verbatim by [`combine_data`]) are
/// skipped with a warning rather than failing the whole file.
pub fn read_file(path: &Path) -> Result<Dataset> {
    let raw = read_raw_file(path)?;
    let total = raw.len();
    let mut skipped = 0usize;

    let mut dataset = Dataset::with_capacity(total);
    for (index, record) in raw.into_iter().enumerate() {
        match serde_json::from_value::<MatchRecord>(record) {
            Ok(parsed) => dataset.push(parsed),
            Err(e) => {
                debug!("Skipping record {} in {}: {}", index, path.display(), e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!(
            "Skipped {} of {} records in {} that are not matches",
            skipped,
            total,
            path.display()
        );
    }
    Ok(dataset)
}

/// Read a dataset file as untyped JSON values, keeping every record verbatim
/// whether or not it has the match shape.
pub fn read_raw_file(path: &Path) -> Result<Vec<Value>> {
    let content = read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&content)?)
}

/// Load and concatenate every dataset reachable from `inputs`, in order.
pub fn load_datasets(inputs: &[PathBuf]) -> Result<Dataset> {
    let mut dataset = Dataset::new();
    let mut files_read = 0usize;

    for input in inputs {
        for file in find_dataset_files(input) {
            let records = read_file(&file)?;
            debug!("Loaded {} matches from {}", records.len(), file.display());
            dataset.extend(records);
            files_read += 1;
        }
    }

    if files_read == 0 {
        warn!("No dataset files found");
    }
    debug!("Loaded {} matches from {} files", dataset.len(), files_read);
    Ok(dataset)
}

/// Keep the first record for every `match_id`, preserving order.
pub fn dedupe_by_match_id(dataset: Dataset) -> Dataset {
    let before = dataset.len();
    let mut seen: HashSet<u64> = HashSet::new();
    let deduped: Dataset = dataset
        .into_iter()
        .filter(|record| seen.insert(record.match_id()))
        .collect();
    if deduped.len() != before {
        debug!("Dropped {} duplicate matches", before - deduped.len());
    }
    deduped
}

/// `result.match_id` of an untyped record, if present.
pub fn raw_match_id(record: &Value) -> Option<u64> {
    record.pointer("/result/match_id").and_then(Value::as_u64)
}

/// Record counts produced by [`combine_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub current: usize,
    pub new: usize,
    pub combined: usize,
}

/// Append the records of `new_file` to `current_file`.
///
/// The combined array replaces `current_file` atomically. Unless `keep_new`
/// is set, `new_file` is then reset to an empty array so the same records are
/// not merged twice.
pub fn combine_data(current_file: &Path, new_file: &Path, keep_new: bool) -> Result<MergeSummary> {
    let current = if current_file.exists() {
        read_raw_file(current_file)?
    } else {
        Vec::new()
    };
    let new = read_raw_file(new_file)?;

    info!("Current data size: {}", current.len());
    info!("New data size: {}", new.len());

    let summary = MergeSummary {
        current: current.len(),
        new: new.len(),
        combined: current.len() + new.len(),
    };

    let mut combined = current;
    combined.extend(new);
    write_json_atomic(current_file, &combined)?;

    info!("Combined data size: {}", summary.combined);

    if !keep_new {
        write_json_atomic(new_file, &Vec::<Value>::new())?;
    }

    Ok(summary)
}

/// Serialize `value` to a sibling temp file, then rename it over `path`.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let write_err = |source| MatchError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = serde_json::to_string(value)?;
    let tmp = temp_path_for(path);
    std::fs::write(&tmp, json).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}

/// Sibling path used while a dataset file is being rewritten.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| MatchError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
