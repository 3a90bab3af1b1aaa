//! Streaming JSON-array output for the collector.
//!
//! Records are written as they arrive instead of being buffered. The closing
//! bracket is rewritten after every element, so the file on disk is a
//! complete JSON array between any two records and an interrupted run keeps
//! everything collected so far.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use match_core::error::{MatchError, Result};
use match_data::reader::raw_match_id;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

// ── JsonArrayWriter ───────────────────────────────────────────────────────────

/// Writes `[a,b,...]` element by element, keeping the array closed.
///
/// Each push seeks back over the trailing `]` and writes `,element]` in one
/// call.
pub struct JsonArrayWriter<W: Write + Seek> {
    inner: W,
    first_emitted: bool,
    count: usize,
}

impl<W: Write + Seek> JsonArrayWriter<W> {
    /// Start an empty array; writes `[]`.
    pub fn begin(mut inner: W) -> std::io::Result<Self> {
        inner.write_all(b"[]")?;
        inner.flush()?;
        Ok(Self {
            inner,
            first_emitted: false,
            count: 0,
        })
    }

    /// Continue an array of `existing` elements whose last byte is `]`.
    pub fn resume(inner: W, existing: usize) -> Self {
        Self {
            inner,
            first_emitted: existing > 0,
            count: existing,
        }
    }

    pub fn push<T: Serialize + ?Sized>(&mut self, element: &T) -> std::io::Result<()> {
        let mut chunk = Vec::with_capacity(256);
        if self.first_emitted {
            chunk.push(b',');
        }
        serde_json::to_writer(&mut chunk, element).map_err(std::io::Error::from)?;
        chunk.push(b']');

        self.inner.seek(SeekFrom::End(-1))?;
        self.inner.write_all(&chunk)?;
        self.inner.flush()?;
        self.first_emitted = true;
        self.count += 1;
        Ok(())
    }

    /// Elements in the array, including resumed ones.
    pub fn written(&self) -> usize {
        self.count
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> std::io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

// ── DatasetWriter ─────────────────────────────────────────────────────────────

/// Appends records to a dataset file in place.
///
/// Records already in the file are kept, so the dataset grows monotonically
/// across runs.
pub struct DatasetWriter {
    path: PathBuf,
    array: JsonArrayWriter<File>,
    known_ids: HashSet<u64>,
}

impl DatasetWriter {
    /// Open `path` for appending, creating `[]` if it is absent or blank.
    ///
    /// An existing file that is not a JSON array is rejected untouched.
    pub fn open(path: &Path) -> Result<Self> {
        let write_err = |source| MatchError::FileWrite {
            path: path.to_path_buf(),
            source,
        };

        let existing = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| MatchError::FileRead {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            String::new()
        };
        let existing = existing.trim_end();

        if existing.trim_start().is_empty() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
            let file = File::create(path).map_err(write_err)?;
            let array = JsonArrayWriter::begin(file).map_err(write_err)?;
            debug!("Created {}", path.display());
            return Ok(Self {
                path: path.to_path_buf(),
                array,
                known_ids: HashSet::new(),
            });
        }

        let records: Vec<Value> = serde_json::from_str(existing)?;
        let known_ids: HashSet<u64> = records.iter().filter_map(raw_match_id).collect();

        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(write_err)?;
        // Drop trailing whitespace so the file ends with `]`.
        file.set_len(existing.len() as u64).map_err(write_err)?;

        debug!(
            "Opened {} with {} existing records",
            path.display(),
            records.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            array: JsonArrayWriter::resume(file, records.len()),
            known_ids,
        })
    }

    /// Whether a record with `match_id` is already in the output.
    pub fn contains(&self, match_id: u64) -> bool {
        self.known_ids.contains(&match_id)
    }

    /// Append `record`; the file is a complete array again on return.
    pub fn push<T: Serialize + ?Sized>(&mut self, match_id: u64, record: &T) -> Result<()> {
        self.array.push(record).map_err(|source| MatchError::FileWrite {
            path: self.path.clone(),
            source,
        })?;
        self.known_ids.insert(match_id);
        Ok(())
    }

    /// Sync the file to disk. Returns the total record count.
    pub fn finish(self) -> Result<usize> {
        let total = self.array.written();
        let path = self.path;
        let file = self.array.finish().map_err(|source| MatchError::FileWrite {
            path: path.clone(),
            source,
        })?;
        file.sync_all()
            .map_err(|source| MatchError::FileWrite { path, source })?;
        Ok(total)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
