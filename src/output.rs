//! Disk-spilling shard output
//!
//! Each shard buffers at most `limit` matched rows in memory. A full buffer
//! is appended to the shard's private file, flushed and synced before it is
//! cleared, so peak memory does not grow with the size of the result.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::trace;

/// One verified match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub l_key: String,
    pub l_attrs: Vec<String>,
    pub r_key: String,
    pub r_attrs: Vec<String>,
    /// Edit distance, when requested. Missing-value pairs never carry one.
    pub score: Option<u64>,
}

/// Result of a finished shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardOutput {
    pub index: usize,
    pub path: PathBuf,
    pub rows: u64,
    pub flushes: u64,
}

pub struct SpillWriter {
    index: usize,
    path: PathBuf,
    writer: BufWriter<File>,
    buffer: Vec<OutputRow>,
    limit: usize,
    rows_written: u64,
    flushes: u64,
}

impl SpillWriter {
    /// Create (truncating) the shard file at `path`.
    pub fn create(index: usize, path: &Path, limit: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Failed to create shard file: {}", path.display()))?;

        Ok(Self {
            index,
            path: path.to_path_buf(),
            writer: BufWriter::with_capacity(1024 * 1024, file),
            buffer: Vec::with_capacity(limit.min(4096)),
            limit: limit.max(1),
            rows_written: 0,
            flushes: 0,
        })
    }

    /// Buffer a row, spilling once the buffer reaches the limit.
    pub fn push(&mut self, row: OutputRow) -> Result<()> {
        self.buffer.push(row);
        if self.buffer.len() >= self.limit {
            self.flush()?;
        }
        Ok(())
    }

    /// Append buffered rows to the shard file and sync it. No-op when the
    /// buffer is empty.
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let batch = self.buffer.len();
        for row in self.buffer.drain(..) {
            bincode::serialize_into(&mut self.writer, &row).with_context(|| {
                format!("Failed to write row to shard file: {}", self.path.display())
            })?;
        }
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush shard file: {}", self.path.display()))?;
        self.writer
            .get_ref()
            .sync_all()
            .with_context(|| format!("Failed to sync shard file: {}", self.path.display()))?;

        self.rows_written += batch as u64;
        self.flushes += 1;
        trace!(shard = self.index, batch, total = self.rows_written, "spilled rows");
        Ok(())
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn rows(&self) -> u64 {
        self.rows_written + self.buffer.len() as u64
    }

    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// Flush whatever is left and close the file.
    pub fn finish(mut self) -> Result<ShardOutput> {
        self.flush()?;
        Ok(ShardOutput {
            index: self.index,
            path: self.path,
            rows: self.rows_written,
            flushes: self.flushes,
        })
    }
}

/// Streams the rows of a finished shard file.
pub struct ShardReader {
    reader: BufReader<File>,
    path: PathBuf,
    remaining: u64,
}

impl ShardReader {
    pub fn open(shard: &ShardOutput) -> Result<Self> {
        let file = File::open(&shard.path)
            .with_context(|| format!("Failed to open shard file: {}", shard.path.display()))?;
        Ok(Self {
            reader: BufReader::with_capacity(1024 * 1024, file),
            path: shard.path.clone(),
            remaining: shard.rows,
        })
    }
}

impl Iterator for ShardReader {
    type Item = Result<OutputRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let row = bincode::deserialize_from(&mut self.reader)
            .with_context(|| format!("Failed to read row from shard file: {}", self.path.display()));
        if row.is_err() {
            self.remaining = 0;
        }
        Some(row)
    }
}
