//! Merge stage
//!
//! Runs after every shard has finished. Shard files are streamed in shard
//! index order into a single CSV artifact, each row getting the next `_id`,
//! and each shard file is deleted once its rows are in the artifact.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::output::{OutputRow, ShardOutput, ShardReader};

pub const ID_COLUMN: &str = "_id";
pub const SCORE_COLUMN: &str = "_sim_score";

/// Column names of the artifact, `_id` first.
pub fn output_header(
    l_key_attr: &str,
    l_out_attrs: &[String],
    l_prefix: &str,
    r_key_attr: &str,
    r_out_attrs: &[String],
    r_prefix: &str,
    with_score: bool,
) -> Vec<String> {
    let mut header = Vec::with_capacity(3 + l_out_attrs.len() + r_out_attrs.len());
    header.push(ID_COLUMN.to_string());
    header.push(format!("{}{}", l_prefix, l_key_attr));
    header.extend(l_out_attrs.iter().map(|a| format!("{}{}", l_prefix, a)));
    header.push(format!("{}{}", r_prefix, r_key_attr));
    header.extend(r_out_attrs.iter().map(|a| format!("{}{}", r_prefix, a)));
    if with_score {
        header.push(SCORE_COLUMN.to_string());
    }
    header
}

/// Single writer for the merged artifact.
pub struct ArtifactWriter {
    path: PathBuf,
    writer: csv::Writer<BufWriter<File>>,
    with_score: bool,
    next_id: u64,
    fields: Vec<String>,
}

impl ArtifactWriter {
    pub fn create(path: &Path, header: &[String], with_score: bool) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(BufWriter::with_capacity(1024 * 1024, file));
        writer
            .write_record(header)
            .with_context(|| format!("Failed to write header to: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            with_score,
            next_id: 0,
            fields: Vec::with_capacity(header.len()),
        })
    }

    /// Write one row with the next sequential id; returns that id.
    pub fn append(&mut self, row: &OutputRow) -> Result<u64> {
        let id = self.next_id;
        self.fields.clear();
        self.fields.push(id.to_string());
        self.fields.push(row.l_key.clone());
        self.fields.extend(row.l_attrs.iter().cloned());
        self.fields.push(row.r_key.clone());
        self.fields.extend(row.r_attrs.iter().cloned());
        if self.with_score {
            self.fields
                .push(row.score.map(|s| s.to_string()).unwrap_or_default());
        }
        self.writer
            .write_record(&self.fields)
            .with_context(|| format!("Failed to write row {} to: {}", id, self.path.display()))?;
        self.next_id += 1;
        Ok(id)
    }

    /// Copy a shard file into the artifact and delete it. Returns the
    /// number of rows copied.
    pub fn merge_shard(&mut self, shard: &ShardOutput) -> Result<u64> {
        let mut copied = 0u64;
        for row in ShardReader::open(shard)? {
            self.append(&row?)?;
            copied += 1;
        }
        std::fs::remove_file(&shard.path)
            .with_context(|| format!("Failed to remove shard file: {}", shard.path.display()))?;
        debug!(shard = shard.index, rows = copied, "merged shard");
        Ok(copied)
    }

    pub fn rows(&self) -> u64 {
        self.next_id
    }

    /// Flush the artifact; returns the total number of rows written.
    pub fn finish(mut self) -> Result<u64> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush output file: {}", self.path.display()))?;
        Ok(self.next_id)
    }
}

/// Merge shard files, in the order given, into a new artifact at `dest`.
pub fn merge_shards(
    shards: &[ShardOutput],
    header: &[String],
    with_score: bool,
    dest: &Path,
) -> Result<u64> {
    let mut artifact = ArtifactWriter::create(dest, header, with_score)?;
    for shard in shards {
        artifact.merge_shard(shard)?;
    }
    artifact.finish()
}

/// A row of the merged artifact, read back as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRow {
    pub id: u64,
    pub fields: Vec<String>,
}

/// Read a merged artifact back; returns the header and the rows.
pub fn read_artifact(path: &Path) -> Result<(Vec<String>, Vec<ArtifactRow>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open output file: {}", path.display()))?;
    let header: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of: {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("Failed to read row of: {}", path.display()))?;
        let mut fields = record.iter().map(str::to_string);
        let id = fields
            .next()
            .unwrap_or_default()
            .parse::<u64>()
            .with_context(|| format!("Malformed {} column in: {}", ID_COLUMN, path.display()))?;
        rows.push(ArtifactRow {
            id,
            fields: fields.collect(),
        });
    }
    Ok((header, rows))
}
