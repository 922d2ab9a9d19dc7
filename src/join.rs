//! Edit distance join entry point

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::config::JoinConfig;
use crate::error::JoinError;
use crate::merge::{output_header, ArtifactWriter};
use crate::missing::append_missing_pairs;
use crate::output::ShardOutput;
use crate::record::Collection;
use crate::shard::{remove_if_present, resolve_workers, run_shards};

/// What a finished join produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSummary {
    pub output_path: PathBuf,
    /// Rows in the artifact, missing-value pairs included.
    pub total_rows: u64,
    /// Rows contributed by each shard, in shard order.
    pub shard_rows: Vec<u64>,
    pub missing_rows: u64,
    pub workers: usize,
    /// Spill operations across all shards.
    pub flushes: u64,
}

/// Check every precondition before any work starts.
pub fn validate_join(
    left: &Collection,
    right: &Collection,
    config: &JoinConfig,
) -> Result<(), JoinError> {
    config.validate()?;
    left.validate()?;
    right.validate()?;
    Ok(())
}

/// Find all (left, right) pairs whose join values satisfy
/// `edit_distance <comp_op> floor(threshold)`, writing them to
/// `config.output_path()`.
///
/// The result is approximate by construction: a pair is only found when the
/// two strings share a q-gram inside their rarest-first prefixes, so very
/// short strings whose q-grams all differ are never reported.
pub fn edit_distance_join(
    left: &Collection,
    right: &Collection,
    config: &JoinConfig,
) -> Result<JoinSummary> {
    validate_join(left, right, config)?;
    let left = left.without_key_in_out_attrs();
    let right = right.without_key_in_out_attrs();
    let (left, right) = (&*left, &*right);

    let threshold = config.integer_threshold();
    let workers = resolve_workers(config.n_jobs, right.len());
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;

    let start = Instant::now();
    info!(
        left = left.len(),
        right = right.len(),
        threshold,
        comp_op = %config.comp_op,
        workers,
        "starting edit distance join"
    );

    let shards = run_shards(left, right, config, threshold, workers)?;
    let flushes = shards.iter().map(|s| s.flushes).sum();

    let header = output_header(
        &left.key_attr,
        &left.out_attrs,
        &config.l_out_prefix,
        &right.key_attr,
        &right.out_attrs,
        &config.r_out_prefix,
        config.out_sim_score,
    );
    let output_path = config.output_path();

    let mut shard_rows = Vec::with_capacity(shards.len());
    let mut artifact = match merge_all(&output_path, &header, config, &shards, &mut shard_rows) {
        Ok(artifact) => artifact,
        Err(e) => {
            for shard in &shards {
                remove_if_present(&shard.path);
            }
            return Err(e);
        }
    };

    let missing_rows = if config.allow_missing {
        append_missing_pairs(&mut artifact, left, right)?
    } else {
        0
    };
    let total_rows = artifact.finish()?;

    info!(
        rows = total_rows,
        missing = missing_rows,
        elapsed_ms = start.elapsed().as_millis() as u64,
        path = %output_path.display(),
        "edit distance join complete"
    );

    Ok(JoinSummary {
        output_path,
        total_rows,
        shard_rows,
        missing_rows,
        workers,
        flushes,
    })
}

fn merge_all(
    output_path: &Path,
    header: &[String],
    config: &JoinConfig,
    shards: &[ShardOutput],
    shard_rows: &mut Vec<u64>,
) -> Result<ArtifactWriter> {
    let mut artifact = ArtifactWriter::create(output_path, header, config.out_sim_score)?;
    for shard in shards {
        shard_rows.push(artifact.merge_shard(shard)?);
    }
    Ok(artifact)
}
