//! Parallel sharding of the right collection
//!
//! The right collection is cut into contiguous, near-equal shards. Every
//! shard runs the whole pipeline on its own: token ordering over the left
//! collection plus its slice of the right one, a fresh prefix index, then
//! candidate generation and verification for each of its right records in
//! input order, spilling matches to a private shard file.
//!
//! Workers share nothing mutable. The left collection is borrowed read-only
//! by every worker instead of being copied.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::candidates::{passes_length_filter, CandidateGenerator};
use crate::config::JoinConfig;
use crate::distance::edit_distance;
use crate::index::PrefixIndex;
use crate::ordering::TokenOrdering;
use crate::output::{OutputRow, ShardOutput, SpillWriter};
use crate::progress::ProgressReporter;
use crate::record::{Collection, Record};

/// Normalise a requested worker count.
///
/// `n_jobs <= -1` means `cpus + 1 + n_jobs` (at least 1). The result is
/// clamped to `[1, right_len]`.
pub fn effective_workers(n_jobs: i64, right_len: usize, cpus: usize) -> usize {
    let requested = if n_jobs <= -1 {
        (cpus as i64 + 1 + n_jobs).max(1)
    } else {
        n_jobs
    };
    let upper = right_len.max(1) as i64;
    requested.clamp(1, upper) as usize
}

/// [`effective_workers`] with the machine's CPU count.
pub fn resolve_workers(n_jobs: i64, right_len: usize) -> usize {
    effective_workers(n_jobs, right_len, num_cpus::get())
}

/// Split `0..len` into `n` contiguous ranges whose sizes differ by at most
/// one; the earliest ranges take the remainder.
pub fn split_ranges(len: usize, n: usize) -> Vec<Range<usize>> {
    let n = n.max(1);
    let base = len / n;
    let rem = len % n;
    let mut ranges = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let size = base + usize::from(i < rem);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// One unit of parallel work.
pub struct ShardTask<'a> {
    pub index: usize,
    pub left: &'a Collection,
    pub right: &'a [Record],
}

/// Run the full pipeline for one shard.
pub fn run_shard(
    task: &ShardTask<'_>,
    config: &JoinConfig,
    threshold: usize,
    mut progress: Option<ProgressReporter>,
) -> Result<ShardOutput> {
    let qgram = config.tokenizer.as_qgram()?;
    let qval = qgram.qval;

    let left_bags: Vec<Option<Vec<String>>> = task
        .left
        .records
        .iter()
        .map(|r| r.value.as_deref().map(|v| qgram.tokenize(v)))
        .collect();
    let right_bags: Vec<Option<Vec<String>>> = task
        .right
        .iter()
        .map(|r| r.value.as_deref().map(|v| qgram.tokenize(v)))
        .collect();

    let ordering = TokenOrdering::build(
        left_bags
            .iter()
            .chain(right_bags.iter())
            .flatten()
            .map(Vec::as_slice),
    );

    let ordered_left: Vec<Option<Vec<u32>>> = left_bags
        .iter()
        .map(|bag| bag.as_ref().map(|b| ordering.order(b)))
        .collect();
    drop(left_bags);

    let index = PrefixIndex::build(
        ordered_left.iter().map(|t| t.as_deref()),
        ordering.len(),
        qval,
        threshold,
    );
    drop(ordered_left);
    debug!(
        shard = task.index,
        tokens = ordering.len(),
        indexed = index.indexed_records(),
        postings = index.posting_entries(),
        "built prefix index"
    );

    let mut generator = CandidateGenerator::new(task.left.len(), qval, threshold);
    let mut writer = SpillWriter::create(
        task.index,
        &config.shard_path(task.index),
        config.flush_limit,
    )?;
    let mut verified = 0u64;

    for (r_record, bag) in task.right.iter().zip(&right_bags) {
        let mut matched = 0u64;

        if let (Some(r_value), Some(bag)) = (r_record.value.as_deref(), bag) {
            let r_tokens = ordering.order(bag);
            for &cand in generator.find(&r_tokens, &index) {
                if !passes_length_filter(index.size(cand), r_tokens.len(), threshold) {
                    continue;
                }
                let l_record = &task.left.records[cand as usize];
                let Some(l_value) = l_record.value.as_deref() else {
                    continue;
                };

                verified += 1;
                let distance = edit_distance(l_value, r_value);
                if !config.comp_op.holds(distance, threshold) {
                    continue;
                }

                writer.push(OutputRow {
                    l_key: l_record.key.clone(),
                    l_attrs: l_record.attrs.clone(),
                    r_key: r_record.key.clone(),
                    r_attrs: r_record.attrs.clone(),
                    score: config.out_sim_score.then_some(distance as u64),
                })?;
                matched += 1;
            }
        }

        // Residual rows of this right record go to disk before the next one.
        writer.flush()?;
        if let Some(progress) = progress.as_mut() {
            progress.tick(matched);
        }
    }

    if let Some(progress) = progress {
        progress.finish();
    }

    let output = writer.finish()?;
    debug!(
        shard = task.index,
        right = task.right.len(),
        probes = generator.probes(),
        verified,
        rows = output.rows,
        flushes = output.flushes,
        "shard complete"
    );
    Ok(output)
}

/// Run every shard and wait for all of them. Results come back in shard
/// index order regardless of completion order.
///
/// If any shard fails, every shard file of this call is removed before the
/// first error is returned.
pub fn run_shards(
    left: &Collection,
    right: &Collection,
    config: &JoinConfig,
    threshold: usize,
    workers: usize,
) -> Result<Vec<ShardOutput>> {
    if workers <= 1 {
        let task = ShardTask {
            index: 0,
            left,
            right: &right.records,
        };
        let progress = config
            .show_progress
            .then(|| ProgressReporter::new("shard 0", right.len() as u64));
        return match run_shard(&task, config, threshold, progress) {
            Ok(output) => Ok(vec![output]),
            Err(e) => {
                discard_shard_files(config, 1);
                Err(e)
            }
        };
    }

    let ranges = split_ranges(right.len(), workers);
    let reporter = ranges.len() - 1;
    info!(workers, shards = ranges.len(), "dispatching shards");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("edjoin-shard-{}", i))
        .build()
        .context("Failed to build worker pool")?;

    let results: Vec<Result<ShardOutput>> = pool.install(|| {
        ranges
            .into_par_iter()
            .enumerate()
            .map(|(index, range)| {
                let task = ShardTask {
                    index,
                    left,
                    right: &right.records[range],
                };
                let progress = (config.show_progress && index == reporter).then(|| {
                    ProgressReporter::new(format!("shard {}", index), task.right.len() as u64)
                });
                run_shard(&task, config, threshold, progress)
                    .with_context(|| format!("Shard {} failed", index))
            })
            .collect()
    });

    let mut outputs = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(output) => outputs.push(output),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if let Some(e) = first_error {
        discard_shard_files(config, workers);
        return Err(e);
    }
    Ok(outputs)
}

/// Best-effort removal of whatever file sits at the shard paths `0..count`
/// of `config.output_dir`, whether or not this call created it.
pub fn discard_shard_files(config: &JoinConfig, count: usize) {
    for index in 0..count {
        remove_if_present(&config.shard_path(index));
    }
}

pub(crate) fn remove_if_present(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove shard file");
    }
}
