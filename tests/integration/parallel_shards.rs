//! Sharded execution, spilling and merge

use edjoin::shard::resolve_workers;
use edjoin::{edit_distance_join, read_artifact, CompOp};
use tempfile::TempDir;

use crate::helpers::{config, expected_pairs, keyed, pair_keys, random_words, shard_files};

#[test]
fn test_worker_count_does_not_change_pairs() {
    let left = keyed("left table", "l", &random_words(7, 60, 8));
    let right = keyed("right table", "r", &random_words(11, 45, 8));

    let dir = TempDir::new().unwrap();
    let sequential = edit_distance_join(&left, &right, &config(dir.path(), 2.0, 2)).unwrap();
    assert_eq!(sequential.workers, 1);
    let sequential_pairs = pair_keys(&sequential);
    assert!(!sequential_pairs.is_empty());

    for n_jobs in [2, 3, 8] {
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path(), 2.0, 2);
        config.n_jobs = n_jobs;
        let parallel = edit_distance_join(&left, &right, &config).unwrap();
        assert_eq!(parallel.workers, n_jobs as usize);
        assert_eq!(parallel.shard_rows.len(), n_jobs as usize);
        assert_eq!(pair_keys(&parallel), sequential_pairs, "n_jobs = {}", n_jobs);
    }
}

#[test]
fn test_single_worker_matches_prefix_filter() {
    let left = keyed("left table", "l", &random_words(3, 50, 7));
    let right = keyed("right table", "r", &random_words(5, 50, 7));

    let dir = TempDir::new().unwrap();
    let summary = edit_distance_join(&left, &right, &config(dir.path(), 1.0, 2)).unwrap();
    assert_eq!(
        pair_keys(&summary),
        expected_pairs(&left, &right, 2, 1, CompOp::Le)
    );
}

#[test]
fn test_ids_contiguous_across_shards() {
    let left = keyed("left table", "l", &random_words(21, 40, 6));
    let right = keyed("right table", "r", &random_words(22, 40, 6));

    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), 2.0, 2);
    config.n_jobs = 4;
    let summary = edit_distance_join(&left, &right, &config).unwrap();

    assert_eq!(summary.shard_rows.iter().sum::<u64>(), summary.total_rows);
    let (_, rows) = read_artifact(&summary.output_path).unwrap();
    let ids: Vec<u64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, (0..summary.total_rows).collect::<Vec<_>>());

    // Shard i's rows come before shard i+1's: right keys are non-decreasing
    // in input order once grouped by shard.
    let right_pos = |key: &str| key[1..].parse::<usize>().unwrap();
    let mut offset = 0usize;
    let mut last_max = 0usize;
    for &count in &summary.shard_rows {
        let slice = &rows[offset..offset + count as usize];
        if let Some(min) = slice.iter().map(|r| right_pos(&r.fields[1])).min() {
            assert!(min >= last_max);
            last_max = slice.iter().map(|r| right_pos(&r.fields[1])).max().unwrap();
        }
        offset += count as usize;
    }
    assert_eq!(shard_files(dir.path()), 0);
}

#[test]
fn test_all_cpus_worker_count() {
    let left = keyed("left table", "l", &random_words(1, 10, 5));
    let right = keyed("right table", "r", &random_words(2, 5, 5));
    let cpus = num_cpus::get();

    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), 1.0, 2);
    config.n_jobs = -1;
    let summary = edit_distance_join(&left, &right, &config).unwrap();
    assert_eq!(summary.workers, cpus.min(right.len()));
    assert_eq!(resolve_workers(-1, right.len()), cpus.min(right.len()));
    assert_eq!(resolve_workers(-1, 0), 1);
}

#[test]
fn test_more_workers_than_right_records() {
    let left = keyed("left table", "l", &["abcd".to_string(), "abce".to_string()]);
    let right = keyed("right table", "r", &["abcf".to_string()]);

    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), 1.0, 2);
    config.n_jobs = 16;
    let summary = edit_distance_join(&left, &right, &config).unwrap();
    assert_eq!(summary.workers, 1);
    assert_eq!(summary.total_rows, 2);
}

#[test]
fn test_flush_limit_one_spills_every_row() {
    let left = keyed(
        "left table",
        "l",
        &["abcd", "abce", "abcf", "abcg"].map(String::from),
    );
    let right = keyed("right table", "r", &["abcx", "abcy"].map(String::from));

    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), 1.0, 2);
    config.flush_limit = 1;
    let summary = edit_distance_join(&left, &right, &config).unwrap();

    assert_eq!(summary.total_rows, 8);
    assert_eq!(summary.flushes, 8);
    assert_eq!(pair_keys(&summary).len(), 8);
}

#[test]
fn test_large_flush_limit_spills_per_right_record() {
    let left = keyed(
        "left table",
        "l",
        &["abcd", "abce", "abcf", "abcg"].map(String::from),
    );
    let right = keyed("right table", "r", &["abcx", "zzzz", "abcy"].map(String::from));

    let dir = TempDir::new().unwrap();
    let summary = edit_distance_join(&left, &right, &config(dir.path(), 1.0, 2)).unwrap();

    // Residual rows are spilled once per right record that matched.
    assert_eq!(summary.total_rows, 8);
    assert_eq!(summary.flushes, 2);
}

#[test]
fn test_empty_right_collection() {
    let left = keyed("left table", "l", &["abcd".to_string()]);
    let right = keyed("right table", "r", &[]);

    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), 1.0, 2);
    config.n_jobs = -1;
    let summary = edit_distance_join(&left, &right, &config).unwrap();
    assert_eq!(summary.workers, 1);
    assert_eq!(summary.total_rows, 0);
    let (header, rows) = read_artifact(&summary.output_path).unwrap();
    assert_eq!(header, vec!["_id", "l_id", "r_id", "_sim_score"]);
    assert!(rows.is_empty());
}

#[test]
fn test_progress_output_does_not_change_result() {
    let left = keyed("left table", "l", &random_words(31, 30, 6));
    let right = keyed("right table", "r", &random_words(32, 30, 6));

    let dir = TempDir::new().unwrap();
    let quiet = edit_distance_join(&left, &right, &config(dir.path(), 1.0, 2)).unwrap();
    let quiet_pairs = pair_keys(&quiet);

    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path(), 1.0, 2);
    config.n_jobs = 3;
    config.show_progress = true;
    let loud = edit_distance_join(&left, &right, &config).unwrap();
    assert_eq!(pair_keys(&loud), quiet_pairs);
}
