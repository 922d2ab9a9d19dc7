//! Test helpers for join integration tests

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use edjoin::index::prefix_length;
use edjoin::ordering::TokenOrdering;
use edjoin::{
    edit_distance, read_artifact, Collection, CompOp, JoinConfig, JoinSummary, QgramTokenizer,
    Record, Tokenizer,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Build a collection from `(key, value)` pairs. An empty value is missing.
pub fn collection(label: &str, rows: &[(&str, &str)]) -> Collection {
    let records = rows
        .iter()
        .map(|&(key, value)| {
            if value.is_empty() {
                Record::missing(key)
            } else {
                Record::new(key, value)
            }
        })
        .collect();
    Collection::new(label, "id", "name").with_records(records)
}

/// Keyed collection over plain strings: keys are `{prefix}{i}`.
pub fn keyed(label: &str, prefix: &str, values: &[String]) -> Collection {
    let records = values
        .iter()
        .enumerate()
        .map(|(i, v)| Record::new(format!("{}{}", prefix, i), v.as_str()))
        .collect();
    Collection::new(label, "id", "name").with_records(records)
}

pub fn config(dir: &Path, threshold: f64, qval: usize) -> JoinConfig {
    JoinConfig {
        tokenizer: Tokenizer::Qgram(QgramTokenizer::new(qval)),
        output_dir: dir.to_path_buf(),
        n_jobs: 1,
        ..JoinConfig::new(threshold)
    }
}

/// `(l_key, r_key) -> score` from a finished join's artifact. Assumes no
/// output attributes, so the fields are `[l_key, r_key, score?]`.
pub fn joined_pairs(summary: &JoinSummary) -> BTreeMap<(String, String), String> {
    let (_, rows) = read_artifact(&summary.output_path).unwrap();
    let mut pairs = BTreeMap::new();
    for row in rows {
        let score = row.fields.get(2).cloned().unwrap_or_default();
        let previous = pairs.insert((row.fields[0].clone(), row.fields[1].clone()), score);
        assert!(previous.is_none(), "pair emitted twice: {:?}", row.fields);
    }
    pairs
}

pub fn pair_keys(summary: &JoinSummary) -> BTreeSet<(String, String)> {
    joined_pairs(summary).into_keys().collect()
}

/// Pairs a single-shard join must report: they share a token within their
/// prefixes under one ordering over both collections, and their distance
/// satisfies the comparison.
pub fn expected_pairs(
    left: &Collection,
    right: &Collection,
    qval: usize,
    threshold: usize,
    op: CompOp,
) -> BTreeSet<(String, String)> {
    let tokenizer = QgramTokenizer::new(qval);
    let bags = |c: &Collection| -> Vec<Option<Vec<String>>> {
        c.records
            .iter()
            .map(|r| r.value.as_deref().map(|v| tokenizer.tokenize(v)))
            .collect()
    };
    let left_bags = bags(left);
    let right_bags = bags(right);
    let ordering = TokenOrdering::build(
        left_bags
            .iter()
            .chain(right_bags.iter())
            .flatten()
            .map(Vec::as_slice),
    );
    let prefix = |bag: &[String]| -> BTreeSet<u32> {
        let ordered = ordering.order(bag);
        let len = prefix_length(ordered.len(), qval, threshold);
        ordered[..len].iter().copied().collect()
    };

    let mut expected = BTreeSet::new();
    for (l, l_bag) in left.records.iter().zip(&left_bags) {
        let Some(l_bag) = l_bag else { continue };
        let l_prefix = prefix(l_bag);
        for (r, r_bag) in right.records.iter().zip(&right_bags) {
            let Some(r_bag) = r_bag else { continue };
            if l_prefix.is_disjoint(&prefix(r_bag)) {
                continue;
            }
            let distance = edit_distance(l.value.as_deref().unwrap(), r.value.as_deref().unwrap());
            if op.holds(distance, threshold) {
                expected.insert((l.key.clone(), r.key.clone()));
            }
        }
    }
    expected
}

/// Random strings over a small alphabet so near matches are common.
pub fn random_words(seed: u64, count: usize, max_len: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let alphabet = ['a', 'b', 'c', 'd'];
    (0..count)
        .map(|_| {
            let len = rng.gen_range(1..=max_len);
            (0..len)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect()
        })
        .collect()
}

pub fn shard_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("edjoin_shard_"))
        .count()
}
