//! Property tests over random collections

use edjoin::{edit_distance, edit_distance_join, CompOp};
use proptest::prelude::*;
use tempfile::TempDir;

use crate::helpers::{config, expected_pairs, joined_pairs, keyed};

fn words(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[abcd]{0,7}", 0..max)
}

fn comp_op() -> impl Strategy<Value = CompOp> {
    prop_oneof![Just(CompOp::Le), Just(CompOp::Lt), Just(CompOp::Eq)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn emitted_pairs_are_exactly_the_prefix_filtered_matches(
        left in words(20),
        right in words(20),
        threshold in 0usize..4,
        qval in 1usize..4,
        op in comp_op(),
    ) {
        let left = keyed("left table", "l", &left);
        let right = keyed("right table", "r", &right);
        let dir = TempDir::new().unwrap();
        let mut config = config(dir.path(), threshold as f64, qval);
        config.comp_op = op;

        let summary = edit_distance_join(&left, &right, &config).unwrap();
        let pairs = joined_pairs(&summary);
        prop_assert_eq!(pairs.len() as u64, summary.total_rows);

        for ((l, r), score) in &pairs {
            let l_value = left.records.iter().find(|x| &x.key == l).unwrap();
            let r_value = right.records.iter().find(|x| &x.key == r).unwrap();
            let distance = edit_distance(
                l_value.value.as_deref().unwrap(),
                r_value.value.as_deref().unwrap(),
            );
            prop_assert!(op.holds(distance, threshold));
            prop_assert_eq!(score, &distance.to_string());
        }

        let expected = expected_pairs(&left, &right, qval, threshold, op);
        let found: std::collections::BTreeSet<_> = pairs.into_keys().collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn sharded_join_equals_single_worker(
        left in words(24),
        right in words(24),
        threshold in 0usize..3,
        n_jobs in 2i64..6,
        flush_limit in 1usize..5,
    ) {
        let left = keyed("left table", "l", &left);
        let right = keyed("right table", "r", &right);

        let dir = TempDir::new().unwrap();
        let single = edit_distance_join(&left, &right, &config(dir.path(), threshold as f64, 2))
            .unwrap();

        let dir = TempDir::new().unwrap();
        let mut sharded = config(dir.path(), threshold as f64, 2);
        sharded.n_jobs = n_jobs;
        sharded.flush_limit = flush_limit;
        let sharded = edit_distance_join(&left, &right, &sharded).unwrap();

        prop_assert_eq!(joined_pairs(&sharded), joined_pairs(&single));
        prop_assert_eq!(sharded.shard_rows.iter().sum::<u64>(), sharded.total_rows);
    }

    #[test]
    fn edit_distance_is_a_metric(
        a in "[abc]{0,10}",
        b in "[abc]{0,10}",
        c in "[abc]{0,10}",
    ) {
        let ab = edit_distance(&a, &b);
        prop_assert_eq!(ab, edit_distance(&b, &a));
        prop_assert_eq!(edit_distance(&a, &a), 0);
        prop_assert!(ab <= a.chars().count().max(b.chars().count()));
        prop_assert!(ab >= a.chars().count().abs_diff(b.chars().count()));
        prop_assert!(ab <= edit_distance(&a, &c) + edit_distance(&c, &b));
    }
}
