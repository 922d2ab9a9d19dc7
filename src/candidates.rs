//! Candidate generation against a [`PrefixIndex`]

use crate::index::{prefix_length, PrefixIndex};

/// Per-shard scratch for candidate generation.
///
/// Marks are stamped with an epoch instead of being cleared, so probing a
/// right record costs nothing proportional to the left collection.
#[derive(Debug)]
pub struct CandidateGenerator {
    qval: usize,
    threshold: usize,
    marks: Vec<u32>,
    epoch: u32,
    found: Vec<u32>,
    probes: u64,
}

impl CandidateGenerator {
    pub fn new(left_len: usize, qval: usize, threshold: usize) -> Self {
        Self {
            qval,
            threshold,
            marks: vec![0; left_len],
            epoch: 0,
            found: Vec::new(),
            probes: 0,
        }
    }

    /// Left ordinals sharing at least one prefix token with `ordered_right`,
    /// each listed once, in first-seen order.
    pub fn find(&mut self, ordered_right: &[u32], index: &PrefixIndex) -> &[u32] {
        self.found.clear();
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.marks.iter_mut().for_each(|m| *m = 0);
            self.epoch = 1;
        }

        let prefix = prefix_length(ordered_right.len(), self.qval, self.threshold);
        for &token in &ordered_right[..prefix] {
            self.probes += 1;
            for &cand in index.probe(token) {
                let mark = &mut self.marks[cand as usize];
                if *mark != self.epoch {
                    *mark = self.epoch;
                    self.found.push(cand);
                }
            }
        }
        &self.found
    }

    /// Posting lists looked up so far.
    pub fn probes(&self) -> u64 {
        self.probes
    }
}

/// Token counts of two strings within `threshold` edits differ by at most
/// `threshold`.
pub fn passes_length_filter(left_tokens: usize, right_tokens: usize, threshold: usize) -> bool {
    left_tokens.abs_diff(right_tokens) <= threshold
}
