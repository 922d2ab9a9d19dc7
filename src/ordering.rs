//! Global rarest-first token ordering
//!
//! Token ids are dense ranks: id 0 is the rarest token. Sorting a record's
//! ids ascending therefore puts its rarest tokens first, which is what keeps
//! prefix posting lists short.

use rustc_hash::FxHashMap;

#[derive(Debug, Default, Clone)]
pub struct TokenOrdering {
    ranks: FxHashMap<String, u32>,
}

impl TokenOrdering {
    /// Rank every token appearing in `bags` by (frequency, token text).
    pub fn build<'a, I>(bags: I) -> Self
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut counts: FxHashMap<&'a str, u64> = FxHashMap::default();
        for bag in bags {
            for token in bag {
                *counts.entry(token.as_str()).or_insert(0) += 1;
            }
        }

        let mut by_frequency: Vec<(&str, u64)> = counts.into_iter().collect();
        by_frequency.sort_unstable_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

        let mut ranks = FxHashMap::default();
        ranks.reserve(by_frequency.len());
        for (rank, (token, _)) in by_frequency.into_iter().enumerate() {
            ranks.insert(token.to_string(), rank as u32);
        }
        Self { ranks }
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn rank(&self, token: &str) -> Option<u32> {
        self.ranks.get(token).copied()
    }

    /// Map a token bag to its ids, rarest first. Tokens the ordering has
    /// never seen are dropped.
    pub fn order(&self, tokens: &[String]) -> Vec<u32> {
        let mut ids: Vec<u32> = tokens.iter().filter_map(|t| self.rank(t)).collect();
        ids.sort_unstable();
        ids
    }
}
