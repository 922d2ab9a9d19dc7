//! Prefix index over the left collection
//!
//! Two strings within edit distance `t` lose at most `qval * t` q-grams to
//! the edits, so their rarest-first prefixes of length `qval * t + 1` share
//! at least one token. Only those prefixes are indexed.

/// Number of leading (rarest) tokens that must be indexed or probed.
pub fn prefix_length(num_tokens: usize, qval: usize, threshold: usize) -> usize {
    qval.saturating_mul(threshold).saturating_add(1).min(num_tokens)
}

/// Inverted index: token id -> left ordinals whose prefix holds the token.
#[derive(Debug, Default)]
pub struct PrefixIndex {
    postings: Vec<Vec<u32>>,
    sizes: Vec<usize>,
    indexed: usize,
}

impl PrefixIndex {
    /// Build from rarest-first token id sequences, one per left record.
    /// `None` marks a record without a join value; it is never indexed.
    pub fn build<'a, I>(ordered_left: I, vocabulary: usize, qval: usize, threshold: usize) -> Self
    where
        I: IntoIterator<Item = Option<&'a [u32]>>,
    {
        let mut postings: Vec<Vec<u32>> = vec![Vec::new(); vocabulary];
        let mut sizes = Vec::new();
        let mut indexed = 0usize;

        for (ordinal, tokens) in ordered_left.into_iter().enumerate() {
            let Some(tokens) = tokens else {
                sizes.push(0);
                continue;
            };
            let ordinal = ordinal as u32;
            let prefix = prefix_length(tokens.len(), qval, threshold);
            for &token in &tokens[..prefix] {
                let list = &mut postings[token as usize];
                // Ids are sorted, so a repeated token is adjacent.
                if list.last() != Some(&ordinal) {
                    list.push(ordinal);
                }
            }
            sizes.push(tokens.len());
            indexed += 1;
        }

        Self {
            postings,
            sizes,
            indexed,
        }
    }

    pub fn probe(&self, token: u32) -> &[u32] {
        self.postings
            .get(token as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Token count of a left record.
    pub fn size(&self, ordinal: u32) -> usize {
        self.sizes.get(ordinal as usize).copied().unwrap_or(0)
    }

    /// Left records that carried a join value.
    pub fn indexed_records(&self) -> usize {
        self.indexed
    }

    pub fn left_len(&self) -> usize {
        self.sizes.len()
    }

    pub fn posting_entries(&self) -> usize {
        self.postings.iter().map(Vec::len).sum()
    }
}
