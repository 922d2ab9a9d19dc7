//! Tokenizers used to turn join values into token bags
//!
//! The join only accepts [`QgramTokenizer`]; the other variants exist so a
//! configuration can name them and be rejected up front.

use serde::{Deserialize, Serialize};

use crate::error::JoinError;

/// Overlapping character q-grams.
///
/// Tokens are produced over Unicode scalar values (`char`), not bytes, and
/// returned as a bag: repeated q-grams are kept in positional order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QgramTokenizer {
    /// Length of each q-gram.
    pub qval: usize,
    /// Frame the string with `qval - 1` pad characters on each side.
    pub padding: bool,
    pub prefix_pad: char,
    pub suffix_pad: char,
}

impl Default for QgramTokenizer {
    fn default() -> Self {
        Self {
            qval: 2,
            padding: false,
            prefix_pad: '#',
            suffix_pad: '$',
        }
    }
}

impl QgramTokenizer {
    pub fn new(qval: usize) -> Self {
        Self {
            qval,
            ..Default::default()
        }
    }

    pub fn with_padding(mut self, padding: bool) -> Self {
        self.padding = padding;
        self
    }

    /// Split `text` into q-grams. Strings shorter than `qval` (after
    /// padding, if enabled) produce no tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        if self.qval == 0 {
            return Vec::new();
        }

        let mut chars: Vec<char> = Vec::with_capacity(text.len() + 2 * self.qval);
        if self.padding {
            chars.extend(std::iter::repeat(self.prefix_pad).take(self.qval - 1));
        }
        chars.extend(text.chars());
        if self.padding {
            chars.extend(std::iter::repeat(self.suffix_pad).take(self.qval - 1));
        }

        if chars.len() < self.qval {
            return Vec::new();
        }
        chars
            .windows(self.qval)
            .map(|w| w.iter().collect::<String>())
            .collect()
    }
}

/// Tokenizer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Tokenizer {
    Qgram(QgramTokenizer),
    Whitespace,
    Delimiter { delimiter: char },
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer::Qgram(QgramTokenizer::default())
    }
}

impl Tokenizer {
    pub fn name(&self) -> &'static str {
        match self {
            Tokenizer::Qgram(_) => "qgram",
            Tokenizer::Whitespace => "whitespace",
            Tokenizer::Delimiter { .. } => "delimiter",
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        match self {
            Tokenizer::Qgram(q) => q.tokenize(text),
            Tokenizer::Whitespace => text.split_whitespace().map(str::to_string).collect(),
            Tokenizer::Delimiter { delimiter } => text
                .split(*delimiter)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// The q-gram tokenizer this configuration names, or the error the
    /// edit distance join reports for anything else.
    pub fn as_qgram(&self) -> Result<&QgramTokenizer, JoinError> {
        match self {
            Tokenizer::Qgram(q) if q.qval == 0 => Err(JoinError::InvalidQval),
            Tokenizer::Qgram(q) => Ok(q),
            other => Err(JoinError::InvalidTokenizer(other.name())),
        }
    }
}
