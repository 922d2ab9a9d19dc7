//! edjoin - approximate edit distance string similarity join
//!
//! Finds (left, right) record pairs whose join strings are within a
//! Levenshtein threshold without comparing every pair. Each string is cut
//! into q-grams, the q-grams are reordered rarest-first, and only a short
//! prefix of each string is indexed and probed. Candidates sharing a prefix
//! q-gram go through a length filter and exact edit distance verification.
//!
//! The right collection is split into shards that run independently on a
//! worker pool. Each shard spills its matches to a private file in bounded
//! batches; the files are merged afterwards into one CSV artifact with
//! contiguous `_id`s.
//!
//! Pairs of strings that share no q-gram within their prefixes are never
//! reported, even if their edit distance qualifies.

pub mod candidates;
pub mod config;
pub mod distance;
pub mod error;
pub mod index;
pub mod join;
pub mod merge;
pub mod missing;
pub mod ordering;
pub mod output;
pub mod progress;
pub mod record;
pub mod shard;
pub mod tokenizer;

pub use config::{CompOp, JoinConfig};
pub use distance::edit_distance;
pub use error::JoinError;
pub use join::{edit_distance_join, validate_join, JoinSummary};
pub use merge::{read_artifact, ArtifactRow};
pub use output::OutputRow;
pub use record::{Collection, Record};
pub use tokenizer::{QgramTokenizer, Tokenizer};
