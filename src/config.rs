//! Join configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::JoinError;
use crate::tokenizer::{QgramTokenizer, Tokenizer};

/// Comparison between the computed edit distance and the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompOp {
    #[default]
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "=", alias = "==")]
    Eq,
}

impl CompOp {
    pub fn holds(self, distance: usize, threshold: usize) -> bool {
        match self {
            CompOp::Le => distance <= threshold,
            CompOp::Lt => distance < threshold,
            CompOp::Eq => distance == threshold,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompOp::Le => "<=",
            CompOp::Lt => "<",
            CompOp::Eq => "=",
        }
    }
}

impl FromStr for CompOp {
    type Err = JoinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<=" => Ok(CompOp::Le),
            "<" => Ok(CompOp::Lt),
            "=" | "==" => Ok(CompOp::Eq),
            other => Err(JoinError::InvalidCompOp(other.to_string())),
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for an edit distance join.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    /// Edit distance threshold. Floored to an integer once at join entry.
    pub threshold: f64,
    pub comp_op: CompOp,
    /// Emit pairs where either join value is missing.
    pub allow_missing: bool,
    pub l_out_prefix: String,
    pub r_out_prefix: String,
    /// Append the edit distance as `_sim_score`.
    pub out_sim_score: bool,
    /// Requested workers. `-1` means all CPUs, `-2` all but one, and so on.
    pub n_jobs: i64,
    pub show_progress: bool,
    pub tokenizer: Tokenizer,
    /// Maximum rows a shard buffers in memory before spilling to disk.
    pub flush_limit: usize,
    /// Directory for shard files and the merged artifact.
    pub output_dir: PathBuf,
    pub output_file: String,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            comp_op: CompOp::Le,
            allow_missing: false,
            l_out_prefix: "l_".to_string(),
            r_out_prefix: "r_".to_string(),
            out_sim_score: true,
            n_jobs: 1,
            show_progress: false,
            tokenizer: Tokenizer::Qgram(QgramTokenizer::default()),
            flush_limit: 10_000,
            output_dir: PathBuf::from("."),
            output_file: "edjoin_output.csv".to_string(),
        }
    }
}

impl JoinConfig {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file; absent fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Check every precondition that does not depend on the input data.
    pub fn validate(&self) -> Result<(), JoinError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(JoinError::InvalidThreshold(self.threshold));
        }
        self.tokenizer.as_qgram()?;
        if self.flush_limit == 0 {
            return Err(JoinError::InvalidFlushLimit);
        }
        Ok(())
    }

    /// The threshold as used by every filter and comparison. Flooring does
    /// not depend on `comp_op`, so `=` with 2.5 compares against 2.
    pub fn integer_threshold(&self) -> usize {
        self.threshold.floor() as usize
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }

    pub fn shard_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("edjoin_shard_{}.bin", index))
    }
}
