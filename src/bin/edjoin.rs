//! edjoin CLI tool
//!
//! Command-line interface for running edit distance joins over CSV files

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use edjoin::{
    edit_distance, edit_distance_join, Collection, CompOp, JoinConfig, QgramTokenizer, Record,
    Tokenizer,
};

#[derive(Parser)]
#[command(name = "edjoin")]
#[command(about = "Approximate edit distance join over two CSV files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join two CSV files on the edit distance of one column each
    Join(JoinArgs),
    /// Print the edit distance between two strings
    Distance { a: String, b: String },
}

#[derive(clap::Args)]
struct JoinArgs {
    /// Left input CSV (with header row)
    #[arg(long)]
    left: PathBuf,
    /// Right input CSV (with header row)
    #[arg(long)]
    right: PathBuf,
    #[arg(long)]
    l_key: String,
    #[arg(long)]
    r_key: String,
    #[arg(long)]
    l_join: String,
    #[arg(long)]
    r_join: String,
    /// Edit distance threshold (floored to an integer)
    #[arg(long)]
    threshold: Option<f64>,
    /// One of <=, <, =
    #[arg(long)]
    comp_op: Option<String>,
    /// Columns of the left file to carry into the output
    #[arg(long, value_delimiter = ',')]
    l_out: Vec<String>,
    /// Columns of the right file to carry into the output
    #[arg(long, value_delimiter = ',')]
    r_out: Vec<String>,
    #[arg(long)]
    l_out_prefix: Option<String>,
    #[arg(long)]
    r_out_prefix: Option<String>,
    /// q-gram length
    #[arg(long)]
    qval: Option<usize>,
    /// Pad strings with # and $ before cutting q-grams
    #[arg(long)]
    padding: bool,
    /// Worker count; -1 uses every CPU
    #[arg(long, env = "EDJOIN_N_JOBS", allow_hyphen_values = true)]
    n_jobs: Option<i64>,
    /// Rows buffered per shard before spilling to disk
    #[arg(long, env = "EDJOIN_FLUSH_LIMIT")]
    flush_limit: Option<usize>,
    #[arg(long, env = "EDJOIN_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
    #[arg(long)]
    output_file: Option<String>,
    /// Also emit pairs where either join value is empty
    #[arg(long)]
    allow_missing: bool,
    /// Leave out the _sim_score column
    #[arg(long)]
    no_sim_score: bool,
    #[arg(long)]
    progress: bool,
    /// JSON config file; command-line flags override it
    #[arg(long, env = "EDJOIN_CONFIG")]
    config: Option<PathBuf>,
}

impl JoinArgs {
    fn to_config(&self) -> Result<JoinConfig> {
        let mut config = match &self.config {
            Some(path) => JoinConfig::from_json_file(path)?,
            None => JoinConfig::default(),
        };

        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(op) = &self.comp_op {
            config.comp_op = op.parse::<CompOp>()?;
        }
        if let Some(prefix) = &self.l_out_prefix {
            config.l_out_prefix = prefix.clone();
        }
        if let Some(prefix) = &self.r_out_prefix {
            config.r_out_prefix = prefix.clone();
        }
        if self.qval.is_some() || self.padding {
            let mut qgram = match &config.tokenizer {
                Tokenizer::Qgram(q) => q.clone(),
                _ => QgramTokenizer::default(),
            };
            if let Some(qval) = self.qval {
                qgram.qval = qval;
            }
            qgram.padding |= self.padding;
            config.tokenizer = Tokenizer::Qgram(qgram);
        }
        if let Some(n_jobs) = self.n_jobs {
            config.n_jobs = n_jobs;
        }
        if let Some(limit) = self.flush_limit {
            config.flush_limit = limit;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(file) = &self.output_file {
            config.output_file = file.clone();
        }
        config.allow_missing |= self.allow_missing;
        config.out_sim_score &= !self.no_sim_score;
        config.show_progress |= self.progress;
        Ok(config)
    }
}

/// Load a CSV into a collection. Empty join cells become missing values.
fn load_collection(
    path: &Path,
    label: &str,
    key_attr: &str,
    join_attr: &str,
    out_attrs: &[String],
) -> Result<Collection> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}: {}", label, path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("{}: no column named '{}' in {}", label, name, path.display()))
    };

    let key_idx = column(key_attr)?;
    let join_idx = column(join_attr)?;
    let out_idx: Vec<usize> = out_attrs
        .iter()
        .map(|a| column(a.as_str()))
        .collect::<Result<_>>()?;

    let mut collection =
        Collection::new(label, key_attr, join_attr).with_out_attrs(out_attrs.iter().cloned());
    for (row, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to read row {} of {}", row, path.display()))?;
        let field = |i: usize| record.get(i).unwrap_or("").to_string();
        let value = field(join_idx);
        collection.push(Record {
            key: field(key_idx),
            value: (!value.is_empty()).then_some(value),
            attrs: out_idx.iter().map(|&i| field(i)).collect(),
        });
    }
    Ok(collection)
}

fn run_join(args: JoinArgs) -> Result<()> {
    let config = args.to_config()?;

    println!("\n{}", "═".repeat(60));
    println!("EDIT DISTANCE JOIN");
    println!("{}", "═".repeat(60));
    println!("  Left:  {} ({} on '{}')", args.left.display(), args.l_key, args.l_join);
    println!("  Right: {} ({} on '{}')", args.right.display(), args.r_key, args.r_join);
    println!("  Condition: distance {} {}", config.comp_op, config.threshold);
    println!("  Output: {}", config.output_path().display());

    let start = Instant::now();
    let left = load_collection(&args.left, "left table", &args.l_key, &args.l_join, &args.l_out)?;
    let right = load_collection(&args.right, "right table", &args.r_key, &args.r_join, &args.r_out)?;
    println!("  Records: {} left, {} right", left.len(), right.len());

    let summary = edit_distance_join(&left, &right, &config)?;

    println!("{}", "─".repeat(60));
    println!("  ✅ Join Complete!");
    println!("  Workers: {}", summary.workers);
    println!("  Rows: {} ({} from missing values)", summary.total_rows, summary.missing_rows);
    for (shard, rows) in summary.shard_rows.iter().enumerate() {
        println!("    Shard {}: {} rows", shard, rows);
    }
    println!("  Spill flushes: {}", summary.flushes);
    println!("  Time: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn main() -> Result<()> {
    // Optional .env (output dir, worker count) before clap reads env fallbacks
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Join(args) => run_join(args)?,
        Commands::Distance { a, b } => {
            println!("{}", edit_distance(&a, &b));
        }
    }

    Ok(())
}
