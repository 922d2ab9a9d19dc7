//! Console progress for a single shard
//!
//! Only the shard that owns a [`ProgressReporter`] prints, so concurrent
//! workers never interleave their reports.

use std::time::{Duration, Instant};

pub struct ProgressReporter {
    label: String,
    total: u64,
    processed: u64,
    matches: u64,
    every: u64,
    min_interval: Duration,
    start: Instant,
    last_report: Instant,
}

impl ProgressReporter {
    pub fn new(label: impl Into<String>, total: u64) -> Self {
        let now = Instant::now();
        Self {
            label: label.into(),
            total,
            processed: 0,
            matches: 0,
            every: (total / 20).max(1),
            min_interval: Duration::from_secs(10),
            start: now,
            last_report: now,
        }
    }

    /// Report every `every` records at the latest.
    pub fn with_interval(mut self, every: u64) -> Self {
        self.every = every.max(1);
        self
    }

    /// Record one processed right record and the matches it produced.
    pub fn tick(&mut self, matches: u64) {
        self.processed += 1;
        self.matches += matches;
        if self.processed % self.every == 0 || self.last_report.elapsed() >= self.min_interval {
            self.report();
            self.last_report = Instant::now();
        }
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    fn report(&self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            self.processed as f64 / elapsed
        } else {
            0.0
        };
        let remaining = self.total.saturating_sub(self.processed) as f64;
        let eta = if rate > 0.0 { remaining / rate } else { 0.0 };
        let pct = if self.total > 0 {
            self.processed as f64 / self.total as f64 * 100.0
        } else {
            100.0
        };
        println!(
            "  {} {}/{} ({:.1}%) - {} matches - {:.0} rec/s - ETA: {:.0}s",
            self.label, self.processed, self.total, pct, self.matches, rate, eta
        );
    }

    pub fn finish(self) {
        let elapsed = self.start.elapsed();
        println!(
            "  ✅ {} done: {} records, {} matches in {:.1}s",
            self.label,
            self.processed,
            self.matches,
            elapsed.as_secs_f64()
        );
    }
}
