//! Pairs involving a missing join value
//!
//! With `allow_missing`, a record whose join value is missing is paired
//! with every record of the other side. Pairs where both values are missing
//! are produced once, from the left side.

use anyhow::Result;

use crate::merge::ArtifactWriter;
use crate::output::OutputRow;
use crate::record::{Collection, Record};

fn pair(l: &Record, r: &Record) -> OutputRow {
    OutputRow {
        l_key: l.key.clone(),
        l_attrs: l.attrs.clone(),
        r_key: r.key.clone(),
        r_attrs: r.attrs.clone(),
        score: None,
    }
}

/// Every missing-value pair, left-missing pairs first.
pub fn missing_value_pairs<'a>(
    left: &'a Collection,
    right: &'a Collection,
) -> impl Iterator<Item = OutputRow> + 'a {
    let left_missing = left
        .records
        .iter()
        .filter(|l| l.value.is_none())
        .flat_map(move |l| right.records.iter().map(move |r| pair(l, r)));

    let right_missing = right
        .records
        .iter()
        .filter(|r| r.value.is_none())
        .flat_map(move |r| {
            left.records
                .iter()
                .filter(|l| l.value.is_some())
                .map(move |l| pair(l, r))
        });

    left_missing.chain(right_missing)
}

/// Append the missing-value pairs to the artifact, continuing its ids.
pub fn append_missing_pairs(
    artifact: &mut ArtifactWriter,
    left: &Collection,
    right: &Collection,
) -> Result<u64> {
    let mut appended = 0u64;
    for row in missing_value_pairs(left, right) {
        artifact.append(&row)?;
        appended += 1;
    }
    Ok(appended)
}
