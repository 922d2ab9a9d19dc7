//! Input collections
//!
//! Loading, projection and type conversion of tables happen in the caller.
//! A [`Collection`] arrives with its key, join value and the already
//! projected output attributes for every record. An output attribute that
//! repeats the key attribute is dropped before the join.

use rustc_hash::FxHashSet;
use std::borrow::Cow;

use crate::error::JoinError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    /// Join attribute value; `None` when missing.
    pub value: Option<String>,
    /// Projected output attribute values, parallel to `Collection::out_attrs`.
    pub attrs: Vec<String>,
}

impl Record {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            attrs: Vec::new(),
        }
    }

    pub fn missing(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            attrs: Vec::new(),
        }
    }

    pub fn with_attrs<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs = attrs.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone)]
pub struct Collection {
    /// Used in error messages, e.g. "left table".
    pub label: String,
    pub key_attr: String,
    pub join_attr: String,
    pub out_attrs: Vec<String>,
    pub records: Vec<Record>,
}

impl Collection {
    pub fn new(
        label: impl Into<String>,
        key_attr: impl Into<String>,
        join_attr: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            key_attr: key_attr.into(),
            join_attr: join_attr.into(),
            out_attrs: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn with_out_attrs<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.out_attrs = attrs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The collection without the key attribute among its output
    /// attributes; the key is already its own output column. Borrowed
    /// when there is nothing to drop.
    pub fn without_key_in_out_attrs(&self) -> Cow<'_, Collection> {
        let keep: Vec<bool> = self.out_attrs.iter().map(|a| *a != self.key_attr).collect();
        if keep.iter().all(|&k| k) {
            return Cow::Borrowed(self);
        }

        let retain = |values: &[String]| -> Vec<String> {
            values
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v.clone())
                .collect()
        };
        let mut projected = self.clone();
        projected.out_attrs = retain(&self.out_attrs);
        for record in &mut projected.records {
            record.attrs = retain(&record.attrs);
        }
        Cow::Owned(projected)
    }

    /// Keys must be present and unique; every record must carry one value
    /// per output attribute.
    pub fn validate(&self) -> Result<(), JoinError> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for (row, record) in self.records.iter().enumerate() {
            if record.key.is_empty() {
                return Err(JoinError::MissingKey {
                    table: self.label.clone(),
                    attr: self.key_attr.clone(),
                    row,
                });
            }
            if !seen.insert(record.key.as_str()) {
                return Err(JoinError::DuplicateKey {
                    table: self.label.clone(),
                    attr: self.key_attr.clone(),
                    key: record.key.clone(),
                });
            }
            if record.attrs.len() != self.out_attrs.len() {
                return Err(JoinError::AttributeArity {
                    table: self.label.clone(),
                    row,
                    expected: self.out_attrs.len(),
                    found: record.attrs.len(),
                });
            }
        }
        Ok(())
    }
}
