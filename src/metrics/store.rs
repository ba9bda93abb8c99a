use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use super::record::{MetricRecord, RecordSnapshot};
use crate::error::{self, Error};

/// Per-secondary-key breakdown for one primary key, with the aggregate
/// across all secondary keys kept alongside it.
#[derive(Debug, Clone)]
pub struct KeyedMetricStore<S> {
    aggregate: MetricRecord,
    by_secondary_key: HashMap<S, MetricRecord>,
}

/// Immutable copy of a [`KeyedMetricStore`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSnapshot<S>
where
    S: Eq + Hash,
{
    pub aggregate: RecordSnapshot,
    pub by_secondary_key: HashMap<S, RecordSnapshot>,
}

impl<S> KeyedMetricStore<S>
where
    S: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            aggregate: MetricRecord::new(),
            by_secondary_key: HashMap::new(),
        }
    }

    /// Update the record for `secondary` and the aggregate, exactly once
    /// each. A value either record would refuse leaves both untouched and
    /// inserts nothing.
    pub fn record_sample(&mut self, secondary: S, value: f64) -> Result<(), Error> {
        let value = error::validate(value)?;
        self.aggregate.check(value)?;
        if let Some(record) = self.by_secondary_key.get(&secondary) {
            record.check(value)?;
        }

        self.by_secondary_key
            .entry(secondary)
            .or_default()
            .update(value)?;
        self.aggregate.update(value)
    }

    pub fn aggregate(&self) -> &MetricRecord {
        &self.aggregate
    }

    pub fn get(&self, secondary: &S) -> Option<&MetricRecord> {
        self.by_secondary_key.get(secondary)
    }

    /// Number of distinct secondary keys seen.
    pub fn secondary_keys(&self) -> usize {
        self.by_secondary_key.len()
    }

    pub fn snapshot(&self) -> StoreSnapshot<S> {
        StoreSnapshot {
            aggregate: self.aggregate.snapshot(),
            by_secondary_key: self
                .by_secondary_key
                .iter()
                .map(|(k, r)| (k.clone(), r.snapshot()))
                .collect(),
        }
    }
}

impl<S> Default for KeyedMetricStore<S>
where
    S: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
