use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use super::classify::KeyContext;
use super::store::{KeyedMetricStore, StoreSnapshot};
use crate::error::{self, Error};

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe two-level metrics engine.
///
/// One mutex guards every store, the pinned key and the counters, so the
/// get-or-create of a store or record happens at most once per key and no
/// update is lost. Callers only ever get owned snapshots back.
pub struct Aggregator<P, S> {
    inner: Mutex<Inner<P, S>>,
}

/// Outcome of [`Aggregator::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded<P> {
    /// The sample was filed under this primary key.
    Stored(P),
    /// No pinned key and the context yielded none; nothing changed.
    Skipped,
}

/// Complete point-in-time copy of an [`Aggregator`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatorSnapshot<P, S>
where
    P: Eq + Hash,
    S: Eq + Hash,
{
    pub captured_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub pinned_primary_key: Option<P>,

    // Counters
    pub total_samples: u64,
    pub skipped_samples: u64,
    pub rejected_samples: u64,

    pub stores: HashMap<P, StoreSnapshot<S>>,
}

/// Restores the previously pinned key when dropped.
#[must_use = "the pin is released as soon as the guard is dropped"]
pub struct PinGuard<'a, P, S>
where
    P: Eq + Hash + Clone,
    S: Eq + Hash + Clone,
{
    aggregator: &'a Aggregator<P, S>,
    previous: Option<P>,
}

// ─── Internal state ──────────────────────────────────────────────

struct Inner<P, S> {
    stores: HashMap<P, KeyedMetricStore<S>>,
    pinned: Option<P>,

    total_samples: u64,
    skipped_samples: u64,
    rejected_samples: u64,

    started_at: DateTime<Utc>,
}

// ─── Aggregator impl ─────────────────────────────────────────────

impl<P, S> Aggregator<P, S>
where
    P: Eq + Hash + Clone,
    S: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new(None)),
        }
    }

    /// Start with `key` already pinned.
    pub fn with_pinned(key: P) -> Self {
        Self {
            inner: Mutex::new(Inner::new(Some(key))),
        }
    }

    /// The pinned key if there is one, otherwise whatever `context` derives.
    ///
    /// `context` is consulted without the lock held, so it may itself read
    /// this aggregator.
    pub fn classify_primary_key<C>(&self, context: &C) -> Option<P>
    where
        C: KeyContext<P> + ?Sized,
    {
        if let Some(pinned) = self.pinned_primary_key() {
            return Some(pinned);
        }
        context.derive_key()
    }

    /// Replace the pinned key, returning the previous one. `None` unpins.
    pub fn set_pinned_primary_key(&self, key: Option<P>) -> Option<P> {
        std::mem::replace(&mut self.inner.lock().pinned, key)
    }

    pub fn pinned_primary_key(&self) -> Option<P> {
        self.inner.lock().pinned.clone()
    }

    /// Pin `key` until the returned guard is dropped.
    pub fn pin_scope(&self, key: P) -> PinGuard<'_, P, S> {
        let previous = self.set_pinned_primary_key(Some(key));
        PinGuard {
            aggregator: self,
            previous,
        }
    }

    /// Record one sample under the classified primary key and `secondary`.
    ///
    /// Rejected values never create a store, so a bad sample leaves no
    /// empty bucket behind. The context derives its key before the lock is
    /// taken; the pin is checked under the lock and still wins.
    pub fn record<C>(&self, context: &C, secondary: S, value: f64) -> Result<Recorded<P>, Error>
    where
        C: KeyContext<P> + ?Sized,
    {
        let derived = context.derive_key();
        self.inner.lock().record(derived, secondary, value)
    }

    /// Owned copy of one primary key's store.
    pub fn snapshot(&self, primary: &P) -> Option<StoreSnapshot<S>> {
        self.inner.lock().stores.get(primary).map(KeyedMetricStore::snapshot)
    }

    /// Owned copy of everything; later writes never show through.
    pub fn snapshot_all(&self) -> AggregatorSnapshot<P, S> {
        self.inner.lock().snapshot()
    }

    /// Drop every store and counter. The pinned key survives.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let pinned = inner.pinned.take();
        *inner = Inner::new(pinned);
    }

    /// Number of primary keys with at least one sample.
    pub fn len(&self) -> usize {
        self.inner.lock().stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P, S> Default for Aggregator<P, S>
where
    P: Eq + Hash + Clone,
    S: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P, S> Drop for PinGuard<'_, P, S>
where
    P: Eq + Hash + Clone,
    S: Eq + Hash + Clone,
{
    fn drop(&mut self) {
        self.aggregator.set_pinned_primary_key(self.previous.take());
    }
}

// ─── Inner impl ──────────────────────────────────────────────────

impl<P, S> Inner<P, S>
where
    P: Eq + Hash + Clone,
    S: Eq + Hash + Clone,
{
    fn new(pinned: Option<P>) -> Self {
        Self {
            stores: HashMap::new(),
            pinned,
            total_samples: 0,
            skipped_samples: 0,
            rejected_samples: 0,
            started_at: Utc::now(),
        }
    }

    fn record(&mut self, derived: Option<P>, secondary: S, value: f64) -> Result<Recorded<P>, Error> {
        if let Err(e) = error::validate(value) {
            return Err(self.reject(e));
        }

        let Some(primary) = self.pinned.clone().or(derived) else {
            self.skipped_samples += 1;
            debug!("no primary key for sample, skipping");
            return Ok(Recorded::Skipped);
        };

        let stored = match self.stores.entry(primary.clone()) {
            Entry::Occupied(slot) => slot.into_mut().record_sample(secondary, value),
            Entry::Vacant(slot) => {
                let mut store = KeyedMetricStore::new();
                let res = store.record_sample(secondary, value);
                if res.is_ok() {
                    slot.insert(store);
                }
                res
            }
        };
        if let Err(e) = stored {
            return Err(self.reject(e));
        }
        self.total_samples += 1;

        Ok(Recorded::Stored(primary))
    }

    fn reject(&mut self, e: Error) -> Error {
        self.rejected_samples += 1;
        debug!(%e, "rejected sample");
        e
    }

    fn snapshot(&self) -> AggregatorSnapshot<P, S> {
        AggregatorSnapshot {
            captured_at: Utc::now(),
            started_at: self.started_at,
            pinned_primary_key: self.pinned.clone(),
            total_samples: self.total_samples,
            skipped_samples: self.skipped_samples,
            rejected_samples: self.rejected_samples,
            stores: self
                .stores
                .iter()
                .map(|(k, store)| (k.clone(), store.snapshot()))
                .collect(),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────
