use hdrhistogram::Histogram;
use serde::Serialize;

use crate::error::{self, Error};

// ─── Configuration ───────────────────────────────────────────────

/// Histogram range: 1 μs → 60 s, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 60_000_000;
const HIST_SIGFIG: u8 = 3;

/// Samples are milliseconds; the histogram counts microseconds.
const US_PER_MS: f64 = 1_000.0;

// ─── Public types ────────────────────────────────────────────────

/// Running statistics for one stream of samples.
///
/// `count`, `total` and `max` are exact. The histogram only feeds the
/// informational percentiles in [`RecordSnapshot`].
#[derive(Debug, Clone)]
pub struct MetricRecord {
    count: u64,
    total: f64,
    max: Option<f64>,
    hist: Histogram<u64>,
}

/// Immutable copy of a [`MetricRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSnapshot {
    pub count: u64,
    pub total: f64,
    /// `None` until the first sample.
    pub max: Option<f64>,
    /// `None` when `count == 0`.
    pub average: Option<f64>,
    pub percentiles: Percentiles,
}

/// Approximate percentiles in milliseconds, all zero for an empty record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
}

// ─── MetricRecord impl ───────────────────────────────────────────

impl MetricRecord {
    pub fn new() -> Self {
        Self {
            count: 0,
            total: 0.0,
            max: None,
            hist: Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
                .expect("static histogram bounds are valid"),
        }
    }

    /// Fold one sample in. Non-finite values, and values that would make
    /// the total non-finite, are rejected with the record untouched.
    pub fn update(&mut self, value: f64) -> Result<(), Error> {
        let total = self.check(value)?;

        self.count += 1;
        self.total = total;
        self.max = Some(match self.max {
            Some(max) if max >= value => max,
            _ => value,
        });

        // Clamp into the trackable range; negative samples land in the
        // lowest bucket.
        let us = (value * US_PER_MS).round().max(HIST_LOW as f64) as u64;
        self.hist.saturating_record(us);
        Ok(())
    }

    /// The total after adding `value`, without applying it.
    pub fn check(&self, value: f64) -> Result<f64, Error> {
        let value = error::validate(value)?;
        let total = self.total + value;
        if total.is_finite() {
            Ok(total)
        } else {
            Err(Error::TotalOverflow {
                total: self.total,
                value,
            })
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// `total / count`, or `None` for an empty record.
    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.total / self.count as f64)
        }
    }

    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            count: self.count,
            total: self.total,
            max: self.max,
            average: self.average(),
            percentiles: Percentiles::from_histogram(&self.hist),
        }
    }
}

impl Default for MetricRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl Percentiles {
    fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.len() == 0 {
            return Self::default();
        }

        let ms = |q: f64| hist.value_at_quantile(q) as f64 / US_PER_MS;
        Self {
            p50: ms(0.50),
            p95: ms(0.95),
            p99: ms(0.99),
            p999: ms(0.999),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────
