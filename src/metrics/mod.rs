pub mod aggregator;
pub mod classify;
pub mod record;
pub mod report;
pub mod store;
pub mod stream;

pub use aggregator::{Aggregator, AggregatorSnapshot, PinGuard, Recorded};
pub use classify::{classify_secondary_key, ActionKey, EditorContext, KeyContext};
pub use record::{MetricRecord, Percentiles, RecordSnapshot};
pub use store::{KeyedMetricStore, StoreSnapshot};

/// The aggregator the service runs: file type → normalized action key.
pub type LatencyAggregator = Aggregator<String, String>;

/// Snapshot shape served over HTTP.
pub type LatencySnapshot = AggregatorSnapshot<String, String>;
