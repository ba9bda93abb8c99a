//! Keyed latency aggregation.
//!
//! Samples are filed under a primary key (such as the file type being
//! edited) and a secondary key (such as the kind of key typed). The
//! [`metrics::Aggregator`] keeps count, total and max per pair plus an
//! aggregate per primary key, and hands out owned snapshots. The rest of
//! the crate is the HTTP service that exposes it.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod load_generator;
pub mod metrics;
pub mod middleware;
pub mod server;

pub use config::Config;
pub use error::Error;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Central aggregator: handlers record samples, reporters read snapshots.
    pub metrics: Arc<metrics::LatencyAggregator>,

    pub config: Config,

    /// Flag checked by every simulator worker on each iteration.
    pub simulation_running: Arc<AtomicBool>,

    /// The spawned simulator task, kept so `stop` can await clean shutdown.
    pub simulation: tokio::sync::Mutex<Option<handlers::simulation::SimulationRun>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let metrics = match &config.pin {
            Some(key) => metrics::LatencyAggregator::with_pinned(key.clone()),
            None => metrics::LatencyAggregator::new(),
        };

        Self {
            metrics: Arc::new(metrics),
            config,
            simulation_running: Arc::new(AtomicBool::new(false)),
            simulation: tokio::sync::Mutex::new(None),
        }
    }
}
