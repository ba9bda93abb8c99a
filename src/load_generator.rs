use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::metrics::{classify_secondary_key, EditorContext, LatencyAggregator};

/// Keys a simulated typist presses, weighted by repetition.
const KEYS: &[&str] = &[
    "e", "t", "a", "o", "n", "i", "s", "r", "1", " ", " ", " ", "\n", ";", "(", ")", "{", ".",
    "Backspace", "Tab",
];

/// Pause between keystrokes of one typist.
const KEYSTROKE_GAP: std::ops::Range<u64> = 15..60;

/// One in this many keystrokes hits a slow path.
const SPIKE_ONE_IN: u32 = 50;

// ─── Public entry point ──────────────────────────────────────────

/// Parameters of one simulation run.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub concurrency: u32,
    pub duration_secs: u64,
    pub file_types: Vec<String>,
    pub untyped_pct: u8,
}

/// Spawns `concurrency` tasks that type into the aggregator until the
/// deadline passes or `running` is cleared.
pub async fn run(running: Arc<AtomicBool>, metrics: Arc<LatencyAggregator>, plan: LoadPlan) {
    let deadline = Instant::now() + Duration::from_secs(plan.duration_secs);
    let plan = Arc::new(plan);

    let mut handles = Vec::with_capacity(plan.concurrency as usize);

    for worker_id in 0..plan.concurrency {
        let running = running.clone();
        let metrics = metrics.clone();
        let plan = plan.clone();

        handles.push(tokio::spawn(async move {
            typist(worker_id, running, metrics, plan, deadline).await;
        }));
    }

    for h in handles {
        let _ = h.await;
    }

    running.store(false, Ordering::SeqCst);
    info!("simulation finished");
}

// ─── Worker loop ─────────────────────────────────────────────────

async fn typist(
    id: u32,
    running: Arc<AtomicBool>,
    metrics: Arc<LatencyAggregator>,
    plan: Arc<LoadPlan>,
    deadline: Instant,
) {
    // Each typist gets its own deterministic RNG seeded uniquely.
    let mut rng = StdRng::seed_from_u64(1000 + id as u64);
    let mut typed = 0u64;

    while running.load(Ordering::Relaxed) && Instant::now() < deadline {
        let (context, key, latency_ms) = keystroke(&mut rng, &plan);

        // Values are always finite here; a rejection would be a bug.
        if let Err(e) = metrics.record(&context, classify_secondary_key(key), latency_ms) {
            debug!(worker = id, %e, "simulated sample rejected");
        }
        typed += 1;

        let gap = rng.gen_range(KEYSTROKE_GAP);
        tokio::time::sleep(Duration::from_millis(gap)).await;
    }

    debug!(worker = id, typed, "typist done");
}

/// One synthetic keystroke: where it was typed, what, and how long the
/// editor took to respond.
fn keystroke(rng: &mut StdRng, plan: &LoadPlan) -> (EditorContext, &'static str, f64) {
    let file_type = if rng.gen_range(0u8..100) < plan.untyped_pct {
        None
    } else {
        plan.file_types.choose(rng).cloned()
    };

    let key = KEYS.choose(rng).copied().unwrap_or(" ");

    // Newlines reformat and run more analysis than plain letters.
    let base = if key == "\n" { 12.0 } else { 4.0 };
    let mut latency_ms = base + rng.gen_range(0.0..6.0);
    if rng.gen_ratio(1, SPIKE_ONE_IN) {
        latency_ms += rng.gen_range(50.0..250.0);
    }

    (EditorContext { file_type }, key, latency_ms)
}
