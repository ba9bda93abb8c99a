use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::load_generator::{self, LoadPlan};
use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Number of concurrent typists
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// How long the simulation runs (seconds)
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// File types the typists pick from
    #[serde(default = "default_file_types")]
    pub file_types: Vec<String>,

    /// Percentage of keystrokes typed into a document with no file type
    #[serde(default)]
    pub untyped_pct: u8,
}

fn default_concurrency() -> u32 {
    10
}
fn default_duration() -> u64 {
    30
}
fn default_file_types() -> Vec<String> {
    ["rs", "kt", "java", "toml"].map(String::from).to_vec()
}

/// A running simulation, kept in [`AppState`] until stopped.
pub struct SimulationRun {
    pub id: Uuid,
    pub handle: JoinHandle<()>,
}

#[derive(Debug, Serialize)]
pub struct SimulationStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    pub message: String,
}

impl SimulationConfig {
    fn validate(&self) -> Result<(), AppError> {
        if self.concurrency == 0 || self.concurrency > 500 {
            return Err(AppError::BadRequest(
                "concurrency must be between 1 and 500".into(),
            ));
        }
        if self.duration_secs == 0 || self.duration_secs > 300 {
            return Err(AppError::BadRequest(
                "duration_secs must be between 1 and 300".into(),
            ));
        }
        if self.file_types.is_empty() || self.file_types.iter().any(String::is_empty) {
            return Err(AppError::BadRequest(
                "file_types must be a non-empty list of non-empty names".into(),
            ));
        }
        if self.untyped_pct > 100 {
            return Err(AppError::BadRequest(
                "untyped_pct must be between 0 and 100".into(),
            ));
        }
        Ok(())
    }
}

// ─── POST /api/simulation/start ──────────────────────────────────

pub async fn start_simulation(
    State(state): State<Arc<AppState>>,
    Json(config): Json<SimulationConfig>,
) -> Result<Json<SimulationStatus>, AppError> {
    config.validate()?;

    // Hold the slot for the whole start so two requests cannot both spawn.
    let mut slot = state.simulation.lock().await;
    if state.simulation_running.load(Ordering::SeqCst) {
        return Err(AppError::AlreadyRunning);
    }

    // A finished run may still sit in the slot; reap it.
    if let Some(old) = slot.take() {
        let _ = old.handle.await;
    }

    state.metrics.reset();
    state.simulation_running.store(true, Ordering::SeqCst);

    let id = Uuid::new_v4();
    let message = format!(
        "Started: {} typists × {}s over [{}]",
        config.concurrency,
        config.duration_secs,
        config.file_types.join(", "),
    );
    info!(%id, concurrency = config.concurrency, duration_secs = config.duration_secs, "simulation started");

    let plan = LoadPlan {
        concurrency: config.concurrency,
        duration_secs: config.duration_secs,
        file_types: config.file_types,
        untyped_pct: config.untyped_pct,
    };
    let running = state.simulation_running.clone();
    let metrics = state.metrics.clone();

    let handle = tokio::spawn(async move {
        load_generator::run(running, metrics, plan).await;
    });
    *slot = Some(SimulationRun { id, handle });

    Ok(Json(SimulationStatus {
        running: true,
        run_id: Some(id),
        message,
    }))
}

// ─── POST /api/simulation/stop ───────────────────────────────────

pub async fn stop_simulation(State(state): State<Arc<AppState>>) -> Json<SimulationStatus> {
    let mut slot = state.simulation.lock().await;
    let was_running = state.simulation_running.swap(false, Ordering::SeqCst);

    let run_id = match slot.take() {
        Some(run) => {
            // Ignore JoinError; the task may have already finished
            let _ = run.handle.await;
            Some(run.id)
        }
        None => None,
    };

    if !was_running {
        return Json(SimulationStatus {
            running: false,
            run_id,
            message: "No simulation is running".into(),
        });
    }

    info!(?run_id, "simulation stopped");
    Json(SimulationStatus {
        running: false,
        run_id,
        message: "Simulation stopped".into(),
    })
}

// ─── GET /api/simulation/status ──────────────────────────────────

pub async fn simulation_status(State(state): State<Arc<AppState>>) -> Json<SimulationStatus> {
    let run_id = state.simulation.lock().await.as_ref().map(|run| run.id);
    let running = state.simulation_running.load(Ordering::SeqCst);

    Json(SimulationStatus {
        running,
        run_id,
        message: if running {
            "Simulation in progress".into()
        } else {
            "Idle".into()
        },
    })
}
