use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::metrics::{classify_secondary_key, EditorContext, Recorded};
use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

/// One typed key and how long the editor took to react to it.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleRequest {
    /// Absent when the document has no known file type
    #[serde(default)]
    pub file_type: Option<String>,
    /// Raw key label, normalized before recording
    pub key: String,
    pub latency_ms: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    Recorded,
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub status: SampleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    pub secondary_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PinRequest {
    /// `null` or `""` unpins, matching how an empty file type yields no key
    pub primary_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PinResponse {
    pub previous: Option<String>,
    pub current: Option<String>,
}

// ─── POST /api/samples ───────────────────────────────────────────

pub async fn record_sample(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SampleRequest>,
) -> Result<Json<SampleResponse>, AppError> {
    let secondary_key = classify_secondary_key(&req.key);
    let context = EditorContext {
        file_type: req.file_type,
    };

    let outcome = state
        .metrics
        .record(&context, secondary_key.clone(), req.latency_ms)?;

    let (status, primary_key) = match outcome {
        Recorded::Stored(primary) => (SampleStatus::Recorded, Some(primary)),
        Recorded::Skipped => (SampleStatus::Skipped, None),
    };

    Ok(Json(SampleResponse {
        status,
        primary_key,
        secondary_key,
    }))
}

// ─── GET /api/pin ────────────────────────────────────────────────

pub async fn get_pin(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "current": state.metrics.pinned_primary_key() }))
}

// ─── PUT /api/pin ────────────────────────────────────────────────

pub async fn set_pin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PinRequest>,
) -> Json<PinResponse> {
    let current = req.primary_key.filter(|key| !key.is_empty());
    let previous = state.metrics.set_pinned_primary_key(current.clone());
    info!(?previous, ?current, "pinned primary key changed");

    Json(PinResponse { previous, current })
}

// ─── POST /api/reset ─────────────────────────────────────────────

pub async fn reset(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.metrics.reset();
    info!("metrics reset");

    Json(serde_json::json!({ "status": "reset" }))
}
