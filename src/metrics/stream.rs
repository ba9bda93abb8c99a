use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use super::report;
use super::{LatencySnapshot, StoreSnapshot};
use crate::handlers::AppError;
use crate::AppState;

// ─── GET /api/metrics ────────────────────────────────────────────
/// Every primary key in one JSON snapshot.

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<LatencySnapshot> {
    Json(state.metrics.snapshot_all())
}

// ─── GET /api/metrics/:primary ───────────────────────────────────

pub async fn get_primary_metrics(
    State(state): State<Arc<AppState>>,
    Path(primary): Path<String>,
) -> Result<Json<StoreSnapshot<String>>, AppError> {
    state
        .metrics
        .snapshot(&primary)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no samples for '{primary}'")))
}

// ─── GET /api/report ─────────────────────────────────────────────

pub async fn get_report(State(state): State<Arc<AppState>>) -> String {
    report::render_text(&state.metrics.snapshot_all())
}

// ─── GET /api/metrics/stream ─────────────────────────────────────
/// Server-Sent Events endpoint for a reporting sink.
/// Pushes a full snapshot as JSON once per configured interval.

pub async fn metrics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(state.config.stream_interval());

    let stream = IntervalStream::new(interval).map(move |_| {
        let snapshot = state.metrics.snapshot_all();
        let json = serde_json::to_string(&snapshot).unwrap_or_default();
        Ok(Event::default().event("snapshot").data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
