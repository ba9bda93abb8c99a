use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{debug, info};

/// Adds `Server-Timing` to every response and logs API requests with their
/// duration. The SSE stream is logged at debug level only, since it stays
/// open for the lifetime of the client.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();

    let server_timing = format!("handler;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("Server-Timing", val);
    }

    let status = response.status().as_u16();
    let elapsed_us = elapsed.as_micros() as u64;
    if path.ends_with("/stream") {
        debug!(%method, %path, status, elapsed_us, "request");
    } else {
        info!(%method, %path, status, elapsed_us, "request");
    }

    response
}
