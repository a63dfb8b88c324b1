use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use log::{debug, error};

use crate::collector::runner::Dispatcher;
use crate::collector::sink::SampleBuffer;
use crate::exposition;
use crate::metrics::METRICS;

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
}

/// `/metrics` runs one poll cycle per request; `/health` only reports
/// that the process is serving.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(AppState { dispatcher })
}

async fn metrics(State(state): State<AppState>) -> Response {
    METRICS.scrapes.fetch_add(1, Ordering::Relaxed);

    let buffer = SampleBuffer::new();
    state.dispatcher.poll_all(&buffer).await;

    let samples = buffer.drain();
    debug!("scrape finished samples={}", samples.len());

    match exposition::render(&samples, &METRICS) {
        Ok(body) => ([(header::CONTENT_TYPE, exposition::CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!("failed to encode metrics error={e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}
