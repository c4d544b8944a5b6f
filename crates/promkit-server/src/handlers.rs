//! Sample request handlers

use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use std::sync::Arc;
use std::time::Instant;

use crate::state::AppState;

/// `GET /hello`
pub async fn hello(State(state): State<Arc<AppState>>, method: Method) -> String {
    let start = Instant::now();
    let body = greet("world");
    state.record(method.as_str(), start.elapsed(), false);
    body
}

/// `GET /hello/{name}`
pub async fn hello_name(
    State(state): State<Arc<AppState>>,
    method: Method,
    Path(name): Path<String>,
) -> String {
    let start = Instant::now();
    let body = greet(&name);
    state.record(method.as_str(), start.elapsed(), false);
    body
}

/// `GET /fail`, always answered with 500 and counted as an error
pub async fn fail(
    State(state): State<Arc<AppState>>,
    method: Method,
) -> (StatusCode, &'static str) {
    let start = Instant::now();
    state.record(method.as_str(), start.elapsed(), true);
    (StatusCode::INTERNAL_SERVER_ERROR, "simulated failure")
}

/// `GET /health`
pub async fn health() -> &'static str {
    "OK"
}

fn greet(name: &str) -> String {
    format!("Hello, {}!", name)
}
