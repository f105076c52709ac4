//! Delicious store directory library.
//!
//! The binary in `main.rs` only wires configuration, tracing and Sentry
//! around [`app`]; everything else lives here so it can be tested.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::Request};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Static assets (scripts, styles, the placeholder photo).
pub const PUBLIC_DIR: &str = "crates/web/public";

/// Build the full application router.
///
/// The Sentry layers are added by the binary so tests don't need a client.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());

    Router::new()
        .merge(routes::routes())
        .nest_service("/uploads", ServeDir::new(&state.config().uploads_dir))
        .nest_service("/public", ServeDir::new(PUBLIC_DIR))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}
