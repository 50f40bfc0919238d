//! Renoplan server library: HTTP routes and application state.
//!
//! Separated from main.rs so the router can be driven from integration tests.

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod session;
pub mod state;

use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Full application: `/api` routes, static frontend fallback, CORS and tracing.
pub fn app(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .nest("/api", routes::api_router())
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
