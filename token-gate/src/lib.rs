pub mod app_state;
pub mod config;
pub mod handlers;

use axum::routing::get;
use axum::Router;

pub use crate::app_state::AppState;
pub use crate::config::GateConfig;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/keyz", get(handlers::key_status))
        .route("/whoami", get(handlers::whoami))
        .with_state(state)
}
