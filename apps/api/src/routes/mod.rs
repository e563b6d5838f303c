pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::email::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/email/generate", post(handlers::handle_generate_email))
        .with_state(state)
}
