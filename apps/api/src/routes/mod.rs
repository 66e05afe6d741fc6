pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::intake::validation::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Request bodies may exceed the upload limit by the multipart framing and form
/// fields. Files over `MAX_UPLOAD_BYTES` are still rejected by the validator.
const BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/ats/analyze", post(handlers::handle_analyze))
        .route("/api/ats/history", get(handlers::handle_history))
        .route(
            "/api/ats/analysis/:analysis_id",
            get(handlers::handle_get_analysis).delete(handlers::handle_delete_analysis),
        )
        .route("/api/ats/keywords", post(handlers::handle_keywords))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}
