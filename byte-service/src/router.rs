//! HTTP routes for the Byte Service.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{handlers, AppState};

/// Build the application router.
///
/// CORS allows any origin, method and header, without credentials.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Liveness
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Quiz generation
        .route("/quiz/generate", post(handlers::generate_quiz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
