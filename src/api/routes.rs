use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/questionnaire", get(handlers::get_questionnaire))
        // Sessions
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        // Questionnaire
        .route("/sessions/:id/user", post(handlers::submit_user))
        .route("/sessions/:id/answers", put(handlers::record_answers))
        .route("/sessions/:id/steps/next", post(handlers::next_step))
        .route("/sessions/:id/steps/previous", post(handlers::previous_step))
        .route("/sessions/:id/steps/restart", post(handlers::restart_steps))
        // Matching
        .route("/sessions/:id/suggestions", post(handlers::request_suggestions))
        .route("/sessions/:id/suggestion", get(handlers::get_suggestion))
        .route("/sessions/:id/dislike", post(handlers::dislike))
        .route("/sessions/:id/like", post(handlers::like))
        .route("/sessions/:id/refill", post(handlers::refill))
        .route("/sessions/:id/reset", post(handlers::reset))
        // Details
        .route("/sessions/:id/details", get(handlers::get_details))
}
