// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, quiz, stats},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quiz, stats).
/// * Quiz and stats routes require a bearer token.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let quiz_routes = Router::new()
        .route("/categories", get(quiz::get_categories))
        .route("/state", get(quiz::get_state))
        .route("/start", post(quiz::start_quiz))
        .route("/retry", post(quiz::retry_quiz))
        .route("/select", post(quiz::select_answer))
        .route("/next", post(quiz::next_question))
        .route("/previous", post(quiz::previous_question))
        .route("/reset", post(quiz::reset_quiz))
        .route("/review", get(quiz::review_quiz))
        .route("/record", post(quiz::record_result))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let stats_routes = Router::new()
        .route("/", get(stats::get_stats))
        .route("/live", get(stats::live_stats))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/stats", stats_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
