use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::localhost_only;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    // Called by the local scheduler only
    let automation_routes = Router::new()
        .route("/send-inspiration", post(handlers::send_inspiration))
        .layer(middleware::from_fn(localhost_only));

    let telegram_routes = Router::new()
        .route("/webhook", post(handlers::telegram_webhook))
        .route("/setup-webhook", post(handlers::setup_webhook))
        .route("/remove-webhook", post(handlers::remove_webhook))
        .route("/webhook-info", get(handlers::webhook_info));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/automation", automation_routes)
        .nest("/telegram", telegram_routes)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
