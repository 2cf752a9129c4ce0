use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::config::{apply_security_headers, create_cors_layer, Config};
use crate::handlers::{events, health_check, meta, readiness_check};
use crate::AppState;

pub const API_PREFIX: &str = "/api";

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let events_routes = Router::new()
        .route(
            "/events",
            get(events::search_events).post(events::create_event),
        )
        .route(
            "/events/",
            get(events::search_events).post(events::create_event),
        )
        .route(
            "/events/:id",
            get(events::get_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        .route("/meta/categories", get(meta::list_categories));

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest(API_PREFIX, events_routes)
        .with_state(state);

    apply_security_headers(router, config.production)
        .layer(create_cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}
