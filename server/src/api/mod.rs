pub mod extract;
pub mod handlers;
pub mod models;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::{require_permission, RequirePermission};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let gate = |permission: &'static str| {
        from_fn_with_state(
            RequirePermission::new(&state.verifier, permission),
            require_permission,
        )
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/drinks",
            get(handlers::list_drinks)
                .merge(post(handlers::create_drink).route_layer(gate("post:drinks"))),
        )
        .route(
            "/drinks-detail",
            get(handlers::list_drinks_detail).route_layer(gate("get:drinks-detail")),
        )
        .route(
            "/drinks/{id}",
            patch(handlers::update_drink)
                .route_layer(gate("patch:drinks"))
                .merge(delete(handlers::delete_drink).route_layer(gate("delete:drinks"))),
        )
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// CORS for browser clients. `*` anywhere in `origins` allows every origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
}
