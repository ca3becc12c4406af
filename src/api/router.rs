//! Router construction.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info_span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::extract::REQUEST_ID_HEADER;
use super::handlers::{
    ApiDoc, create_restaurant_handler, create_user_handler, create_users_handler,
    delete_restaurant_handler, delete_user_handler, email_taken_handler, get_restaurant_handler,
    get_user_handler, health_check_handler, list_restaurants_handler, list_users_handler,
    liveness_handler, onboard_handler, readiness_handler, update_restaurant_handler,
    update_user_handler,
};
use crate::app::AppState;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Create the application router with tracing and Swagger UI
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route("/users/batch", post(create_users_handler))
        .route("/users/email-taken", get(email_taken_handler))
        .route(
            "/users/{id}",
            get(get_user_handler)
                .put(update_user_handler)
                .delete(delete_user_handler),
        )
        .route(
            "/restaurants",
            get(list_restaurants_handler).post(create_restaurant_handler),
        )
        .route("/restaurants/onboard", post(onboard_handler))
        .route(
            "/restaurants/{id}",
            get(get_restaurant_handler)
                .put(update_restaurant_handler)
                .delete(delete_restaurant_handler),
        )
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(&REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default();
                info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .layer(middleware)
}
