//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use super::extract::{JsonBody, PathParam, QueryParams};
use crate::app::AppState;
use crate::domain::{
    DomainError, ErrorEntry, ErrorExtensions, ErrorResponse, HealthResponse, HealthStatus,
    NewRestaurant, NewUser, NewUserBatch, NewUserWithRestaurant, Onboarded, PoolStats,
    RequestContext, Restaurant, UpdateRestaurant, UpdateUser, User,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Restaurant Directory API",
        version = "0.1.0",
        description = "Users and their restaurants, backed by PostgreSQL",
        license(
            name = "MIT"
        )
    ),
    paths(
        list_users_handler,
        create_user_handler,
        create_users_handler,
        email_taken_handler,
        get_user_handler,
        update_user_handler,
        delete_user_handler,
        list_restaurants_handler,
        create_restaurant_handler,
        onboard_handler,
        get_restaurant_handler,
        update_restaurant_handler,
        delete_restaurant_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
    ),
    components(
        schemas(
            User,
            NewUser,
            UpdateUser,
            NewUserBatch,
            Restaurant,
            NewRestaurant,
            UpdateRestaurant,
            NewUserWithRestaurant,
            Onboarded,
            EmailAvailability,
            HealthResponse,
            HealthStatus,
            PoolStats,
            ErrorResponse,
            ErrorEntry,
            ErrorExtensions,
        )
    ),
    tags(
        (name = "users", description = "User management endpoints"),
        (name = "restaurants", description = "Restaurant management endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Query for the email availability check
#[derive(Debug, Deserialize, IntoParams)]
pub struct EmailQuery {
    /// Email address to look up
    pub email: String,
}

/// Whether an email address is registered
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmailAvailability {
    pub email: String,
    pub taken: bool,
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = Vec<User>),
        (status = 408, description = "Request canceled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<Vec<User>>, DomainError> {
    let users = state.users.list_users(&ctx).await?;
    Ok(Json(users))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    JsonBody(payload): JsonBody<NewUser>,
) -> Result<(StatusCode, Json<User>), DomainError> {
    let user = state.users.create_user(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Create several users atomically
///
/// Either every user is created or none is.
#[utoipa::path(
    post,
    path = "/users/batch",
    tag = "users",
    request_body = NewUserBatch,
    responses(
        (status = 201, description = "Users created", body = Vec<User>),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "An email is already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_users_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    JsonBody(payload): JsonBody<NewUserBatch>,
) -> Result<(StatusCode, Json<Vec<User>>), DomainError> {
    let users = state.users.create_users(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(users)))
}

/// Check whether an email address is registered
#[utoipa::path(
    get,
    path = "/users/email-taken",
    tag = "users",
    params(EmailQuery),
    responses(
        (status = 200, description = "Availability", body = EmailAvailability),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn email_taken_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    QueryParams(query): QueryParams<EmailQuery>,
) -> Result<Json<EmailAvailability>, DomainError> {
    let taken = state.users.email_taken(&ctx, &query.email).await?;
    Ok(Json(EmailAvailability {
        email: query.email,
        taken,
    }))
}

/// Get a single user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    PathParam(id): PathParam<i64>,
) -> Result<Json<User>, DomainError> {
    let user = state
        .users
        .get_user(&ctx, id)
        .await?
        .ok_or_else(DomainError::not_found)?;
    Ok(Json(user))
}

/// Update a user; absent fields are left unchanged
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    request_body = UpdateUser,
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<UpdateUser>,
) -> Result<Json<User>, DomainError> {
    let user = state.users.update_user(&ctx, id, payload).await?;
    Ok(Json(user))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "User still owns restaurants", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode, DomainError> {
    state.users.delete_user(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List all restaurants
#[utoipa::path(
    get,
    path = "/restaurants",
    tag = "restaurants",
    responses(
        (status = 200, description = "All restaurants", body = Vec<Restaurant>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_restaurants_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<Vec<Restaurant>>, DomainError> {
    let restaurants = state.restaurants.list_restaurants(&ctx).await?;
    Ok(Json(restaurants))
}

/// Create a restaurant for an existing user
#[utoipa::path(
    post,
    path = "/restaurants",
    tag = "restaurants",
    request_body = NewRestaurant,
    responses(
        (status = 201, description = "Restaurant created", body = Restaurant),
        (status = 400, description = "Validation error or required field missing", body = ErrorResponse),
        (status = 422, description = "Owner does not exist", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_restaurant_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    JsonBody(payload): JsonBody<NewRestaurant>,
) -> Result<(StatusCode, Json<Restaurant>), DomainError> {
    let restaurant = state.restaurants.create_restaurant(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(restaurant)))
}

/// Create a user together with their first restaurant
#[utoipa::path(
    post,
    path = "/restaurants/onboard",
    tag = "restaurants",
    request_body = NewUserWithRestaurant,
    responses(
        (status = 201, description = "User and restaurant created", body = Onboarded),
        (status = 400, description = "Validation error or required field missing", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn onboard_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    JsonBody(payload): JsonBody<NewUserWithRestaurant>,
) -> Result<(StatusCode, Json<Onboarded>), DomainError> {
    let onboarded = state.restaurants.onboard(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(onboarded)))
}

/// Get a restaurant with its owner
#[utoipa::path(
    get,
    path = "/restaurants/{id}",
    tag = "restaurants",
    params(
        ("id" = i64, Path, description = "Restaurant ID")
    ),
    responses(
        (status = 200, description = "Restaurant found", body = Restaurant),
        (status = 404, description = "Restaurant not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_restaurant_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Restaurant>, DomainError> {
    let restaurant = state
        .restaurants
        .get_restaurant(&ctx, id)
        .await?
        .ok_or_else(DomainError::not_found)?;
    Ok(Json(restaurant))
}

/// Update a restaurant; absent fields are left unchanged
#[utoipa::path(
    put,
    path = "/restaurants/{id}",
    tag = "restaurants",
    request_body = UpdateRestaurant,
    params(
        ("id" = i64, Path, description = "Restaurant ID")
    ),
    responses(
        (status = 200, description = "Restaurant updated", body = Restaurant),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Restaurant not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_restaurant_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<UpdateRestaurant>,
) -> Result<Json<Restaurant>, DomainError> {
    let restaurant = state
        .restaurants
        .update_restaurant(&ctx, id, payload)
        .await?;
    Ok(Json(restaurant))
}

/// Delete a restaurant
#[utoipa::path(
    delete,
    path = "/restaurants/{id}",
    tag = "restaurants",
    params(
        ("id" = i64, Path, description = "Restaurant ID")
    ),
    responses(
        (status = 204, description = "Restaurant deleted"),
        (status = 404, description = "Restaurant not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_restaurant_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode, DomainError> {
    state.restaurants.delete_restaurant(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Json<HealthResponse> {
    let health = state.users.health_check(&ctx).await;
    Json(health)
}

/// Kubernetes liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic"),
        (status = 503, description = "Application is not ready")
    )
)]
pub async fn readiness_handler(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> StatusCode {
    let health = state.users.health_check(&ctx).await;
    match health.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}
