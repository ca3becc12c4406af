//! Application state management.

use std::sync::Arc;
use std::time::Duration;

use crate::infra::{Database, RestaurantRepository, UserRepository};

use super::restaurant_service::RestaurantService;
use super::service::UserService;

/// Default per-request deadline
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub restaurants: Arc<RestaurantService>,
    pub db: Arc<Database>,
    /// Deadline applied to every request context
    pub request_timeout: Duration,
}

impl AppState {
    /// Create a new application state
    #[must_use]
    pub fn new(
        db: Arc<Database>,
        user_repo: Arc<dyn UserRepository>,
        restaurant_repo: Arc<dyn RestaurantRepository>,
    ) -> Self {
        let users = Arc::new(UserService::new(Arc::clone(&db), Arc::clone(&user_repo)));
        let restaurants = Arc::new(RestaurantService::new(
            Arc::clone(&db),
            user_repo,
            restaurant_repo,
        ));
        Self {
            users,
            restaurants,
            db,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
