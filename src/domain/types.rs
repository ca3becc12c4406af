//! Domain types with validation support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct User {
    /// Unique identifier
    #[schema(example = 42)]
    pub id: i64,
    /// Display name
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    /// Email address, unique across users
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn new(id: i64, name: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            email,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Restaurant owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Restaurant {
    /// Unique identifier
    #[schema(example = 7)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    #[schema(example = "Blue Fig Bistro")]
    pub restaurant_name: String,
    pub restaurant_logo: String,
    pub restaurant_favicon: Option<String>,
    pub thumbnail_desktop: String,
    pub restaurant_phone: String,
    pub restaurant_whatsapp: String,
    pub restaurant_email: String,
    pub restaurant_address: Option<String>,
    pub restaurant_website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Owner record, present when loaded by id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<User>,
}

/// Request to create a user
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewUser {
    #[validate(required, length(min = 2, max = 100))]
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
    #[validate(required, email, length(max = 255))]
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
}

impl NewUser {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
        }
    }

    /// Name and email after validation has passed.
    pub(crate) fn fields(&self) -> (&str, &str) {
        (
            self.name.as_deref().unwrap_or_default(),
            self.email.as_deref().unwrap_or_default(),
        )
    }
}

/// Partial update of a user; absent fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
}

/// Request to create a batch of users in one transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewUserBatch {
    #[validate(length(min = 1, max = 500), nested)]
    pub users: Vec<NewUser>,
}

/// Request to create a restaurant
///
/// Only the name is checked up front; the remaining required columns are
/// enforced by the store and reported as `REQUIRED_FIELD`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewRestaurant {
    #[validate(required)]
    pub user_id: Option<i64>,
    #[validate(required, length(min = 2, max = 255))]
    #[schema(example = "Blue Fig Bistro")]
    pub restaurant_name: Option<String>,
    pub restaurant_logo: Option<String>,
    pub restaurant_favicon: Option<String>,
    pub thumbnail_desktop: Option<String>,
    pub restaurant_phone: Option<String>,
    pub restaurant_whatsapp: Option<String>,
    #[validate(email)]
    pub restaurant_email: Option<String>,
    pub restaurant_address: Option<String>,
    pub restaurant_website: Option<String>,
}

/// Partial update of a restaurant
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateRestaurant {
    #[validate(length(min = 2, max = 255))]
    pub restaurant_name: Option<String>,
    pub restaurant_logo: Option<String>,
    pub restaurant_favicon: Option<String>,
    pub thumbnail_desktop: Option<String>,
    pub restaurant_phone: Option<String>,
    pub restaurant_whatsapp: Option<String>,
    #[validate(email)]
    pub restaurant_email: Option<String>,
    pub restaurant_address: Option<String>,
    pub restaurant_website: Option<String>,
}

/// Create a user and their first restaurant atomically.
/// `restaurant.user_id` is ignored and replaced by the new user's id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewUserWithRestaurant {
    #[validate(nested)]
    pub user: NewUser,
    pub restaurant: NewRestaurant,
}

/// Result of an onboarding request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Onboarded {
    pub user: User,
    pub restaurant: Restaurant,
}

/// Error response body: `{ "errors": [ { message, extensions } ] }`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorEntry>,
}

/// A single rendered error
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorEntry {
    /// Human-readable summary
    #[schema(example = "Validation failed")]
    pub message: String,
    pub extensions: ErrorExtensions,
}

/// Machine-readable error metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorExtensions {
    /// Stable error code
    #[schema(example = "VALIDATION_ERROR")]
    pub code: String,
    /// Longer explanation
    #[schema(example = "email: must be provided; name: must be at least 2 characters")]
    pub details: Option<String>,
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Pool saturated but the database answers
    Degraded,
    /// Database unavailable
    Unhealthy,
}

/// Connection pool snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PoolStats {
    /// Open connections
    pub size: u32,
    /// Open connections not leased to any caller
    pub idle: u32,
    /// Configured upper bound
    pub max_connections: u32,
}

impl PoolStats {
    /// All connections leased and none can be opened.
    #[must_use]
    pub fn is_saturated(&self) -> bool {
        self.idle == 0 && self.size >= self.max_connections
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// Database health status
    pub database: HealthStatus,
    /// Pool statistics at check time
    pub pool: PoolStats,
    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
    /// Application version
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn new(database_reachable: bool, pool: PoolStats) -> Self {
        let database = match (database_reachable, pool.is_saturated()) {
            (false, _) => HealthStatus::Unhealthy,
            (true, true) => HealthStatus::Degraded,
            (true, false) => HealthStatus::Healthy,
        };
        Self {
            status: database,
            database,
            pool,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(size: u32, idle: u32) -> PoolStats {
        PoolStats {
            size,
            idle,
            max_connections: 10,
        }
    }

    #[test]
    fn test_new_user_validation() {
        assert!(NewUser::new("Ada", "ada@example.com").validate().is_ok());
        assert!(NewUser::new("A", "ada@example.com").validate().is_err());
        assert!(NewUser::new("Ada", "not-an-email").validate().is_err());
        assert!(NewUser::default().validate().is_err());
    }

    #[test]
    fn test_update_user_allows_partial() {
        let update = UpdateUser {
            name: None,
            email: Some("new@example.com".to_string()),
        };
        assert!(update.validate().is_ok());
        assert!(UpdateUser::default().validate().is_ok());
    }

    #[test]
    fn test_batch_requires_entries() {
        assert!(NewUserBatch::default().validate().is_err());
        let batch = NewUserBatch {
            users: vec![NewUser::new("Ada", "ada@example.com")],
        };
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn test_health_status_from_pool() {
        assert_eq!(
            HealthResponse::new(true, stats(3, 2)).status,
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthResponse::new(true, stats(10, 0)).status,
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthResponse::new(false, stats(0, 0)).status,
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn test_restaurant_owner_skipped_when_absent() {
        let now = Utc::now();
        let restaurant = Restaurant {
            id: 1,
            user_id: 2,
            restaurant_name: "Fig".to_string(),
            restaurant_logo: "logo.png".to_string(),
            restaurant_favicon: None,
            thumbnail_desktop: "thumb.png".to_string(),
            restaurant_phone: String::new(),
            restaurant_whatsapp: String::new(),
            restaurant_email: String::new(),
            restaurant_address: None,
            restaurant_website: None,
            created_at: now,
            updated_at: now,
            owner: None,
        };
        let json = serde_json::to_value(&restaurant).unwrap();
        assert!(json.get("owner").is_none());
    }
}
