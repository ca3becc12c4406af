//! Domain layer containing core types, the error taxonomy, request context
//! and validation shaping.

pub mod context;
pub mod error;
pub mod types;
pub mod validation;

pub use context::RequestContext;
pub use error::{AppResult, ConfigError, DomainError, ErrorKind, ResultExt};
pub use types::{
    ErrorEntry, ErrorExtensions, ErrorResponse, HealthResponse, HealthStatus, NewRestaurant,
    NewUser, NewUserBatch, NewUserWithRestaurant, Onboarded, PoolStats, Restaurant,
    UpdateRestaurant, UpdateUser, User,
};
pub use validation::{FieldFailure, failures_from, shape, validate_input};
