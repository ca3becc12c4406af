//! Infrastructure layer implementations.

pub mod database;

pub use database::{
    Database, ErrorTranslator, PgRestaurantRepository, PgUserRepository, PostgresConfig,
    QueryExecutor, RestaurantRepository, UserRepository,
};
