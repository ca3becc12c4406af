//! PostgreSQL access: error translation, executors, transactions and
//! repositories.

pub mod executor;
pub mod postgres;
pub mod repository;
pub mod restaurants;
pub mod transaction;
pub mod translator;
pub mod users;

pub use executor::{
    PooledHandle, QueryExecutor, RowStream, Statement, TransactionHandle, decode_row,
};
pub use postgres::{Database, PostgresConfig};
pub use repository::{RestaurantRepository, UserRepository};
pub use restaurants::PgRestaurantRepository;
pub use translator::{DEFAULT_EMAIL_CONSTRAINT, ErrorTranslator};
pub use users::PgUserRepository;
