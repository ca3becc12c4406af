//! Application layer containing business logic and shared state.

pub mod pool_monitor;
pub mod restaurant_service;
pub mod service;
pub mod state;

pub use pool_monitor::{PoolMonitor, PoolMonitorConfig, spawn_pool_monitor};
pub use restaurant_service::RestaurantService;
pub use service::UserService;
pub use state::{AppState, DEFAULT_REQUEST_TIMEOUT};
