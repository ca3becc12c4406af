//! User and restaurant directory service.
//!
//! Layers, leaves first:
//!
//! - [`domain`] - error taxonomy, request context, entities and validation shaping
//! - [`infra`] - PostgreSQL pool, query executors, transactions, error translation
//!   and repositories
//! - [`app`] - services and shared state
//! - [`api`] - HTTP handlers, routing and error rendering

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
