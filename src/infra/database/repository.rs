//! Repository contracts.
//!
//! Every method takes the executor to run on, so the same repository works
//! on a pooled connection and inside a transaction.

use async_trait::async_trait;

use super::executor::QueryExecutor;
use crate::domain::{
    AppResult, NewRestaurant, NewUser, RequestContext, Restaurant, UpdateRestaurant, UpdateUser,
    User,
};

/// Persistence of users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users, oldest first
    async fn find_all(&self, q: &mut dyn QueryExecutor, ctx: &RequestContext)
    -> AppResult<Vec<User>>;

    /// `None` when no user has this id
    async fn find_by_id(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
    ) -> AppResult<Option<User>>;

    async fn find_by_email(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        email: &str,
    ) -> AppResult<Option<User>>;

    async fn exists_by_email(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        email: &str,
    ) -> AppResult<bool>;

    /// Insert one user. A taken email surfaces as `USER_EMAIL_EXISTS`.
    async fn create(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        input: &NewUser,
    ) -> AppResult<User>;

    /// Insert all users with one statement, in input order.
    async fn create_batch(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        inputs: &[NewUser],
    ) -> AppResult<Vec<User>>;

    /// Apply the present fields; `NotFound` when no user has this id.
    async fn update(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
        input: &UpdateUser,
    ) -> AppResult<User>;

    /// `NotFound` when no user has this id.
    async fn delete(&self, q: &mut dyn QueryExecutor, ctx: &RequestContext, id: i64)
    -> AppResult<()>;
}

/// Persistence of restaurants
#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    async fn find_all(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
    ) -> AppResult<Vec<Restaurant>>;

    /// Restaurant with its owner loaded; `None` when missing
    async fn find_by_id(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
    ) -> AppResult<Option<Restaurant>>;

    async fn create(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        input: &NewRestaurant,
    ) -> AppResult<Restaurant>;

    async fn update(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
        input: &UpdateRestaurant,
    ) -> AppResult<Restaurant>;

    async fn delete(&self, q: &mut dyn QueryExecutor, ctx: &RequestContext, id: i64)
    -> AppResult<()>;
}
