//! User service: validation, then repository access on the shared pool or
//! inside one transaction.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::{
    AppResult, HealthResponse, NewUser, NewUserBatch, RequestContext, ResultExt, UpdateUser, User,
    validate_input,
};
use crate::infra::{Database, UserRepository};

pub struct UserService {
    db: Arc<Database>,
    users: Arc<dyn UserRepository>,
}

impl UserService {
    #[must_use]
    pub fn new(db: Arc<Database>, users: Arc<dyn UserRepository>) -> Self {
        Self { db, users }
    }

    /// Create a user.
    ///
    /// Uniqueness of the email is left to the store's unique index, so two
    /// concurrent requests with the same email cannot both succeed.
    #[instrument(skip(self, ctx, input), fields(request_id = %ctx.request_id()))]
    pub async fn create_user(&self, ctx: &RequestContext, input: NewUser) -> AppResult<User> {
        validate_input(&input)?;
        let mut q = self.db.handle();
        let user = self
            .users
            .create(&mut q, ctx, &input)
            .await
            .context("while creating user")?;
        info!(user_id = user.id, "User created");
        Ok(user)
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn get_user(&self, ctx: &RequestContext, id: i64) -> AppResult<Option<User>> {
        let mut q = self.db.handle();
        self.users
            .find_by_id(&mut q, ctx, id)
            .await
            .context("while loading user")
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn list_users(&self, ctx: &RequestContext) -> AppResult<Vec<User>> {
        let mut q = self.db.handle();
        self.users
            .find_all(&mut q, ctx)
            .await
            .context("while listing users")
    }

    #[instrument(skip(self, ctx, input), fields(request_id = %ctx.request_id()))]
    pub async fn update_user(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateUser,
    ) -> AppResult<User> {
        validate_input(&input)?;
        let mut q = self.db.handle();
        self.users
            .update(&mut q, ctx, id, &input)
            .await
            .context("while updating user")
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn delete_user(&self, ctx: &RequestContext, id: i64) -> AppResult<()> {
        let mut q = self.db.handle();
        self.users
            .delete(&mut q, ctx, id)
            .await
            .context("while deleting user")?;
        info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Create every user or none.
    #[instrument(skip(self, ctx, batch), fields(request_id = %ctx.request_id(), count = batch.users.len()))]
    pub async fn create_users(
        &self,
        ctx: &RequestContext,
        batch: NewUserBatch,
    ) -> AppResult<Vec<User>> {
        validate_input(&batch)?;
        let users = Arc::clone(&self.users);
        let created = self
            .db
            .run_in_transaction(ctx, move |tx, ctx| {
                Box::pin(async move { users.create_batch(tx, ctx, &batch.users).await })
            })
            .await
            .context("while creating users")?;
        info!(count = created.len(), "Users created");
        Ok(created)
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn email_taken(&self, ctx: &RequestContext, email: &str) -> AppResult<bool> {
        let mut q = self.db.handle();
        self.users
            .exists_by_email(&mut q, ctx, email)
            .await
            .context("while checking email")
    }

    /// Database reachability plus a pool snapshot
    #[instrument(skip(self, ctx))]
    pub async fn health_check(&self, ctx: &RequestContext) -> HealthResponse {
        let reachable = self.db.health_check(ctx).await.is_ok();
        HealthResponse::new(reachable, self.db.pool_stats())
    }
}
