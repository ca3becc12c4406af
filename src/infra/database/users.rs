//! PostgreSQL user repository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::instrument;

use super::executor::{QueryExecutor, decode_row};
use super::repository::UserRepository;
use crate::domain::{AppResult, NewUser, RequestContext, ResultExt, UpdateUser, User};

const USER_COLUMNS: &str = "id, name, email, created_at, updated_at";

#[derive(Debug, Clone, Copy, Default)]
pub struct PgUserRepository;

impl PgUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Parse a database row into a User
pub(crate) fn row_to_user(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip_all)]
    async fn find_all(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
    ) -> AppResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        q.query(ctx, sqlx::query(&sql)).decode_all(row_to_user).await
    }

    #[instrument(skip(self, q, ctx))]
    async fn find_by_id(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
    ) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = q
            .query_one(ctx, sqlx::query(&sql).bind(id))
            .await
            .optional()?;
        row.map(|row| decode_row(&*q, ctx, &row, row_to_user))
            .transpose()
    }

    #[instrument(skip(self, q, ctx))]
    async fn find_by_email(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        email: &str,
    ) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = q
            .query_one(ctx, sqlx::query(&sql).bind(email))
            .await
            .optional()?;
        row.map(|row| decode_row(&*q, ctx, &row, row_to_user))
            .transpose()
    }

    #[instrument(skip(self, q, ctx))]
    async fn exists_by_email(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        email: &str,
    ) -> AppResult<bool> {
        let row = q
            .query_one(
                ctx,
                sqlx::query("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1) AS taken")
                    .bind(email),
            )
            .await?;
        decode_row(&*q, ctx, &row, |row| row.try_get("taken"))
    }

    #[instrument(skip_all)]
    async fn create(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        input: &NewUser,
    ) -> AppResult<User> {
        let (name, email) = input.fields();
        let sql = format!(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        );
        let row = q
            .query_one(ctx, sqlx::query(&sql).bind(name).bind(email))
            .await?;
        decode_row(&*q, ctx, &row, row_to_user)
    }

    #[instrument(skip_all, fields(count = inputs.len()))]
    async fn create_batch(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        inputs: &[NewUser],
    ) -> AppResult<Vec<User>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO users (name, email) ");
        builder.push_values(inputs, |mut row, input| {
            let (name, email) = input.fields();
            row.push_bind(name).push_bind(email);
        });
        builder.push(" RETURNING ");
        builder.push(USER_COLUMNS);

        q.query(ctx, builder.build()).decode_all(row_to_user).await
    }

    #[instrument(skip(self, q, ctx, input))]
    async fn update(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
        input: &UpdateUser,
    ) -> AppResult<User> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                updated_at = NOW()
            WHERE id = $3
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = q
            .query_one(
                ctx,
                sqlx::query(&sql)
                    .bind(input.name.as_deref())
                    .bind(input.email.as_deref())
                    .bind(id),
            )
            .await?;
        decode_row(&*q, ctx, &row, row_to_user)
    }

    #[instrument(skip(self, q, ctx))]
    async fn delete(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
    ) -> AppResult<()> {
        q.query_one(
            ctx,
            sqlx::query("DELETE FROM users WHERE id = $1 RETURNING id").bind(id),
        )
        .await?;
        Ok(())
    }
}
