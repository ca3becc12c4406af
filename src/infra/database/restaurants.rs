//! PostgreSQL restaurant repository.

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use tracing::instrument;

use super::executor::{QueryExecutor, decode_row};
use super::repository::RestaurantRepository;
use crate::domain::{
    AppResult, NewRestaurant, RequestContext, Restaurant, ResultExt, UpdateRestaurant, User,
};

const RESTAURANT_COLUMNS: &str = "id, user_id, restaurant_name, restaurant_logo, \
     restaurant_favicon, thumbnail_desktop, restaurant_phone, restaurant_whatsapp, \
     restaurant_email, restaurant_address, restaurant_website, created_at, updated_at";

#[derive(Debug, Clone, Copy, Default)]
pub struct PgRestaurantRepository;

impl PgRestaurantRepository {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Parse a database row into a Restaurant without its owner
fn row_to_restaurant(row: &PgRow) -> Result<Restaurant, sqlx::Error> {
    Ok(Restaurant {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        restaurant_name: row.try_get("restaurant_name")?,
        restaurant_logo: row.try_get("restaurant_logo")?,
        restaurant_favicon: row.try_get("restaurant_favicon")?,
        thumbnail_desktop: row.try_get("thumbnail_desktop")?,
        restaurant_phone: row.try_get("restaurant_phone")?,
        restaurant_whatsapp: row.try_get("restaurant_whatsapp")?,
        restaurant_email: row.try_get("restaurant_email")?,
        restaurant_address: row.try_get("restaurant_address")?,
        restaurant_website: row.try_get("restaurant_website")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        owner: None,
    })
}

/// Restaurant joined with its owner; owner columns carry an `owner_` prefix.
fn row_to_restaurant_with_owner(row: &PgRow) -> Result<Restaurant, sqlx::Error> {
    let mut restaurant = row_to_restaurant(row)?;
    let owner_id: Option<i64> = row.try_get("owner_id")?;
    restaurant.owner = match owner_id {
        Some(id) => Some(User {
            id,
            name: row.try_get("owner_name")?,
            email: row.try_get("owner_email")?,
            created_at: row.try_get("owner_created_at")?,
            updated_at: row.try_get("owner_updated_at")?,
        }),
        None => None,
    };
    Ok(restaurant)
}

#[async_trait]
impl RestaurantRepository for PgRestaurantRepository {
    #[instrument(skip_all)]
    async fn find_all(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
    ) -> AppResult<Vec<Restaurant>> {
        let sql = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants ORDER BY id");
        q.query(ctx, sqlx::query(&sql))
            .decode_all(row_to_restaurant)
            .await
    }

    #[instrument(skip(self, q, ctx))]
    async fn find_by_id(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
    ) -> AppResult<Option<Restaurant>> {
        let sql = r#"
            SELECT r.id, r.user_id, r.restaurant_name, r.restaurant_logo,
                   r.restaurant_favicon, r.thumbnail_desktop, r.restaurant_phone,
                   r.restaurant_whatsapp, r.restaurant_email, r.restaurant_address,
                   r.restaurant_website, r.created_at, r.updated_at,
                   u.id AS owner_id, u.name AS owner_name, u.email AS owner_email,
                   u.created_at AS owner_created_at, u.updated_at AS owner_updated_at
            FROM restaurants r
            LEFT JOIN users u ON u.id = r.user_id
            WHERE r.id = $1
        "#;
        let row = q
            .query_one(ctx, sqlx::query(sql).bind(id))
            .await
            .optional()?;
        row.map(|row| decode_row(&*q, ctx, &row, row_to_restaurant_with_owner))
            .transpose()
    }

    /// Missing required columns are left to the store's NOT NULL
    /// constraints; the optional contact columns fall back to empty.
    #[instrument(skip(self, q, ctx, input), fields(user_id = ?input.user_id))]
    async fn create(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        input: &NewRestaurant,
    ) -> AppResult<Restaurant> {
        let sql = format!(
            r#"
            INSERT INTO restaurants (
                user_id, restaurant_name, restaurant_logo, restaurant_favicon,
                thumbnail_desktop, restaurant_phone, restaurant_whatsapp,
                restaurant_email, restaurant_address, restaurant_website
            )
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, ''), COALESCE($7, ''),
                    COALESCE($8, ''), $9, $10)
            RETURNING {RESTAURANT_COLUMNS}
            "#
        );
        let statement = sqlx::query(&sql)
            .bind(input.user_id)
            .bind(input.restaurant_name.as_deref())
            .bind(input.restaurant_logo.as_deref())
            .bind(input.restaurant_favicon.as_deref())
            .bind(input.thumbnail_desktop.as_deref())
            .bind(input.restaurant_phone.as_deref())
            .bind(input.restaurant_whatsapp.as_deref())
            .bind(input.restaurant_email.as_deref())
            .bind(input.restaurant_address.as_deref())
            .bind(input.restaurant_website.as_deref());
        let row = q.query_one(ctx, statement).await?;
        decode_row(&*q, ctx, &row, row_to_restaurant)
    }

    #[instrument(skip(self, q, ctx, input))]
    async fn update(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
        input: &UpdateRestaurant,
    ) -> AppResult<Restaurant> {
        let sql = format!(
            r#"
            UPDATE restaurants
            SET restaurant_name = COALESCE($1, restaurant_name),
                restaurant_logo = COALESCE($2, restaurant_logo),
                restaurant_favicon = COALESCE($3, restaurant_favicon),
                thumbnail_desktop = COALESCE($4, thumbnail_desktop),
                restaurant_phone = COALESCE($5, restaurant_phone),
                restaurant_whatsapp = COALESCE($6, restaurant_whatsapp),
                restaurant_email = COALESCE($7, restaurant_email),
                restaurant_address = COALESCE($8, restaurant_address),
                restaurant_website = COALESCE($9, restaurant_website),
                updated_at = NOW()
            WHERE id = $10
            RETURNING {RESTAURANT_COLUMNS}
            "#
        );
        let statement = sqlx::query(&sql)
            .bind(input.restaurant_name.as_deref())
            .bind(input.restaurant_logo.as_deref())
            .bind(input.restaurant_favicon.as_deref())
            .bind(input.thumbnail_desktop.as_deref())
            .bind(input.restaurant_phone.as_deref())
            .bind(input.restaurant_whatsapp.as_deref())
            .bind(input.restaurant_email.as_deref())
            .bind(input.restaurant_address.as_deref())
            .bind(input.restaurant_website.as_deref())
            .bind(id);
        let row = q.query_one(ctx, statement).await?;
        decode_row(&*q, ctx, &row, row_to_restaurant)
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
            sqlx::query("DELETE FROM restaurants WHERE id = $1 RETURNING id").bind(id),
        )
        .await?;
        Ok(())
    }
}
