//! Restaurant service, including atomic onboarding of a new owner.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::{
    AppResult, NewRestaurant, NewUserWithRestaurant, Onboarded, RequestContext, Restaurant,
    ResultExt, UpdateRestaurant, validate_input,
};
use crate::infra::{Database, RestaurantRepository, UserRepository};

pub struct RestaurantService {
    db: Arc<Database>,
    users: Arc<dyn UserRepository>,
    restaurants: Arc<dyn RestaurantRepository>,
}

impl RestaurantService {
    #[must_use]
    pub fn new(
        db: Arc<Database>,
        users: Arc<dyn UserRepository>,
        restaurants: Arc<dyn RestaurantRepository>,
    ) -> Self {
        Self {
            db,
            users,
            restaurants,
        }
    }

    /// An unknown owner surfaces as `FOREIGN_KEY_VIOLATION`, a missing
    /// logo or thumbnail as `REQUIRED_FIELD`.
    #[instrument(skip(self, ctx, input), fields(request_id = %ctx.request_id()))]
    pub async fn create_restaurant(
        &self,
        ctx: &RequestContext,
        input: NewRestaurant,
    ) -> AppResult<Restaurant> {
        validate_input(&input)?;
        let mut q = self.db.handle();
        let restaurant = self
            .restaurants
            .create(&mut q, ctx, &input)
            .await
            .context("while creating restaurant")?;
        info!(
            restaurant_id = restaurant.id,
            user_id = restaurant.user_id,
            "Restaurant created"
        );
        Ok(restaurant)
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn get_restaurant(
        &self,
        ctx: &RequestContext,
        id: i64,
    ) -> AppResult<Option<Restaurant>> {
        let mut q = self.db.handle();
        self.restaurants
            .find_by_id(&mut q, ctx, id)
            .await
            .context("while loading restaurant")
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn list_restaurants(&self, ctx: &RequestContext) -> AppResult<Vec<Restaurant>> {
        let mut q = self.db.handle();
        self.restaurants
            .find_all(&mut q, ctx)
            .await
            .context("while listing restaurants")
    }

    #[instrument(skip(self, ctx, input), fields(request_id = %ctx.request_id()))]
    pub async fn update_restaurant(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: UpdateRestaurant,
    ) -> AppResult<Restaurant> {
        validate_input(&input)?;
        let mut q = self.db.handle();
        self.restaurants
            .update(&mut q, ctx, id, &input)
            .await
            .context("while updating restaurant")
    }

    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn delete_restaurant(&self, ctx: &RequestContext, id: i64) -> AppResult<()> {
        let mut q = self.db.handle();
        self.restaurants
            .delete(&mut q, ctx, id)
            .await
            .context("while deleting restaurant")?;
        info!(restaurant_id = id, "Restaurant deleted");
        Ok(())
    }

    /// Create a user and their restaurant in one transaction. Any failure
    /// leaves neither row behind.
    #[instrument(skip(self, ctx, input), fields(request_id = %ctx.request_id()))]
    pub async fn onboard(
        &self,
        ctx: &RequestContext,
        input: NewUserWithRestaurant,
    ) -> AppResult<Onboarded> {
        validate_input(&input)?;
        let users = Arc::clone(&self.users);
        let restaurants = Arc::clone(&self.restaurants);
        let onboarded = self
            .db
            .run_in_transaction(ctx, move |tx, ctx| {
                Box::pin(async move {
                    let user = users.create(tx, ctx, &input.user).await?;
                    let restaurant = NewRestaurant {
                        user_id: Some(user.id),
                        ..input.restaurant
                    };
                    validate_input(&restaurant)?;
                    let restaurant = restaurants.create(tx, ctx, &restaurant).await?;
                    Ok(Onboarded { user, restaurant })
                })
            })
            .await
            .context("while onboarding restaurant owner")?;
        info!(
            user_id = onboarded.user.id,
            restaurant_id = onboarded.restaurant.id,
            "Restaurant owner onboarded"
        );
        Ok(onboarded)
    }
}
