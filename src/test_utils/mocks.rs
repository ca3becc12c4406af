//! In-memory repositories for testing.
//!
//! They ignore the executor they are handed and keep rows in a map, but
//! report failures with the same error kinds the PostgreSQL repositories do.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::{
    AppResult, DomainError, NewRestaurant, NewUser, RequestContext, Restaurant, UpdateRestaurant,
    UpdateUser, User,
};
use crate::infra::{QueryExecutor, RestaurantRepository, UserRepository};

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Returned by every call when set
    pub failure: Option<DomainError>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(error: DomainError) -> Self {
        Self {
            failure: Some(error),
        }
    }
}

fn check(config: &MockConfig, ctx: &RequestContext) -> AppResult<()> {
    if ctx.is_interrupted() {
        return Err(DomainError::canceled());
    }
    match &config.failure {
        Some(error) => Err(error.clone()),
        None => Ok(()),
    }
}

/// Mock user repository enforcing unique emails
pub struct MockUserRepository {
    storage: Arc<Mutex<BTreeMap<i64, User>>>,
    next_id: AtomicI64,
    config: MockConfig,
}

impl MockUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            storage: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: AtomicI64::new(1),
            config,
        }
    }

    #[must_use]
    pub fn failing(error: DomainError) -> Self {
        Self::with_config(MockConfig::failure(error))
    }

    /// Get all stored users (for testing)
    pub fn get_all_items(&self) -> Vec<User> {
        self.storage.lock().unwrap().values().cloned().collect()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.storage.lock().unwrap().contains_key(&id)
    }

    fn insert(storage: &mut BTreeMap<i64, User>, id: i64, input: &NewUser) -> AppResult<User> {
        let (name, email) = input.fields();
        if storage.values().any(|u| u.email == email) {
            return Err(DomainError::duplicate_email());
        }
        let user = User::new(id, name.to_string(), email.to_string());
        storage.insert(id, user.clone());
        Ok(user)
    }
}

impl Default for MockUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_all(
        &self,
        _q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
    ) -> AppResult<Vec<User>> {
        check(&self.config, ctx)?;
        Ok(self.get_all_items())
    }

    async fn find_by_id(
        &self,
        _q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
    ) -> AppResult<Option<User>> {
        check(&self.config, ctx)?;
        Ok(self.storage.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(
        &self,
        _q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        email: &str,
    ) -> AppResult<Option<User>> {
        check(&self.config, ctx)?;
        let storage = self.storage.lock().unwrap();
        Ok(storage.values().find(|u| u.email == email).cloned())
    }

    async fn exists_by_email(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        email: &str,
    ) -> AppResult<bool> {
        Ok(self.find_by_email(q, ctx, email).await?.is_some())
    }

    async fn create(
        &self,
        _q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        input: &NewUser,
    ) -> AppResult<User> {
        check(&self.config, ctx)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut storage = self.storage.lock().unwrap();
        Self::insert(&mut storage, id, input)
    }

    /// All or nothing, like the single-statement insert.
    async fn create_batch(
        &self,
        _q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        inputs: &[NewUser],
    ) -> AppResult<Vec<User>> {
        check(&self.config, ctx)?;
        let mut storage = self.storage.lock().unwrap();
        let mut staged = storage.clone();
        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            created.push(Self::insert(&mut staged, id, input)?);
        }
        *storage = staged;
        Ok(created)
    }

    async fn update(
        &self,
        _q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
        input: &UpdateUser,
    ) -> AppResult<User> {
        check(&self.config, ctx)?;
        let mut storage = self.storage.lock().unwrap();
        let email_taken = input
            .email
            .as_ref()
            .is_some_and(|email| storage.values().any(|u| u.id != id && &u.email == email));
        if email_taken {
            return Err(DomainError::duplicate_email());
        }
        let user = storage.get_mut(&id).ok_or_else(DomainError::not_found)?;
        if let Some(name) = &input.name {
            user.name.clone_from(name);
        }
        if let Some(email) = &input.email {
            user.email.clone_from(email);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(
        &self,
        _q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
    ) -> AppResult<()> {
        check(&self.config, ctx)?;
        self.storage
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(DomainError::not_found)
    }
}

/// Mock restaurant repository checking owners against a user mock
pub struct MockRestaurantRepository {
    users: Arc<MockUserRepository>,
    storage: Arc<Mutex<BTreeMap<i64, Restaurant>>>,
    next_id: AtomicI64,
    config: MockConfig,
}

impl MockRestaurantRepository {
    #[must_use]
    pub fn new(users: Arc<MockUserRepository>) -> Self {
        Self::with_config(users, MockConfig::success())
    }

    #[must_use]
    pub fn with_config(users: Arc<MockUserRepository>, config: MockConfig) -> Self {
        Self {
            users,
            storage: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: AtomicI64::new(1),
            config,
        }
    }

    /// Get all stored restaurants (for testing)
    pub fn get_all_items(&self) -> Vec<Restaurant> {
        self.storage.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl RestaurantRepository for MockRestaurantRepository {
    async fn find_all(
        &self,
        _q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
    ) -> AppResult<Vec<Restaurant>> {
        check(&self.config, ctx)?;
        Ok(self.get_all_items())
    }

    async fn find_by_id(
        &self,
        q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
    ) -> AppResult<Option<Restaurant>> {
        check(&self.config, ctx)?;
        let found = self.storage.lock().unwrap().get(&id).cloned();
        match found {
            Some(mut restaurant) => {
                restaurant.owner = self.users.find_by_id(q, ctx, restaurant.user_id).await?;
                Ok(Some(restaurant))
            }
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        _q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        input: &NewRestaurant,
    ) -> AppResult<Restaurant> {
        check(&self.config, ctx)?;
        let (Some(user_id), Some(name), Some(logo), Some(thumbnail)) = (
            input.user_id,
            input.restaurant_name.clone(),
            input.restaurant_logo.clone(),
            input.thumbnail_desktop.clone(),
        ) else {
            return Err(DomainError::required_field());
        };
        if !self.users.contains(user_id) {
            return Err(DomainError::foreign_key_violation());
        }

        let now = Utc::now();
        let restaurant = Restaurant {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id,
            restaurant_name: name,
            restaurant_logo: logo,
            restaurant_favicon: input.restaurant_favicon.clone(),
            thumbnail_desktop: thumbnail,
            restaurant_phone: input.restaurant_phone.clone().unwrap_or_default(),
            restaurant_whatsapp: input.restaurant_whatsapp.clone().unwrap_or_default(),
            restaurant_email: input.restaurant_email.clone().unwrap_or_default(),
            restaurant_address: input.restaurant_address.clone(),
            restaurant_website: input.restaurant_website.clone(),
            created_at: now,
            updated_at: now,
            owner: None,
        };
        self.storage
            .lock()
            .unwrap()
            .insert(restaurant.id, restaurant.clone());
        Ok(restaurant)
    }

    async fn update(
        &self,
        _q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
        input: &UpdateRestaurant,
    ) -> AppResult<Restaurant> {
        check(&self.config, ctx)?;
        let mut storage = self.storage.lock().unwrap();
        let restaurant = storage.get_mut(&id).ok_or_else(DomainError::not_found)?;
        if let Some(name) = &input.restaurant_name {
            restaurant.restaurant_name.clone_from(name);
        }
        if let Some(logo) = &input.restaurant_logo {
            restaurant.restaurant_logo.clone_from(logo);
        }
        if input.restaurant_favicon.is_some() {
            restaurant.restaurant_favicon.clone_from(&input.restaurant_favicon);
        }
        if let Some(thumbnail) = &input.thumbnail_desktop {
            restaurant.thumbnail_desktop.clone_from(thumbnail);
        }
        if let Some(phone) = &input.restaurant_phone {
            restaurant.restaurant_phone.clone_from(phone);
        }
        if let Some(whatsapp) = &input.restaurant_whatsapp {
            restaurant.restaurant_whatsapp.clone_from(whatsapp);
        }
        if let Some(email) = &input.restaurant_email {
            restaurant.restaurant_email.clone_from(email);
        }
        if input.restaurant_address.is_some() {
            restaurant.restaurant_address.clone_from(&input.restaurant_address);
        }
        if input.restaurant_website.is_some() {
            restaurant.restaurant_website.clone_from(&input.restaurant_website);
        }
        restaurant.updated_at = Utc::now();
        Ok(restaurant.clone())
    }

    async fn delete(
        &self,
        _q: &mut dyn QueryExecutor,
        ctx: &RequestContext,
        id: i64,
    ) -> AppResult<()> {
        check(&self.config, ctx)?;
        self.storage
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(DomainError::not_found)
    }
}
