//! Domain service for user accounts and author subscriptions.

use thiserror::Error;

use crate::api::types::{Page, RegisteredUserDto, SubscriptionDto, UserDto};
use crate::models::ValidationError;
use crate::models::user::{NewUser, SetPassword};
use crate::services::recipe_service::PageRequest;

/// Errors specific to user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UserError {
    #[must_use]
    pub fn user_not_found(id: i32) -> Self {
        Self::NotFound(format!("User {id} not found"))
    }
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for users.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Validation`] for malformed fields or a taken
    /// email/username.
    async fn register(&self, user: NewUser) -> Result<RegisteredUserDto, UserError>;

    /// Lists users newest first, `is_subscribed` relative to `viewer`.
    async fn list(&self, viewer: Option<i32>, page: PageRequest)
    -> Result<Page<UserDto>, UserError>;

    async fn get(&self, id: i32, viewer: Option<i32>) -> Result<UserDto, UserError>;

    /// Changes the password after checking the current one.
    async fn set_password(&self, user_id: i32, payload: SetPassword) -> Result<(), UserError>;

    /// Follows `author_id`.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Validation`] for a self-follow or a repeated follow.
    async fn subscribe(
        &self,
        user_id: i32,
        author_id: i32,
        recipes_limit: Option<u64>,
    ) -> Result<SubscriptionDto, UserError>;

    async fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<(), UserError>;

    /// Authors followed by `user_id`, most recent follow first.
    async fn subscriptions(
        &self,
        user_id: i32,
        page: PageRequest,
        recipes_limit: Option<u64>,
    ) -> Result<Page<SubscriptionDto>, UserError>;
}
