//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::entities::users;
use crate::services::auth_service::{AuthError, AuthService};

pub struct SeaOrmAuthService {
    store: Store,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .store
            .user_repo()
            .verify_password(email.trim(), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self.store.token_repo().get_or_create(user.id).await?;

        info!(user_id = user.id, "User logged in");
        Ok(token)
    }

    async fn logout(&self, user_id: i32) -> Result<(), AuthError> {
        self.store.token_repo().delete_for_user(user_id).await?;
        info!(user_id, "User logged out");
        Ok(())
    }

    async fn authenticate(&self, token: &str) -> Result<Option<users::Model>, AuthError> {
        Ok(self.store.token_repo().find_user(token).await?)
    }
}
