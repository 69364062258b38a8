//! Domain service for token authentication.
//!
//! Handles login (email + password to a reusable token), logout and
//! resolving a presented token to its user.

use thiserror::Error;

use crate::entities::users;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and returns the user's token, issuing one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, email: &str, password: &str) -> Result<String, AuthError>;

    /// Revokes the user's token.
    async fn logout(&self, user_id: i32) -> Result<(), AuthError>;

    /// Resolves a token to its owner, if the token is known.
    async fn authenticate(&self, token: &str) -> Result<Option<users::Model>, AuthError>;
}
