use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::db::is_unique_violation;
use crate::entities::{auth_tokens, prelude::*, users};

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns the user's token, creating one on first login.
    pub async fn get_or_create(&self, user_id: i32) -> Result<String> {
        if let Some(key) = self.key_for(user_id).await? {
            return Ok(key);
        }

        let key = generate_token();
        let inserted = AuthTokens::insert(auth_tokens::ActiveModel {
            key: Set(key.clone()),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        })
        .exec(&self.conn)
        .await;

        match inserted {
            Ok(_) => Ok(key),
            // A concurrent login stored its token first.
            Err(err) => {
                let err = anyhow::Error::from(err);
                if !is_unique_violation(&err) {
                    return Err(err.context("Failed to store auth token"));
                }
                self.key_for(user_id)
                    .await?
                    .context("Auth token vanished after a concurrent insert")
            }
        }
    }

    async fn key_for(&self, user_id: i32) -> Result<Option<String>> {
        let existing = AuthTokens::find()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query auth token")?;

        Ok(existing.map(|token| token.key))
    }

    pub async fn find_user(&self, key: &str) -> Result<Option<users::Model>> {
        let row = AuthTokens::find_by_id(key.to_string())
            .find_also_related(Users)
            .one(&self.conn)
            .await
            .context("Failed to query user by token")?;

        Ok(row.and_then(|(_, user)| user))
    }

    pub async fn delete_for_user(&self, user_id: i32) -> Result<()> {
        AuthTokens::delete_many()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}

/// Generate a random token key (40 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 20] = rng.random();

    bytes.iter().fold(String::with_capacity(40), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }
}
