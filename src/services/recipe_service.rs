//! Domain service for recipes and the per-user recipe lists.
//!
//! Covers the recipe write path (validation plus transactional association
//! replacement), annotated reads, favorites/shopping cart toggles and the
//! shopping list export.

use thiserror::Error;

use crate::api::types::{Page, RecipeDto, ShortRecipeDto};
use crate::db::RecipeList;
use crate::models::ValidationError;
use crate::models::recipe::{RecipeFilter, RecipeWrite};

/// Errors specific to recipe operations.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("{0}")]
    NotFound(String),

    #[error("You do not have permission to modify this recipe")]
    Forbidden,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecipeError {
    #[must_use]
    pub fn recipe_not_found(id: i32) -> Self {
        Self::NotFound(format!("Recipe {id} not found"))
    }
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Page request shared by the listing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

/// Domain service trait for recipes.
#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    /// Lists recipes newest first, annotated for `viewer`.
    async fn list(
        &self,
        filter: &RecipeFilter,
        viewer: Option<i32>,
        page: PageRequest,
    ) -> Result<Page<RecipeDto>, RecipeError>;

    async fn get(&self, id: i32, viewer: Option<i32>) -> Result<RecipeDto, RecipeError>;

    /// Creates a recipe owned by `author_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::Validation`] for any rejected field, including
    /// a name the author already used.
    async fn create(&self, author_id: i32, payload: RecipeWrite) -> Result<RecipeDto, RecipeError>;

    /// Replaces the recipe fields and associations.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::Forbidden`] when `user_id` is not the author.
    async fn update(
        &self,
        id: i32,
        user_id: i32,
        payload: RecipeWrite,
    ) -> Result<RecipeDto, RecipeError>;

    async fn delete(&self, id: i32, user_id: i32) -> Result<(), RecipeError>;

    /// Puts the recipe on one of the user's lists.
    async fn add_to_list(
        &self,
        list: RecipeList,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<ShortRecipeDto, RecipeError>;

    async fn remove_from_list(
        &self,
        list: RecipeList,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), RecipeError>;

    /// Renders the aggregated shopping list for the user's cart.
    async fn shopping_list(&self, user_id: i32) -> Result<String, RecipeError>;
}
