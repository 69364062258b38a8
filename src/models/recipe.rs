use serde::Deserialize;
use std::collections::HashSet;

use super::ValidationError;

pub const MAX_RECIPE_NAME_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i32,
}

/// Body of `POST /recipes` and `PATCH /recipes/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeWrite {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub cooking_time: i32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<i32>,
    #[serde(default)]
    pub ingredients: Vec<IngredientAmount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

impl RecipeWrite {
    /// Checks everything that can be decided without the database.
    pub fn validate(&self, mode: WriteMode) -> Result<(), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::new("name", "Recipe name is required"));
        }
        if name.chars().count() > MAX_RECIPE_NAME_LENGTH {
            return Err(ValidationError::new(
                "name",
                format!("Recipe name must be {MAX_RECIPE_NAME_LENGTH} characters or less"),
            ));
        }

        if self.text.trim().is_empty() {
            return Err(ValidationError::new("text", "Recipe text is required"));
        }

        if self.cooking_time < 1 {
            return Err(ValidationError::new(
                "cooking_time",
                "Cooking time must be at least 1 minute",
            ));
        }

        let has_image = self
            .image
            .as_deref()
            .is_some_and(|image| !image.trim().is_empty());
        if mode == WriteMode::Create && !has_image {
            return Err(ValidationError::new("image", "Image is required"));
        }

        validate_tags(&self.tags)?;
        validate_ingredients(&self.ingredients)?;

        Ok(())
    }

    #[must_use]
    pub fn ingredient_ids(&self) -> Vec<i32> {
        self.ingredients.iter().map(|i| i.id).collect()
    }
}

pub fn validate_tags(tags: &[i32]) -> Result<(), ValidationError> {
    if tags.is_empty() {
        return Err(ValidationError::new("tags", "At least one tag is required"));
    }

    let mut seen = HashSet::with_capacity(tags.len());
    if !tags.iter().all(|id| seen.insert(*id)) {
        return Err(ValidationError::new("tags", "Tags must not repeat"));
    }

    Ok(())
}

pub fn validate_ingredients(ingredients: &[IngredientAmount]) -> Result<(), ValidationError> {
    if ingredients.is_empty() {
        return Err(ValidationError::new(
            "ingredients",
            "At least one ingredient is required",
        ));
    }

    if ingredients.iter().any(|i| i.amount < 1) {
        return Err(ValidationError::new(
            "ingredients",
            "Ingredient amount must be at least 1",
        ));
    }

    let mut seen = HashSet::with_capacity(ingredients.len());
    if !ingredients.iter().all(|i| seen.insert(i.id)) {
        return Err(ValidationError::new(
            "ingredients",
            "Ingredients must not repeat",
        ));
    }

    Ok(())
}

/// Criteria accepted by the recipe listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Tag slugs; a recipe matches when it carries any of them.
    pub tags: Vec<String>,
    pub author: Option<i32>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}
