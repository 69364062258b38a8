//! `SeaORM` implementation of the `RecipeService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::api::types::{Page, RecipeDto, ShortRecipeDto, TagDto, UserDto};
use crate::db::{RecipeList, Store, is_unique_violation};
use crate::entities::recipes;
use crate::models::ValidationError;
use crate::models::recipe::{RecipeFilter, RecipeWrite, WriteMode};
use crate::services::recipe_service::{PageRequest, RecipeError, RecipeService};
use crate::services::shopping_list;

const DUPLICATE_NAME: &str = "You already have a recipe with this name";

pub struct SeaOrmRecipeService {
    store: Store,
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn find(&self, id: i32) -> Result<recipes::Model, RecipeError> {
        self.store
            .recipe_repo()
            .get(id)
            .await?
            .ok_or_else(|| RecipeError::recipe_not_found(id))
    }

    async fn find_owned(&self, id: i32, user_id: i32) -> Result<recipes::Model, RecipeError> {
        let recipe = self.find(id).await?;
        if recipe.author_id != user_id {
            return Err(RecipeError::Forbidden);
        }
        Ok(recipe)
    }

    /// Checks the parts of a write payload that need the database.
    async fn check_references(
        &self,
        author_id: i32,
        payload: &RecipeWrite,
        exclude: Option<i32>,
    ) -> Result<(), RecipeError> {
        let missing_tags = self.store.tag_repo().missing_ids(&payload.tags).await?;
        if let Some(id) = missing_tags.first() {
            return Err(ValidationError::new("tags", format!("Tag {id} does not exist")).into());
        }

        let missing_ingredients = self
            .store
            .ingredient_repo()
            .missing_ids(&payload.ingredient_ids())
            .await?;
        if let Some(id) = missing_ingredients.first() {
            return Err(
                ValidationError::new("ingredients", format!("Ingredient {id} does not exist"))
                    .into(),
            );
        }

        let taken = self
            .store
            .recipe_repo()
            .name_taken(author_id, payload.name.trim(), exclude)
            .await?;
        if taken {
            return Err(ValidationError::new("name", DUPLICATE_NAME).into());
        }

        Ok(())
    }

    /// Builds full representations with one batched query per relation.
    async fn annotate(
        &self,
        recipes: Vec<recipes::Model>,
        viewer: Option<i32>,
    ) -> Result<Vec<RecipeDto>, RecipeError> {
        let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
        let mut author_ids: Vec<i32> = recipes.iter().map(|r| r.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let mut tags = self.store.tag_repo().for_recipes(&recipe_ids).await?;
        let mut ingredients = self
            .store
            .ingredient_repo()
            .for_recipes(&recipe_ids)
            .await?;
        let authors = self.store.user_repo().get_many(&author_ids).await?;

        let (favorited, in_cart, subscribed) = match viewer {
            Some(user_id) => {
                let memberships = self.store.membership_repo();
                (
                    memberships
                        .recipe_ids_among(RecipeList::Favorites, user_id, &recipe_ids)
                        .await?,
                    memberships
                        .recipe_ids_among(RecipeList::ShoppingCart, user_id, &recipe_ids)
                        .await?,
                    self.store
                        .follow_repo()
                        .followed_among(user_id, &author_ids)
                        .await?,
                )
            }
            None => Default::default(),
        };

        recipes
            .into_iter()
            .map(|recipe| -> Result<RecipeDto, RecipeError> {
                let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                    RecipeError::Internal(format!(
                        "Author {} of recipe {} is missing",
                        recipe.author_id, recipe.id
                    ))
                })?;

                Ok(RecipeDto {
                    id: recipe.id,
                    tags: tags
                        .remove(&recipe.id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(TagDto::from)
                        .collect(),
                    author: UserDto::new(author, subscribed.contains(&recipe.author_id)),
                    ingredients: ingredients
                        .remove(&recipe.id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(Into::into)
                        .collect(),
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: in_cart.contains(&recipe.id),
                    name: recipe.name,
                    image: recipe.image,
                    text: recipe.text,
                    cooking_time: recipe.cooking_time,
                })
            })
            .collect()
    }

    async fn annotate_one(
        &self,
        recipe: recipes::Model,
        viewer: Option<i32>,
    ) -> Result<RecipeDto, RecipeError> {
        let id = recipe.id;
        self.annotate(vec![recipe], viewer)
            .await?
            .pop()
            .ok_or_else(|| RecipeError::recipe_not_found(id))
    }
}

fn map_write_error(err: anyhow::Error) -> RecipeError {
    if is_unique_violation(&err) {
        ValidationError::new("name", DUPLICATE_NAME).into()
    } else {
        err.into()
    }
}

const fn already_listed(list: RecipeList) -> &'static str {
    match list {
        RecipeList::Favorites => "Recipe is already in favorites",
        RecipeList::ShoppingCart => "Recipe is already in the shopping cart",
    }
}

const fn not_listed(list: RecipeList) -> &'static str {
    match list {
        RecipeList::Favorites => "Recipe is not in favorites",
        RecipeList::ShoppingCart => "Recipe is not in the shopping cart",
    }
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn list(
        &self,
        filter: &RecipeFilter,
        viewer: Option<i32>,
        page: PageRequest,
    ) -> Result<Page<RecipeDto>, RecipeError> {
        let (recipes, total) = self
            .store
            .recipe_repo()
            .list(filter, viewer, page.page, page.page_size)
            .await?;

        let results = self.annotate(recipes, viewer).await?;
        Ok(Page::new(results, total, page.page, page.page_size))
    }

    async fn get(&self, id: i32, viewer: Option<i32>) -> Result<RecipeDto, RecipeError> {
        let recipe = self.find(id).await?;
        self.annotate_one(recipe, viewer).await
    }

    async fn create(&self, author_id: i32, payload: RecipeWrite) -> Result<RecipeDto, RecipeError> {
        payload.validate(WriteMode::Create)?;
        self.check_references(author_id, &payload, None).await?;

        let recipe = self
            .store
            .recipe_repo()
            .create(author_id, &payload)
            .await
            .map_err(map_write_error)?;

        info!(recipe_id = recipe.id, author_id, "Recipe created");
        self.annotate_one(recipe, Some(author_id)).await
    }

    async fn update(
        &self,
        id: i32,
        user_id: i32,
        payload: RecipeWrite,
    ) -> Result<RecipeDto, RecipeError> {
        let existing = self.find_owned(id, user_id).await?;
        payload.validate(WriteMode::Update)?;
        self.check_references(user_id, &payload, Some(id)).await?;

        let recipe = self
            .store
            .recipe_repo()
            .update(existing, &payload)
            .await
            .map_err(map_write_error)?;

        info!(recipe_id = id, "Recipe updated");
        self.annotate_one(recipe, Some(user_id)).await
    }

    async fn delete(&self, id: i32, user_id: i32) -> Result<(), RecipeError> {
        self.find_owned(id, user_id).await?;
        self.store.recipe_repo().delete(id).await?;
        info!(recipe_id = id, "Recipe deleted");
        Ok(())
    }

    async fn add_to_list(
        &self,
        list: RecipeList,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<ShortRecipeDto, RecipeError> {
        let recipe = self.find(recipe_id).await?;
        let memberships = self.store.membership_repo();

        if memberships.contains(list, user_id, recipe_id).await? {
            return Err(ValidationError::new("recipe", already_listed(list)).into());
        }

        memberships
            .add(list, user_id, recipe_id)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    ValidationError::new("recipe", already_listed(list)).into()
                } else {
                    RecipeError::from(err)
                }
            })?;

        Ok(recipe.into())
    }

    async fn remove_from_list(
        &self,
        list: RecipeList,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), RecipeError> {
        self.find(recipe_id).await?;

        let removed = self
            .store
            .membership_repo()
            .remove(list, user_id, recipe_id)
            .await?;
        if !removed {
            return Err(RecipeError::NotFound(not_listed(list).to_string()));
        }

        Ok(())
    }

    async fn shopping_list(&self, user_id: i32) -> Result<String, RecipeError> {
        let lines = self.store.recipe_repo().shopping_cart_lines(user_id).await?;
        let items = shopping_list::aggregate(lines);
        Ok(shopping_list::render(&items))
    }
}
