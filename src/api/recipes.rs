//! Recipe endpoints, including favorites, the shopping cart and the
//! shopping list download.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::auth::{AuthUser, MaybeUser};
use super::filters::QueryParams;
use super::types::{Page, RecipeDto, ShortRecipeDto};
use super::extract::JsonBody;
use super::{ApiError, ApiResponse, AppState};
use crate::db::RecipeList;
use crate::models::recipe::RecipeWrite;
use crate::services::RecipeError;

impl From<RecipeError> for ApiError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::NotFound(msg) => Self::NotFound(msg),
            RecipeError::Forbidden => Self::Forbidden(RecipeError::Forbidden.to_string()),
            RecipeError::Validation(e) => e.into(),
            RecipeError::Database(msg) => Self::DatabaseError(msg),
            RecipeError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// `GET /api/recipes`
///
/// Query: `page`, `limit`, `tags` (repeatable slug), `author`,
/// `is_favorited`, `is_in_shopping_cart`.
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    RawQuery(query): RawQuery,
) -> Result<Json<ApiResponse<Page<RecipeDto>>>, ApiError> {
    let params = QueryParams::parse(query.as_deref());
    let filter = params.recipe_filter()?;
    let page = params.page(&state.config().pagination)?;

    let recipes = state
        .recipe_service()
        .list(&filter, viewer.id(), page)
        .await?;
    Ok(Json(ApiResponse::success(recipes)))
}

/// `GET /api/recipes/{id}`
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let recipe = state.recipe_service().get(id, viewer.id()).await?;
    Ok(Json(ApiResponse::success(recipe)))
}

/// `POST /api/recipes`
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<RecipeWrite>,
) -> Result<(StatusCode, Json<ApiResponse<RecipeDto>>), ApiError> {
    let recipe = state.recipe_service().create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(recipe))))
}

/// `PATCH /api/recipes/{id}`; author only.
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<RecipeWrite>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let recipe = state.recipe_service().update(id, user.id, payload).await?;
    Ok(Json(ApiResponse::success(recipe)))
}

/// `DELETE /api/recipes/{id}`; author only.
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.recipe_service().delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to_list(
    state: &AppState,
    list: RecipeList,
    user_id: i32,
    recipe_id: i32,
) -> Result<(StatusCode, Json<ApiResponse<ShortRecipeDto>>), ApiError> {
    let recipe = state
        .recipe_service()
        .add_to_list(list, user_id, recipe_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(recipe))))
}

async fn remove_from_list(
    state: &AppState,
    list: RecipeList,
    user_id: i32,
    recipe_id: i32,
) -> Result<StatusCode, ApiError> {
    state
        .recipe_service()
        .remove_from_list(list, user_id, recipe_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/recipes/{id}/favorite`
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ApiResponse<ShortRecipeDto>>), ApiError> {
    add_to_list(&state, RecipeList::Favorites, user.id, id).await
}

/// `DELETE /api/recipes/{id}/favorite`
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    remove_from_list(&state, RecipeList::Favorites, user.id, id).await
}

/// `POST /api/recipes/{id}/shopping_cart`
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ApiResponse<ShortRecipeDto>>), ApiError> {
    add_to_list(&state, RecipeList::ShoppingCart, user.id, id).await
}

/// `DELETE /api/recipes/{id}/shopping_cart`
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    remove_from_list(&state, RecipeList::ShoppingCart, user.id, id).await
}

/// `GET /api/recipes/download_shopping_cart`
///
/// Plain-text attachment, one `name amount unit` line per ingredient.
pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Response, ApiError> {
    let body = state.recipe_service().shopping_list(user.id).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.config().shopping_list.filename
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
