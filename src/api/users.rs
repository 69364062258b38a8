//! User accounts and subscriptions.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::{AuthUser, MaybeUser};
use super::filters::QueryParams;
use super::types::{Page, RegisteredUserDto, SubscriptionDto, UserDto};
use super::extract::JsonBody;
use super::{ApiError, ApiResponse, AppState};
use crate::models::user::{NewUser, SetPassword};
use crate::services::UserError;

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(msg) => Self::NotFound(msg),
            UserError::Validation(e) => e.into(),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// `GET /api/users`
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    RawQuery(query): RawQuery,
) -> Result<Json<ApiResponse<Page<UserDto>>>, ApiError> {
    let page = QueryParams::parse(query.as_deref()).page(&state.config().pagination)?;
    let users = state.user_service().list(viewer.id(), page).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// `POST /api/users`
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<NewUser>,
) -> Result<(StatusCode, Json<ApiResponse<RegisteredUserDto>>), ApiError> {
    let user = state.user_service().register(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// `GET /api/users/{id}`
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.user_service().get(id, viewer.id()).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `GET /api/users/me`
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.user_service().get(user.id, Some(user.id)).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `POST /api/users/set_password`
pub async fn set_password(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<SetPassword>,
) -> Result<StatusCode, ApiError> {
    state.user_service().set_password(user.id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/users/subscriptions`
///
/// Query: `page`, `limit`, `recipes_limit`.
pub async fn subscriptions(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    RawQuery(query): RawQuery,
) -> Result<Json<ApiResponse<Page<SubscriptionDto>>>, ApiError> {
    let params = QueryParams::parse(query.as_deref());
    let page = params.page(&state.config().pagination)?;
    let recipes_limit = params.recipes_limit()?;

    let authors = state
        .user_service()
        .subscriptions(user.id, page, recipes_limit)
        .await?;
    Ok(Json(ApiResponse::success(authors)))
}

/// `POST /api/users/{id}/subscribe`
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(author_id): Path<i32>,
    RawQuery(query): RawQuery,
) -> Result<(StatusCode, Json<ApiResponse<SubscriptionDto>>), ApiError> {
    let recipes_limit = QueryParams::parse(query.as_deref()).recipes_limit()?;

    let subscription = state
        .user_service()
        .subscribe(user.id, author_id, recipes_limit)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(subscription))))
}

/// `DELETE /api/users/{id}/subscribe`
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(author_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.user_service().unsubscribe(user.id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
