use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::types::{LoginRequest, TokenDto};
use super::extract::JsonBody;
use super::{ApiError, ApiResponse, AppState};
use crate::entities::users;
use crate::services::AuthError;

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                Self::validation(AuthError::InvalidCredentials.to_string())
            }
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// The user a request was authenticated as, stored in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub users::Model);

/// Resolves `Authorization: Token <key>` (or `Bearer <key>`) to a user.
///
/// Requests without credentials pass through anonymously; a presented but
/// unknown token is rejected with 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_token(&headers) {
        let user = state
            .auth_service()
            .authenticate(&token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

        tracing::Span::current().record("user_id", user.id);
        request.extensions_mut().insert(CurrentUser(user));
    }

    Ok(next.run(request).await)
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Extractors
// ============================================================================

/// Requires an authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser(pub users::Model);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .map(|current| Self(current.0.clone()))
            .ok_or_else(ApiError::unauthenticated)
    }
}

/// The caller if authenticated, `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<users::Model>);

impl MaybeUser {
    #[must_use]
    pub fn id(&self) -> Option<i32> {
        self.0.as_ref().map(|user| user.id)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<CurrentUser>()
                .map(|current| current.0.clone()),
        ))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/token/login
/// Exchange email and password for the user's token
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<ApiResponse<TokenDto>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::field("email", "Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::field("password", "Password is required"));
    }

    let auth_token = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(TokenDto { auth_token })))
}

/// POST /auth/token/logout
/// Revoke the caller's token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.auth_service().logout(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_token_schemes() {
        assert_eq!(extract_token(&headers("Token abc123")).as_deref(), Some("abc123"));
        assert_eq!(extract_token(&headers("Bearer abc123")).as_deref(), Some("abc123"));
        assert_eq!(extract_token(&headers("token  abc123 ")).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extract_token_rejects_other_schemes() {
        assert_eq!(extract_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_token(&headers("Token")), None);
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
