//! Request body extraction that reports failures through [`ApiError`].

use axum::extract::{FromRequest, Request, rejection::JsonRejection};
use serde::de::DeserializeOwned;

use super::ApiError;

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Drop-in for `axum::Json` whose rejections render as the 400 error envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_error(&rejection)),
        }
    }
}

fn rejection_error(rejection: &JsonRejection) -> ApiError {
    let text = rejection.body_text();
    match rejection {
        JsonRejection::JsonDataError(_) => data_error(&text),
        _ => ApiError::validation(text),
    }
}

/// Splits `path: message` out of a data error so the offending top-level
/// field can be reported.
fn data_error(text: &str) -> ApiError {
    let detail = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(text);

    if let Some(rest) = detail.strip_prefix("missing field `")
        && let Some((field, _)) = rest.split_once('`')
    {
        return ApiError::field(field, "This field is required");
    }

    match detail.split_once(": ") {
        Some((path, message)) if is_field_path(path) => {
            let field = path.split(['.', '[']).next().unwrap_or(path);
            ApiError::field(field, message)
        }
        _ => ApiError::validation(detail),
    }
}

fn is_field_path(path: &str) -> bool {
    path.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}
