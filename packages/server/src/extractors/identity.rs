use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the caller's opaque identity token.
pub const IDENTITY_HEADER: &str = "x-user-id";

/// Caller identity extracted from the `X-User-Id` header.
///
/// The token is generated and persisted client-side; possession of it is the
/// whole authorization model. It is threaded through handlers explicitly so
/// tests can simulate multiple users, never held as ambient state.
pub struct ClientIdentity {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::IdentityMissing)?;

        let user_id = validate_user_id(raw)?;
        Ok(ClientIdentity { user_id })
    }
}

/// Validate an opaque user token: 1-128 visible ASCII characters.
pub fn validate_user_id(raw: &str) -> Result<String, AppError> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(AppError::Validation("User id must not be empty".into()));
    }
    if token.len() > 128 {
        return Err(AppError::Validation(
            "User id must be at most 128 characters".into(),
        ));
    }
    if !token.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(AppError::Validation(
            "User id must be visible ASCII".into(),
        ));
    }
    Ok(token.to_string())
}
