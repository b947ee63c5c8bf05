use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::{AppError, TrackerError};

/// Header carrying the username established by the fronting authentication layer.
pub const USER_HEADER: &str = "x-user";

/// The username of the requesting user. Whether the account exists is checked
/// when the handler opens its [`crate::store::UserScope`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(TrackerError::Unauthenticated)?;

        Ok(Self(username.to_string()))
    }
}
