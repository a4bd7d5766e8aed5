//! Authentication: credential store, JWT claims, bearer resolution.

mod store;

pub use store::{AuthClaims, AuthError, AuthSession, AuthStore};

use axum::http::{header, HeaderMap};
use td_core::user::User;

use crate::state::AppState;

/// Extract the bearer token from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AuthError::Unauthorized("Missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AuthError::Unauthorized("Invalid Authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AuthError::Unauthorized("Authorization header must carry a bearer token".to_string())
        })
}

/// Resolve the calling user from the request headers.
pub async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<User, AuthError> {
    let token = bearer_token(headers)?;
    state.auth_store().authorize_bearer(token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::Unauthorized(_))
        ));
    }

    #[test]
    fn bearer_token_requires_bearer_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwdw=="),
        );
        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn bearer_token_extracts_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }
}
