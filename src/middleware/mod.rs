use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;

use crate::models::user::normalize_username;

/// Caller identity from `Authorization: Basic base64(username:)`.
///
/// Only the username is checked against the user directory; whatever
/// follows the ':' is ignored.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let username = basic_username(auth_header).ok_or(StatusCode::UNAUTHORIZED)?;

        let username = state.accounts.login(&username).await.map_err(|e| match e {
            crate::store::UserError::Store(e) => {
                tracing::error!("auth lookup failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        })?;

        Ok(AuthUser { username })
    }
}

fn basic_username(header_value: &str) -> Option<String> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let username = credentials.split(':').next()?;
    normalize_username(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(credentials: &str) -> String {
        format!("Basic {}", general_purpose::STANDARD.encode(credentials))
    }

    #[test]
    fn extracts_username_and_ignores_password() {
        assert_eq!(basic_username(&basic("alice:whatever")), Some("alice".to_string()));
        assert_eq!(basic_username(&basic("alice:")), Some("alice".to_string()));
        assert_eq!(basic_username(&basic("alice")), Some("alice".to_string()));
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert_eq!(basic_username("Bearer abc"), None);
        assert_eq!(basic_username("Basic !!!"), None);
        assert_eq!(basic_username(&basic(":nobody")), None);
    }
}
