use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{error::ApiError, state::AppState, users::repo::User};

use super::jwt::JwtKeys;

/// Header carrying the opaque session token.
pub const TOKEN_HEADER: &str = "x-access-token";

/// Extracts the token from `x-access-token`, verifies it and resolves the
/// subject to a live user row.
pub struct AuthUser(pub User);

/// Like [`AuthUser`] but additionally requires the admin flag.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthenticated("token is missing"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthenticated("token is invalid")
        })?;

        // A token naming a deleted user is indistinguishable from a bad one.
        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token subject no longer exists");
                ApiError::Unauthenticated("token is invalid")
            })?;

        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.admin {
            warn!(user_id = %user.id, "admin endpoint refused");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/user");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).expect("request builds").into_parts();
        parts
    }

    #[tokio::test]
    async fn missing_header_is_reported_as_missing_token() {
        let state = AppState::fake();
        let mut parts = parts_with_headers(&[]);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .expect("extraction should fail");
        assert!(matches!(err, ApiError::Unauthenticated("token is missing")));
    }

    #[tokio::test]
    async fn undecodable_token_is_reported_as_invalid() {
        let state = AppState::fake();
        let mut parts = parts_with_headers(&[(TOKEN_HEADER, "garbage")]);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .expect("extraction should fail");
        assert!(matches!(err, ApiError::Unauthenticated("token is invalid")));
    }
}
