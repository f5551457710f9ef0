use axum::{
    extract::{FromRef, Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::{AdminUser, AuthUser},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    error::ApiError,
    state::AppState,
};

use super::{
    dto::{
        AuthResponse, DeleteUserRequest, ExistsResponse, LoginRequest, MessageResponse,
        PublicUser, RegisterRequest, TokenResponse, UpdateEmailRequest, UpdatePasswordRequest,
    },
    repo::User,
    service::{self, is_valid_email},
};

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::InvalidInput("invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::InvalidInput("password too short".into()));
    }

    let hash = hash_password(&payload.password)?;
    // No pre-check: the unique constraint is the authority on duplicate
    // emails, so a concurrent registration surfaces here as Conflict.
    let user = User::create(&state.db, &email, &hash).await?;

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// GET login carrying credentials in an HTTP Basic header.
#[instrument(skip(state, headers))]
pub async fn login_basic(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let (email, password) = decode_basic(&headers)?;
    let email = email.trim().to_lowercase();
    let user = service::authenticate(&state, &email, &password).await?;
    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state, payload))]
pub async fn login_json(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    let user = service::authenticate(&state, &email, &payload.password).await?;
    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse { token }))
}

/// Parse an HTTP Basic `Authorization` header into email and password. Any
/// defect in the header reads as a credential failure.
fn decode_basic(headers: &HeaderMap) -> Result<(String, String), ApiError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::InvalidCredentials)?;
    let encoded = raw
        .strip_prefix("Basic ")
        .ok_or(ApiError::InvalidCredentials)?;
    let decoded = BASE64
        .decode(encoded)
        .map_err(|_| ApiError::InvalidCredentials)?;
    let decoded = String::from_utf8(decoded).map_err(|_| ApiError::InvalidCredentials)?;
    let (email, password) = decoded.split_once(':').ok_or(ApiError::InvalidCredentials)?;
    Ok((email.to_string(), password.to_string()))
}

#[instrument(skip_all)]
pub async fn get_user(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip_all)]
pub async fn update_email(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<UpdateEmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ApiError::InvalidInput("invalid email".into()));
    }
    User::update_email(&state.db, user.id, &email).await?;
    info!(user_id = %user.id, "email updated");
    Ok(Json(MessageResponse {
        message: "user email has been updated",
    }))
}

#[instrument(skip_all)]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(ApiError::InvalidCredentials);
    }
    if payload.new_password.len() < 8 {
        return Err(ApiError::InvalidInput("password too short".into()));
    }
    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, user.id, &hash).await?;
    info!(user_id = %user.id, "password updated");
    Ok(Json(MessageResponse {
        message: "user password has been updated",
    }))
}

#[instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<DeleteUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let target = payload.user_id.unwrap_or(user.id);
    service::delete_account(&state, &user, target, &payload.password).await?;
    Ok(Json(MessageResponse {
        message: "user deleted",
    }))
}

#[instrument(skip(state))]
pub async fn email_exists(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = User::email_exists(&state.db, &email).await?;
    Ok(Json(ExistsResponse { exists }))
}

#[cfg(test)]
mod basic_auth_tests {
    use super::*;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn decodes_well_formed_header() {
        let encoded = BASE64.encode("u1@example.com:pw1");
        let headers = headers_with_auth(&format!("Basic {encoded}"));
        let (email, password) = decode_basic(&headers).unwrap();
        assert_eq!(email, "u1@example.com");
        assert_eq!(password, "pw1");
    }

    #[test]
    fn rejects_missing_header() {
        let err = decode_basic(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[test]
    fn rejects_non_basic_scheme() {
        let headers = headers_with_auth("Bearer sometoken");
        assert!(decode_basic(&headers).is_err());
    }

    #[test]
    fn rejects_payload_without_separator() {
        let encoded = BASE64.encode("no-colon-here");
        let headers = headers_with_auth(&format!("Basic {encoded}"));
        assert!(decode_basic(&headers).is_err());
    }

    #[test]
    fn rejects_undecodable_payload() {
        let headers = headers_with_auth("Basic %%%");
        assert!(decode_basic(&headers).is_err());
    }
}
