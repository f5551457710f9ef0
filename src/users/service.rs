use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::password::verify_password,
    error::ApiError,
    profiles::{photos, repo::Profile},
    state::AppState,
};

use super::repo::User;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Look up a user by email and check the password. Unknown email and wrong
/// password are reported identically.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> Result<User, ApiError> {
    let Some(user) = User::find_by_email(&state.db, email).await? else {
        warn!(%email, "login for unknown email");
        return Err(ApiError::InvalidCredentials);
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }
    Ok(user)
}

/// Self-delete with password re-confirmation. The profile row goes via the
/// FK cascade; the stored photo file is unlinked here.
pub async fn delete_account(
    state: &AppState,
    requester: &User,
    target: Uuid,
    password: &str,
) -> Result<(), ApiError> {
    if requester.id != target {
        warn!(requester = %requester.id, %target, "cross-user delete refused");
        return Err(ApiError::Forbidden);
    }
    if !verify_password(password, &requester.password_hash)? {
        warn!(user_id = %requester.id, "delete with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let profile = Profile::find_by_user(&state.db, target).await?;
    if !User::delete(&state.db, target).await? {
        return Err(ApiError::NotFound("user"));
    }
    if let Some(profile) = profile {
        photos::discard(state, &profile.profile_photo).await;
    }
    info!(user_id = %target, "user deleted");
    Ok(())
}
