use tracing::{info, warn};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState, users::repo::User};

use super::{
    dto::ProfileFields,
    photos::{self, PLACEHOLDER},
    repo::Profile,
};

/// Create the profile for `user_id`. The photo is persisted before the row;
/// when the insert fails the freshly-written file is removed again.
pub async fn create_profile(
    state: &AppState,
    user_id: Uuid,
    fields: &ProfileFields,
    img: Option<&str>,
) -> Result<Profile, ApiError> {
    // The FK would also catch a missing user, but the contract wants the
    // check ahead of any file write.
    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::NotFound("user"));
    }

    let photo = match img {
        Some(raw) => photos::store(state, user_id, raw).await?,
        None => PLACEHOLDER.to_string(),
    };

    match Profile::create(&state.db, user_id, fields, &photo).await {
        Ok(profile) => {
            info!(user_id = %user_id, profile_id = profile.id, "profile created");
            Ok(profile)
        }
        Err(e) => {
            photos::discard(state, &photo).await;
            Err(e.into())
        }
    }
}

/// Overwrite the full field set of `target`'s profile. Only the owner may
/// update; a replaced photo with a different extension unlinks the old file.
pub async fn update_profile(
    state: &AppState,
    requester: Uuid,
    target: Uuid,
    fields: &ProfileFields,
    img: Option<&str>,
) -> Result<Profile, ApiError> {
    if requester != target {
        warn!(%requester, %target, "cross-user profile update refused");
        return Err(ApiError::Forbidden);
    }

    let existing = Profile::find_by_user(&state.db, target)
        .await?
        .ok_or(ApiError::NotFound("profile"))?;

    let photo = match img {
        Some(raw) => photos::store(state, target, raw).await?,
        None => existing.profile_photo.clone(),
    };

    match Profile::update(&state.db, target, fields, &photo).await {
        Ok(profile) => {
            // Same extension means the write already replaced the file in
            // place; a different one leaves the old file behind.
            if existing.profile_photo != photo {
                photos::discard(state, &existing.profile_photo).await;
            }
            info!(user_id = %target, "profile updated");
            Ok(profile)
        }
        Err(e) => {
            if photo != existing.profile_photo {
                photos::discard(state, &photo).await;
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ProfileFields {
        ProfileFields {
            username: "alice".into(),
            firstname: "Alice".into(),
            lastname: "Doe".into(),
            dob: "1990-04-01".into(),
            gender: "female".into(),
            phonenumber: "0700000000".into(),
        }
    }

    #[tokio::test]
    async fn update_refuses_cross_user_target_before_touching_the_store() {
        let state = AppState::fake();
        let err = update_profile(&state, Uuid::new_v4(), Uuid::new_v4(), &fields(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }
}
