use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::ApiError,
    state::AppState,
    users::dto::ExistsResponse,
};

use super::{
    dto::{ProfileRequest, ProfileResponse},
    photos,
    repo::Profile,
    service,
};

#[instrument(skip_all)]
pub async fn create_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ProfileRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    let (fields, img, target) = payload.validate()?;
    let target = target.unwrap_or(user.id);
    if target != user.id {
        return Err(ApiError::Forbidden);
    }
    let profile = service::create_profile(&state, target, &fields, img.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(profile.into())))
}

#[instrument(skip_all)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = Profile::find_by_user(&state.db, user.id)
        .await?
        .ok_or(ApiError::NotFound("profile"))?;

    let mut response = ProfileResponse::from(profile);
    response.profile_photo = photos::as_data_uri(&state, &response.profile_photo).await;
    response.email = Some(user.email);
    Ok(Json(response))
}

#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let (fields, img, target) = payload.validate()?;
    let target = target.unwrap_or(user.id);
    let profile = service::update_profile(&state, user.id, target, &fields, img.as_deref()).await?;
    Ok(Json(profile.into()))
}

#[instrument(skip_all)]
pub async fn list_profiles(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<ProfileResponse>>, ApiError> {
    let profiles = Profile::list(&state.db).await?;
    Ok(Json(profiles.into_iter().map(ProfileResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn username_exists(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = Profile::username_exists(&state.db, &username).await?;
    Ok(Json(ExistsResponse { exists }))
}

#[instrument(skip(state))]
pub async fn phonenumber_exists(
    State(state): State<AppState>,
    Path(phonenumber): Path<String>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = Profile::phonenumber_exists(&state.db, &phonenumber).await?;
    Ok(Json(ExistsResponse { exists }))
}
