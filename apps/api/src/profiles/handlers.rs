use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::ProfileRow;
use crate::profiles::filter::ProfileFilter;
use crate::profiles::store;
use crate::profiles::validation::{
    validate_new_profile, validate_profile_update, CreateProfileRequest, UpdateProfileRequest,
};
use crate::state::AppState;

pub(crate) fn profile_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Profile {id} not found"))
}

/// GET /api/profiles
pub async fn handle_list_profiles(
    State(state): State<AppState>,
    Query(filter): Query<ProfileFilter>,
) -> Result<Json<Vec<ProfileRow>>, AppError> {
    let compiled = filter.compile()?;
    let profiles = store::list_profiles(&state.db).await?;
    Ok(Json(compiled.apply(profiles)))
}

/// POST /api/profiles/filter
pub async fn handle_filter_profiles(
    State(state): State<AppState>,
    Json(filter): Json<ProfileFilter>,
) -> Result<Json<Vec<ProfileRow>>, AppError> {
    let compiled = filter.compile()?;
    let profiles = store::list_profiles(&state.db).await?;
    Ok(Json(compiled.apply(profiles)))
}

/// GET /api/profiles/:id/filter
pub async fn handle_filter_others(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(filter): Query<ProfileFilter>,
) -> Result<Json<Vec<ProfileRow>>, AppError> {
    let compiled = filter.compile()?;
    if !store::profile_exists(&state.db, id).await? {
        return Err(profile_not_found(id));
    }
    let others = store::list_profiles_except(&state.db, id).await?;
    Ok(Json(compiled.apply(others)))
}

/// GET /api/profiles/:id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileRow>, AppError> {
    let profile = store::get_profile(&state.db, id)
        .await?
        .ok_or_else(|| profile_not_found(id))?;
    Ok(Json(profile))
}

/// POST /api/profiles
pub async fn handle_create_profile(
    State(state): State<AppState>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ProfileRow>), AppError> {
    let new = validate_new_profile(req)?;
    let profile = store::create_profile(&state.db, &new).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// PUT /api/profiles/:id
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileRow>, AppError> {
    let changes = validate_profile_update(req)?;
    let profile = store::update_profile(&state.db, id, &changes)
        .await?
        .ok_or_else(|| profile_not_found(id))?;
    Ok(Json(profile))
}

/// DELETE /api/profiles/:id
pub async fn handle_delete_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !store::delete_profile(&state.db, id).await? {
        return Err(profile_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
