//! Profile HTTP handlers: own profile, public profiles, user directory.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use nursenotes_core::defaults::{USER_LIST_LIMIT, USER_SEARCH_LIMIT};
use nursenotes_core::{
    NoteRepository, NoteSummary, Profile, ProfileRepository, UpdateProfileRequest,
};

use super::current_user;

/// The authenticated user's own profile.
pub async fn my_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Profile>, ApiError> {
    let user = current_user(&state, &headers).await?;
    let profile = state.db.profiles.get(user.id).await?;
    Ok(Json(profile))
}

/// Update the authenticated user's profile.
pub async fn update_my_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let user = current_user(&state, &headers).await?;
    let profile = state.db.profiles.update(user.id, req).await?;
    Ok(Json(profile))
}

/// A public profile together with the user's uploads.
#[derive(Debug, Serialize)]
pub struct PublicProfileResponse {
    pub profile: Profile,
    pub notes: Vec<NoteSummary>,
}

/// View any user's public profile and their shared notes.
pub async fn public_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicProfileResponse>, ApiError> {
    let profile = state.db.profiles.get(id).await?;
    let notes = state
        .db
        .notes
        .list_by_owner(id)
        .await?
        .into_iter()
        .map(|n| NoteSummary {
            id: n.id,
            title: n.title,
            description: n.description,
            category: n.category,
            year: n.year,
            file_url: n.file_url,
            user_id: n.user_id,
            created_at: n.created_at,
            uploader_name: profile.full_name.clone(),
        })
        .collect();

    Ok(Json(PublicProfileResponse { profile, notes }))
}

/// Query parameters for the user directory search.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Search community members by name.
///
/// Case-insensitive substring match on full name; profiles without a name
/// never appear. An empty term returns no results.
pub async fn search_profiles(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let term = params.q.unwrap_or_default();
    let users = state
        .db
        .profiles
        .search_by_name(&term, USER_SEARCH_LIMIT)
        .await?;
    Ok(Json(users))
}

/// A short list of named community members.
pub async fn profile_directory(
    State(state): State<AppState>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let users = state.db.profiles.list_named(USER_LIST_LIMIT).await?;
    Ok(Json(users))
}
