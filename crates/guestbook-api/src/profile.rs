use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};

use guestbook_types::api::{
    ProfileQuery, ProfileResponse, PublicProfileResponse, SuccessResponse, UpdateProfileRequest,
};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;

/// GET /api/profile?username= — presentation fields only, returned verbatim.
pub async fn get_profile(
    State(state): State<AppState>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<PublicProfileResponse>, ApiError> {
    let username = query
        .username
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::invalid("Username required"))?;

    let row = blocking(move || Ok(state.db.get_profile(&username)?))
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(PublicProfileResponse {
        custom_css: row.custom_css,
        custom_html: row.custom_html,
    }))
}

/// GET /api/profile/me — the caller's full settings.
pub async fn get_own_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    let identity = state.authenticate(&headers)?;

    let row = blocking(move || Ok(state.db.get_profile(&identity.username)?))
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(ProfileResponse {
        custom_css: row.custom_css,
        custom_html: row.custom_html,
        custom_domain: row.custom_domain,
        require_approval: row.require_approval,
    }))
}

/// PUT /api/profile — fields left out of the body keep their value.
pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let identity = state.authenticate(&headers)?;

    let updated = blocking(move || {
        Ok(state.db.update_profile(
            &identity.username,
            req.custom_css.as_deref(),
            req.custom_html.as_deref(),
            req.require_approval,
        )?)
    })
    .await?;

    if !updated {
        return Err(ApiError::NotFound("User not found"));
    }
    Ok(Json(SuccessResponse::ok()))
}
