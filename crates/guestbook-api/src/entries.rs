use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use guestbook_types::api::{ListEntriesQuery, SubmitEntryRequest, SubmitEntryResponse, SuccessResponse};
use guestbook_types::thread::assemble_threads;

use crate::auth::{AppState, bearer_token};
use crate::blocking;
use crate::engine::Submission;
use crate::error::ApiError;

/// GET /api/entries — public listing with `?user=`, dashboard listing with
/// a bearer credential. `?threaded=true` groups replies under their roots.
pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<ListEntriesQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let credential = bearer_token(&headers).map(str::to_string);
    let owner = query.user;
    let entries = blocking(move || {
        Ok(state
            .engine
            .list_entries(owner.as_deref(), credential.as_deref())?)
    })
    .await?;

    if query.threaded {
        Ok(Json(assemble_threads(entries)).into_response())
    } else {
        Ok(Json(entries).into_response())
    }
}

/// POST /api/entries
pub async fn submit_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubmitEntryRequest>,
) -> Result<Response, ApiError> {
    let credential = bearer_token(&headers).map(str::to_string);
    let outcome =
        blocking(move || Ok(state.engine.submit_entry(&req, credential.as_deref())?)).await?;

    Ok(match outcome {
        Submission::Stored { status, .. } => (
            StatusCode::CREATED,
            Json(SubmitEntryResponse {
                success: true,
                status: Some(status),
            }),
        )
            .into_response(),
        Submission::Discarded => Json(SubmitEntryResponse {
            success: true,
            status: None,
        })
        .into_response(),
    })
}

/// POST /api/entries/{id}/like
pub async fn like_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    blocking(move || Ok(state.engine.like_entry(id)?)).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/entries/{id}/approve
pub async fn approve_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let credential = bearer_token(&headers).map(str::to_string);
    blocking(move || Ok(state.engine.approve_entry(id, credential.as_deref())?)).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/entries/{id}
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let credential = bearer_token(&headers).map(str::to_string);
    blocking(move || Ok(state.engine.delete_entry(id, credential.as_deref())?)).await?;
    Ok(Json(SuccessResponse::ok()))
}
