use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use tracing::{info, warn};

use guestbook_types::api::{AttachDomainRequest, DomainOwnerResponse, DomainQuery, SuccessResponse};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::hosting::HostingError;

const DOMAIN_TAKEN: &str = "This domain is already connected to another user.";

/// GET /api/domain?domain= — which guestbook a hostname serves.
pub async fn resolve_domain(
    State(state): State<AppState>,
    Query(query): Query<DomainQuery>,
) -> Result<Json<DomainOwnerResponse>, ApiError> {
    let raw = query
        .domain
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::invalid("Domain required"))?;
    let domain = normalize_domain(&raw).ok_or(ApiError::NotFound("Domain not connected"))?;

    let username = blocking(move || Ok(state.db.find_username_by_domain(&domain)?))
        .await?
        .ok_or(ApiError::NotFound("Domain not connected"))?;

    Ok(Json(DomainOwnerResponse { username }))
}

/// POST /api/domain — attach at the hosting provider, then record it. A
/// domain it replaces is released at the provider afterwards.
pub async fn attach_domain(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AttachDomainRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let identity = state.authenticate(&headers)?;

    if req.custom_domain.trim().is_empty() {
        return Err(ApiError::invalid("Domain is required"));
    }
    let domain = normalize_domain(&req.custom_domain).ok_or_else(|| ApiError::invalid("Invalid domain"))?;
    let hosting = state.hosting.clone().ok_or(HostingError::NotConfigured)?;

    let db = state.db.clone();
    let lookup = domain.clone();
    let holder = blocking(move || Ok(db.find_username_by_domain(&lookup)?)).await?;
    match holder {
        Some(owner) if owner == identity.username => return Ok(Json(SuccessResponse::ok())),
        Some(_) => return Err(ApiError::Conflict(DOMAIN_TAKEN)),
        None => {}
    }

    let db = state.db.clone();
    let username = identity.username.clone();
    let previous = blocking(move || Ok(db.get_custom_domain(&username)?)).await?;

    hosting.attach_domain(&domain).await?;

    let db = state.db.clone();
    let username = identity.username.clone();
    let stored_domain = domain.clone();
    let stored = blocking(move || Ok(db.set_custom_domain(&username, &stored_domain)?)).await?;
    if !stored {
        return Err(ApiError::Conflict(DOMAIN_TAKEN));
    }

    // Release the replaced domain; a provider failure is only logged.
    if let Some(previous) = previous.filter(|p| *p != domain) {
        if let Err(e) = hosting.detach_domain(&previous).await {
            warn!("Could not remove {} from hosting provider: {}", previous, e);
        }
    }

    info!("Domain {} connected to '{}'", domain, identity.username);
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/domain — provider failures are logged and do not block
/// clearing the stored domain.
pub async fn detach_domain(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let identity = state.authenticate(&headers)?;

    let db = state.db.clone();
    let username = identity.username.clone();
    let current = blocking(move || Ok(db.get_custom_domain(&username)?))
        .await?
        .ok_or(ApiError::NotFound("No domain connected to this account"))?;

    match &state.hosting {
        Some(hosting) => {
            if let Err(e) = hosting.detach_domain(&current).await {
                warn!("Could not remove {} from hosting provider: {}", current, e);
            }
        }
        None => warn!("Hosting provider not configured; clearing {} locally only", current),
    }

    let db = state.db.clone();
    let username = identity.username.clone();
    blocking(move || Ok(db.clear_custom_domain(&username)?)).await?;

    info!("Domain {} disconnected from '{}'", current, identity.username);
    Ok(Json(SuccessResponse::ok()))
}

/// Lowercased hostname without a trailing dot, or `None` when it is not a
/// syntactically valid multi-label DNS name.
pub fn normalize_domain(raw: &str) -> Option<String> {
    let domain = raw.trim().trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() || domain.len() > 253 {
        return None;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return None;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    labels_ok.then_some(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_trailing_dot() {
        assert_eq!(
            normalize_domain(" Guestbook.Alice.Example. ").as_deref(),
            Some("guestbook.alice.example")
        );
    }

    #[test]
    fn rejects_malformed_hostnames() {
        for bad in ["localhost", "-bad.example", "bad-.example", "a..example", "under_score.example", "https://x.example"] {
            assert_eq!(normalize_domain(bad), None, "{bad}");
        }
        assert_eq!(normalize_domain(&format!("{}.example", "a".repeat(64))), None);
    }
}
