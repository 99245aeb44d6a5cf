use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::auth::{self, AppState};
use crate::{domain, entries, profile};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/signup", post(auth::signup))
        .route("/api/login", post(auth::login))
        .route("/api/entries", get(entries::list_entries).post(entries::submit_entry))
        .route("/api/entries/{id}", delete(entries::delete_entry))
        .route("/api/entries/{id}/like", post(entries::like_entry))
        .route("/api/entries/{id}/approve", post(entries::approve_entry))
        .route("/api/profile", get(profile::get_profile).put(profile::update_profile))
        .route("/api/profile/me", get(profile::get_own_profile))
        .route(
            "/api/domain",
            get(domain::resolve_domain)
                .post(domain::attach_domain)
                .delete(domain::detach_domain),
        )
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
