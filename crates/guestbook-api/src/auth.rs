use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::{HeaderMap, StatusCode, header}, response::IntoResponse};
use tracing::{info, warn};
use uuid::Uuid;

use guestbook_db::Database;
use guestbook_types::api::{AuthResponse, LoginRequest, SignupRequest};

use crate::blocking;
use crate::engine::EntryEngine;
use crate::error::{ApiError, EngineError};
use crate::hosting::HostingClient;
use crate::token::{Identity, TokenAuthority};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub tokens: TokenAuthority,
    pub engine: EntryEngine,
    /// `None` when no hosting provider credentials are configured.
    pub hosting: Option<HostingClient>,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, tokens: TokenAuthority, hosting: Option<HostingClient>) -> AppState {
        let engine = EntryEngine::new(db.clone(), tokens.clone());
        Arc::new(Self { db, tokens, engine, hosting })
    }

    /// Verify the bearer credential on a request that requires one.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
        let token = bearer_token(headers).ok_or(EngineError::Unauthorized)?;
        self.tokens.verify(token).map_err(|e| {
            warn!("Rejected credential: {}", e);
            ApiError::from(EngineError::Unauthorized)
        })
    }
}

/// Bearer token from the Authorization header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if !valid_username(&req.username) {
        return Err(ApiError::invalid(
            "Username must be 3-32 characters of letters, digits, '_' or '-'",
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::invalid("Password must be at least 8 characters"));
    }

    let db = state.db.clone();
    let username = req.username.clone();
    let user_id = Uuid::new_v4();
    let created = blocking(move || {
        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
            .to_string();

        Ok(db.create_user(&user_id.to_string(), &req.username, &password_hash)?)
    })
    .await?;

    if !created {
        return Err(ApiError::Conflict("Username already taken"));
    }

    let token = state.tokens.issue(user_id, &username)?;
    info!("Account '{}' created", username);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            username,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let user = blocking(move || {
        let user = db
            .get_user_by_username(&req.username)?
            .ok_or(EngineError::Unauthorized)?;

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("corrupt password hash for '{}': {}", user.username, e))?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| EngineError::Unauthorized)?;

        Ok(user)
    })
    .await?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;

    let token = state.tokens.issue(user_id, &user.username)?;

    Ok(Json(AuthResponse {
        user_id,
        username: user.username,
        token,
    }))
}

fn valid_username(username: &str) -> bool {
    (3..=32).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
