use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::EntryStatus;

// -- JWT Claims --

/// Bearer credential claims. `username` is the identity every ownership
/// check compares against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub iss: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Returned by both signup and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Entries --

#[derive(Debug, Default, Deserialize)]
pub struct ListEntriesQuery {
    /// Owner whose public guestbook is requested. Absent means the
    /// caller's own dashboard listing.
    pub user: Option<String>,
    #[serde(default)]
    pub threaded: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitEntryRequest {
    #[serde(default)]
    pub owner_username: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub message: String,
    pub sender_website: Option<String>,
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub is_private: bool,
    /// Hidden form field; humans leave it empty.
    pub bot_field: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitEntryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// -- Profiles --

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub username: Option<String>,
}

/// What a visitor's page needs to render a guestbook.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicProfileResponse {
    pub custom_css: String,
    pub custom_html: String,
}

/// The owner's own settings, including domain and moderation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub custom_css: String,
    pub custom_html: String,
    pub custom_domain: Option<String>,
    pub require_approval: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub custom_css: Option<String>,
    pub custom_html: Option<String>,
    pub require_approval: Option<bool>,
}

// -- Domains --

#[derive(Debug, Deserialize)]
pub struct DomainQuery {
    pub domain: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DomainOwnerResponse {
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachDomainRequest {
    #[serde(default)]
    pub custom_domain: String,
}
