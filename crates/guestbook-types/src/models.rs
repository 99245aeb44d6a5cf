use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Moderation state of an entry. `Approved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Approved,
    Pending,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown entry status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for EntryStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Self::Approved),
            "pending" => Ok(Self::Pending),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A guestbook message or a reply to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub owner_username: String,
    pub sender_name: String,
    pub sender_website: Option<String>,
    pub message: String,
    pub parent_id: Option<i64>,
    pub is_private: bool,
    pub is_owner: bool,
    pub status: EntryStatus,
    pub likes: u64,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Visible on the owner's public page.
    pub fn is_public(&self) -> bool {
        !self.is_private && self.status == EntryStatus::Approved
    }
}

/// Classified entry ready to be written. `likes` and `created_at` are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub owner_username: String,
    pub sender_name: String,
    pub sender_website: Option<String>,
    pub message: String,
    pub parent_id: Option<i64>,
    pub is_private: bool,
    pub is_owner: bool,
    pub status: EntryStatus,
}

/// A root entry with its direct replies, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    #[serde(flatten)]
    pub root: Entry,
    pub replies: Vec<Entry>,
}
