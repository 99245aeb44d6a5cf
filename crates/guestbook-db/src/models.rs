//! Database row types. These map directly to SQLite rows; flags are stored
//! as 0/1 integers and converted here so nothing above the store sees them.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use guestbook_types::models::{Entry, EntryStatus};

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct ProfileRow {
    pub custom_css: String,
    pub custom_html: String,
    pub custom_domain: Option<String>,
    pub require_approval: bool,
}

pub struct EntryRow {
    pub id: i64,
    pub owner_username: String,
    pub sender_name: String,
    pub sender_website: Option<String>,
    pub message: String,
    pub parent_id: Option<i64>,
    pub is_private: i64,
    pub is_owner: i64,
    pub status: String,
    pub likes: i64,
    pub created_at: String,
}

impl EntryRow {
    pub const COLUMNS: &'static str = "id, owner_username, sender_name, sender_website, message, \
         parent_id, is_private, is_owner, status, likes, created_at";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_username: row.get(1)?,
            sender_name: row.get(2)?,
            sender_website: row.get(3)?,
            message: row.get(4)?,
            parent_id: row.get(5)?,
            is_private: row.get(6)?,
            is_owner: row.get(7)?,
            status: row.get(8)?,
            likes: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    pub fn into_entry(self) -> Result<Entry> {
        let status: EntryStatus = self
            .status
            .parse()
            .with_context(|| format!("entry {}", self.id))?;
        let likes = u64::try_from(self.likes)
            .with_context(|| format!("negative like count on entry {}", self.id))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("corrupt created_at '{}' on entry {}", self.created_at, self.id))?
            .with_timezone(&Utc);

        Ok(Entry {
            id: self.id,
            owner_username: self.owner_username,
            sender_name: self.sender_name,
            sender_website: self.sender_website,
            message: self.message,
            parent_id: self.parent_id,
            is_private: self.is_private != 0,
            is_owner: self.is_owner != 0,
            status,
            likes,
            created_at,
        })
    }
}
