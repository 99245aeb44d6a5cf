use crate::Database;
use crate::models::{EntryRow, ProfileRow, UserRow};
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use guestbook_types::models::{Entry, NewEntry};
use rusqlite::Connection;

/// Outcome of [`Database::insert_entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(i64),
    /// `parent_id` does not name a root entry of the same owner.
    ParentNotFound,
}

impl Database {
    // -- Users --

    /// Returns `false` when the username is already taken.
    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let result = conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            );
            match result {
                Ok(_) => Ok(true),
                Err(e) if is_constraint_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    // -- Moderation --

    /// Whether third-party entries for `owner` wait for approval. Unknown
    /// owners do not moderate.
    pub fn get_require_approval(&self, owner: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let flag: Option<i64> = conn
                .query_row(
                    "SELECT require_approval FROM users WHERE username = ?1",
                    [owner],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(flag.is_some_and(|v| v != 0))
        })
    }

    // -- Profiles --

    pub fn get_profile(&self, username: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT custom_css, custom_html, custom_domain, require_approval
                 FROM users WHERE username = ?1",
                [username],
                |row| {
                    Ok(ProfileRow {
                        custom_css: row.get(0)?,
                        custom_html: row.get(1)?,
                        custom_domain: row.get(2)?,
                        require_approval: row.get::<_, i64>(3)? != 0,
                    })
                },
            )
            .optional()
        })
    }

    /// Update the given profile fields, leaving `None` fields untouched.
    /// Returns `false` when the user does not exist.
    pub fn update_profile(
        &self,
        username: &str,
        custom_css: Option<&str>,
        custom_html: Option<&str>,
        require_approval: Option<bool>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET
                    custom_css = COALESCE(?2, custom_css),
                    custom_html = COALESCE(?3, custom_html),
                    require_approval = COALESCE(?4, require_approval)
                 WHERE username = ?1",
                rusqlite::params![
                    username,
                    custom_css,
                    custom_html,
                    require_approval.map(i64::from)
                ],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Domains --

    pub fn find_username_by_domain(&self, domain: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT username FROM users WHERE custom_domain = ?1",
                [domain],
                |row| row.get(0),
            )
            .optional()
        })
    }

    pub fn get_custom_domain(&self, username: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let domain: Option<Option<String>> = conn
                .query_row(
                    "SELECT custom_domain FROM users WHERE username = ?1",
                    [username],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(domain.flatten())
        })
    }

    /// Returns `false` when another user already holds the domain.
    pub fn set_custom_domain(&self, username: &str, domain: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let result = conn.execute(
                "UPDATE users SET custom_domain = ?1 WHERE username = ?2",
                (domain, username),
            );
            match result {
                Ok(_) => Ok(true),
                Err(e) if is_constraint_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn clear_custom_domain(&self, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET custom_domain = NULL WHERE username = ?1",
                [username],
            )?;
            Ok(())
        })
    }

    // -- Entries --

    /// Insert a classified entry. The parent check and the insert share the
    /// connection lock, so a parent cannot vanish in between.
    pub fn insert_entry(&self, entry: &NewEntry) -> Result<InsertOutcome> {
        self.with_conn(|conn| {
            if let Some(parent_id) = entry.parent_id {
                let parent: Option<i64> = conn
                    .query_row(
                        "SELECT id FROM entries
                         WHERE id = ?1 AND owner_username = ?2 AND parent_id IS NULL",
                        rusqlite::params![parent_id, entry.owner_username],
                        |row| row.get(0),
                    )
                    .optional()?;
                if parent.is_none() {
                    return Ok(InsertOutcome::ParentNotFound);
                }
            }

            conn.execute(
                "INSERT INTO entries
                    (owner_username, sender_name, sender_website, message, parent_id,
                     is_private, is_owner, status, likes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
                rusqlite::params![
                    entry.owner_username,
                    entry.sender_name,
                    entry.sender_website,
                    entry.message,
                    entry.parent_id,
                    i64::from(entry.is_private),
                    i64::from(entry.is_owner),
                    entry.status.as_str(),
                    timestamp_now(),
                ],
            )?;

            Ok(InsertOutcome::Inserted(conn.last_insert_rowid()))
        })
    }

    pub fn get_entry(&self, id: i64) -> Result<Option<Entry>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM entries WHERE id = ?1", EntryRow::COLUMNS);
            let row = conn.query_row(&sql, [id], EntryRow::from_row).optional()?;
            row.map(EntryRow::into_entry).transpose()
        })
    }

    /// Approved, non-private entries of `owner`, newest first.
    pub fn list_public_entries(&self, owner: &str) -> Result<Vec<Entry>> {
        self.with_conn(|conn| {
            query_entries(
                conn,
                "owner_username = ?1 AND is_private = 0 AND status = 'approved'",
                owner,
            )
        })
    }

    /// Every entry of `owner` regardless of status or privacy, newest first.
    pub fn list_all_entries(&self, owner: &str) -> Result<Vec<Entry>> {
        self.with_conn(|conn| query_entries(conn, "owner_username = ?1", owner))
    }

    /// Returns `false` when no entry has this id.
    pub fn increment_likes(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("UPDATE entries SET likes = likes + 1 WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Move a pending entry owned by `owner` to approved. Returns whether a
    /// row changed.
    pub fn approve_entry(&self, id: i64, owner: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE entries SET status = 'approved'
                 WHERE id = ?1 AND owner_username = ?2 AND status = 'pending'",
                rusqlite::params![id, owner],
            )?;
            Ok(changed > 0)
        })
    }

    /// Delete the single entry `id` owned by `owner`. Replies stay stored.
    /// Returns `false` when nothing matched.
    pub fn delete_entry(&self, id: i64, owner: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM entries WHERE id = ?1 AND owner_username = ?2",
                rusqlite::params![id, owner],
            )?;
            Ok(changed > 0)
        })
    }
}

/// RFC 3339 with fixed microsecond precision and a `Z` suffix, so text order
/// matches time order.
fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_entries(conn: &Connection, filter: &str, owner: &str) -> Result<Vec<Entry>> {
    let sql = format!(
        "SELECT {} FROM entries WHERE {} ORDER BY created_at DESC, id DESC",
        EntryRow::COLUMNS,
        filter
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map([owner], EntryRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(EntryRow::into_entry).collect()
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
