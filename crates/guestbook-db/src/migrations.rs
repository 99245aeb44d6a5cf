use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, entries)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                TEXT PRIMARY KEY,
                username          TEXT NOT NULL UNIQUE,
                password          TEXT NOT NULL,
                require_approval  INTEGER NOT NULL DEFAULT 0,
                custom_css        TEXT NOT NULL DEFAULT '',
                custom_html       TEXT NOT NULL DEFAULT '',
                custom_domain     TEXT UNIQUE,
                created_at        TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- owner_username is not a foreign key: visitors may sign a
            -- guestbook before its owner row exists. parent_id is not one
            -- either: deleting a root leaves its replies stored.
            CREATE TABLE entries (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_username  TEXT NOT NULL,
                sender_name     TEXT NOT NULL,
                sender_website  TEXT,
                message         TEXT NOT NULL,
                parent_id       INTEGER,
                is_private      INTEGER NOT NULL DEFAULT 0,
                is_owner        INTEGER NOT NULL DEFAULT 0,
                status          TEXT NOT NULL CHECK (status IN ('approved', 'pending')),
                likes           INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_entries_owner
                ON entries(owner_username, created_at);

            CREATE INDEX idx_entries_parent
                ON entries(parent_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
