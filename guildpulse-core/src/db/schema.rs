//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS guilds (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        icon_url         TEXT,
        created_at       DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users (
        id               TEXT PRIMARY KEY,
        username         TEXT NOT NULL,
        avatar_url       TEXT
    );

    CREATE TABLE IF NOT EXISTS guild_members (
        id               TEXT PRIMARY KEY,
        guild_id         TEXT NOT NULL REFERENCES guilds(id),
        user_id          TEXT NOT NULL REFERENCES users(id),
        nickname         TEXT NOT NULL,
        joined_at        DATETIME NOT NULL,
        UNIQUE (guild_id, user_id)
    );

    CREATE TABLE IF NOT EXISTS voice_channels (
        id               TEXT PRIMARY KEY,
        guild_id         TEXT NOT NULL REFERENCES guilds(id),
        name             TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS connections (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        guild_member_id  TEXT NOT NULL REFERENCES guild_members(id),
        voice_channel_id TEXT NOT NULL REFERENCES voice_channels(id),
        start_time       DATETIME NOT NULL,
        end_time         DATETIME
    );

    CREATE TABLE IF NOT EXISTS activities (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id          TEXT NOT NULL REFERENCES users(id),
        name             TEXT NOT NULL,
        start_time       DATETIME NOT NULL,
        end_time         DATETIME
    );
    "#,
    // Version 2: Lookup indexes for per-guild reads
    r#"
    CREATE INDEX IF NOT EXISTS idx_guild_members_guild ON guild_members(guild_id);
    CREATE INDEX IF NOT EXISTS idx_guild_members_user ON guild_members(user_id);
    CREATE INDEX IF NOT EXISTS idx_voice_channels_guild ON voice_channels(guild_id);
    CREATE INDEX IF NOT EXISTS idx_connections_member ON connections(guild_member_id);
    CREATE INDEX IF NOT EXISTS idx_activities_user ON activities(user_id);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute_batch(&format!("PRAGMA user_version = {}", version))?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Returns the schema version recorded in the database
pub fn schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert_eq!(MIGRATIONS.len() as i32, SCHEMA_VERSION);
    }
}
