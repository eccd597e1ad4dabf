//! Database repository layer
//!
//! Provides query and insert operations for all entity types.

use crate::analytics::GuildSnapshot;
use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Parse an RFC 3339 column value.
fn parse_ts(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Read a required timestamp column, `None` if it does not parse.
fn ts_column(row: &Row, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: String = row.get(column)?;
    let parsed = parse_ts(&raw);
    if parsed.is_none() {
        tracing::warn!(column, value = %raw, "Skipping row with unparseable timestamp");
    }
    Ok(parsed)
}

/// Read a nullable end-time column.
///
/// `Ok(Some(None))` is an open interval; `Ok(None)` means the value is
/// present but does not parse.
fn end_column(row: &Row, column: &str) -> rusqlite::Result<Option<Option<DateTime<Utc>>>> {
    let raw: Option<String> = row.get(column)?;
    match raw {
        None => Ok(Some(None)),
        Some(raw) => match parse_ts(&raw) {
            Some(ts) => Ok(Some(Some(ts))),
            None => {
                tracing::warn!(column, value = %raw, "Skipping row with unparseable timestamp");
                Ok(None)
            }
        },
    }
}

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn()?;
        super::schema::run_migrations(&conn)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::Poisoned)
    }

    // ============================================
    // Guild and user operations
    // ============================================

    /// Insert or update a guild
    pub fn upsert_guild(&self, guild: &Guild) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO guilds (id, name, icon_url, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                icon_url = excluded.icon_url
            "#,
            params![
                guild.id,
                guild.name,
                guild.icon_url,
                guild.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a guild by ID
    pub fn get_guild(&self, id: &str) -> Result<Option<Guild>> {
        let conn = self.conn()?;
        let guild = conn
            .query_row("SELECT * FROM guilds WHERE id = ?", [id], Self::row_to_guild)
            .optional()?;
        Ok(guild.flatten())
    }

    /// Guilds the user with `username` is a member of, by name
    pub fn list_guilds_for_username(&self, username: &str) -> Result<Vec<Guild>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT g.*
            FROM guilds g
            JOIN guild_members gm ON gm.guild_id = g.id
            JOIN users u ON u.id = gm.user_id
            WHERE u.username = ?
            ORDER BY g.name, g.id
            "#,
        )?;
        let guilds = stmt
            .query_map([username], Self::row_to_guild)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(guilds.into_iter().flatten().collect())
    }

    fn row_to_guild(row: &Row) -> rusqlite::Result<Option<Guild>> {
        let Some(created_at) = ts_column(row, "created_at")? else {
            return Ok(None);
        };
        Ok(Some(Guild {
            id: row.get("id")?,
            name: row.get("name")?,
            icon_url: row.get("icon_url")?,
            created_at,
        }))
    }

    /// Insert or update a user
    pub fn upsert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO users (id, username, avatar_url)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                avatar_url = excluded.avatar_url
            "#,
            params![user.id, user.username, user.avatar_url],
        )?;
        Ok(())
    }

    /// Get users by ID; unknown IDs are skipped
    pub fn get_users(&self, ids: &[String]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, username, avatar_url FROM users WHERE id IN ({}) ORDER BY id",
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let users = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                Ok(User {
                    id: row.get("id")?,
                    username: row.get("username")?,
                    avatar_url: row.get("avatar_url")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    // ============================================
    // Membership and channel operations
    // ============================================

    /// Insert or update a guild membership
    pub fn upsert_guild_member(&self, member: &GuildMember) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO guild_members (id, guild_id, user_id, nickname, joined_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                nickname = excluded.nickname
            "#,
            params![
                member.id,
                member.guild_id,
                member.user_id,
                member.nickname,
                member.joined_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List guild members, optionally restricted to one guild
    pub fn list_guild_members(&self, guild_id: Option<&str>) -> Result<Vec<GuildMember>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM guild_members
            WHERE (?1 IS NULL OR guild_id = ?1)
            ORDER BY id
            "#,
        )?;
        let members = stmt
            .query_map([guild_id], |row| {
                let Some(joined_at) = ts_column(row, "joined_at")? else {
                    return Ok(None);
                };
                Ok(Some(GuildMember {
                    id: row.get("id")?,
                    guild_id: row.get("guild_id")?,
                    user_id: row.get("user_id")?,
                    nickname: row.get("nickname")?,
                    joined_at,
                }))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(members.into_iter().flatten().collect())
    }

    /// Insert or update a voice channel
    pub fn upsert_voice_channel(&self, channel: &VoiceChannel) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO voice_channels (id, guild_id, name)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name
            "#,
            params![channel.id, channel.guild_id, channel.name],
        )?;
        Ok(())
    }

    /// List the voice channels of a guild
    pub fn list_voice_channels(&self, guild_id: &str) -> Result<Vec<VoiceChannel>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, guild_id, name FROM voice_channels WHERE guild_id = ? ORDER BY id")?;
        let channels = stmt
            .query_map([guild_id], |row| {
                Ok(VoiceChannel {
                    id: row.get("id")?,
                    guild_id: row.get("guild_id")?,
                    name: row.get("name")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(channels)
    }

    // ============================================
    // Session operations
    // ============================================

    /// Record a connection session; returns the assigned row ID
    pub fn insert_connection(&self, session: &ConnectionSession) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO connections (guild_member_id, voice_channel_id, start_time, end_time)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                session.guild_member_id,
                session.voice_channel_id,
                session.start_time.to_rfc3339(),
                session.end_time.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List connection sessions, optionally restricted to one guild's members
    pub fn list_connections(&self, guild_id: Option<&str>) -> Result<Vec<ConnectionSession>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.*
            FROM connections c
            JOIN guild_members gm ON gm.id = c.guild_member_id
            WHERE (?1 IS NULL OR gm.guild_id = ?1)
            ORDER BY c.id
            "#,
        )?;
        let sessions = stmt
            .query_map([guild_id], |row| {
                let (Some(start_time), Some(end_time)) =
                    (ts_column(row, "start_time")?, end_column(row, "end_time")?)
                else {
                    return Ok(None);
                };
                Ok(Some(ConnectionSession {
                    id: row.get("id")?,
                    guild_member_id: row.get("guild_member_id")?,
                    voice_channel_id: row.get("voice_channel_id")?,
                    start_time,
                    end_time,
                }))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions.into_iter().flatten().collect())
    }

    /// Record an activity session; returns the assigned row ID
    pub fn insert_activity(&self, session: &ActivitySession) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO activities (user_id, name, start_time, end_time)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                session.user_id,
                session.name,
                session.start_time.to_rfc3339(),
                session.end_time.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List activity sessions of users who are members of a guild
    pub fn list_guild_activities(&self, guild_id: &str) -> Result<Vec<ActivitySession>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.*
            FROM activities a
            WHERE a.user_id IN (
                SELECT user_id FROM guild_members WHERE guild_id = ?1
            )
            ORDER BY a.id
            "#,
        )?;
        let sessions = stmt
            .query_map([guild_id], |row| {
                let (Some(start_time), Some(end_time)) =
                    (ts_column(row, "start_time")?, end_column(row, "end_time")?)
                else {
                    return Ok(None);
                };
                Ok(Some(ActivitySession {
                    id: row.get("id")?,
                    user_id: row.get("user_id")?,
                    name: row.get("name")?,
                    start_time,
                    end_time,
                }))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions.into_iter().flatten().collect())
    }

    // ============================================
    // Snapshots
    // ============================================

    /// Fetch every row the overview of one guild needs
    pub fn load_snapshot(&self, guild_id: &str) -> Result<GuildSnapshot> {
        let guild = self
            .get_guild(guild_id)?
            .ok_or_else(|| Error::GuildNotFound(guild_id.to_string()))?;

        let members = self.list_guild_members(Some(guild_id))?;
        let user_ids: Vec<String> = members.iter().map(|m| m.user_id.clone()).collect();
        let users = self.get_users(&user_ids)?;
        let connections = self.list_connections(Some(guild_id))?;
        let activities = self.list_guild_activities(guild_id)?;
        let channels = self.list_voice_channels(guild_id)?;

        tracing::debug!(
            guild_id,
            members = members.len(),
            connections = connections.len(),
            activities = activities.len(),
            channels = channels.len(),
            "Loaded guild snapshot"
        );

        Ok(GuildSnapshot {
            guild,
            members,
            users,
            connections,
            activities,
            channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();

        for (id, name) in [("g1", "Alpha"), ("g2", "Beta")] {
            db.upsert_guild(&Guild {
                id: id.to_string(),
                name: name.to_string(),
                icon_url: None,
                created_at: at(0),
            })
            .unwrap();
        }
        for (id, name) in [("u1", "alice"), ("u2", "bob")] {
            db.upsert_user(&User {
                id: id.to_string(),
                username: name.to_string(),
                avatar_url: None,
            })
            .unwrap();
        }
        for (id, guild, user) in [("m1", "g1", "u1"), ("m2", "g1", "u2"), ("m3", "g2", "u1")] {
            db.upsert_guild_member(&GuildMember {
                id: id.to_string(),
                guild_id: guild.to_string(),
                user_id: user.to_string(),
                nickname: format!("{}-{}", user, guild),
                joined_at: at(0),
            })
            .unwrap();
        }
        for (id, guild) in [("c1", "g1"), ("c2", "g2")] {
            db.upsert_voice_channel(&VoiceChannel {
                id: id.to_string(),
                guild_id: guild.to_string(),
                name: id.to_uppercase(),
            })
            .unwrap();
        }
        db
    }

    fn connection(member: &str, channel: &str, end: Option<i64>) -> ConnectionSession {
        ConnectionSession {
            id: 0,
            guild_member_id: member.to_string(),
            voice_channel_id: channel.to_string(),
            start_time: at(0),
            end_time: end.map(at),
        }
    }

    #[test]
    fn test_guild_round_trip() {
        let db = seeded();
        let guild = db.get_guild("g1").unwrap().unwrap();
        assert_eq!(guild.name, "Alpha");
        assert_eq!(guild.created_at, at(0));
        assert!(db.get_guild("missing").unwrap().is_none());
    }

    #[test]
    fn test_connections_keep_open_end() {
        let db = seeded();
        db.insert_connection(&connection("m1", "c1", Some(1000))).unwrap();
        db.insert_connection(&connection("m2", "c1", None)).unwrap();
        db.insert_connection(&connection("m3", "c2", Some(5))).unwrap();

        let g1 = db.list_connections(Some("g1")).unwrap();
        assert_eq!(g1.len(), 2);
        assert_eq!(g1[0].end_time, Some(at(1000)));
        assert_eq!(g1[1].end_time, None);

        assert_eq!(db.list_connections(None).unwrap().len(), 3);
    }

    #[test]
    fn test_members_filtered_by_guild() {
        let db = seeded();
        assert_eq!(db.list_guild_members(Some("g1")).unwrap().len(), 2);
        assert_eq!(db.list_guild_members(Some("g2")).unwrap().len(), 1);
        assert_eq!(db.list_guild_members(None).unwrap().len(), 3);
    }

    #[test]
    fn test_activities_of_guild_members_only() {
        let db = seeded();
        db.upsert_user(&User {
            id: "u3".to_string(),
            username: "carol".to_string(),
            avatar_url: None,
        })
        .unwrap();
        for user in ["u1", "u2", "u3"] {
            db.insert_activity(&ActivitySession {
                id: 0,
                user_id: user.to_string(),
                name: "Chess".to_string(),
                start_time: at(0),
                end_time: Some(at(10)),
            })
            .unwrap();
        }

        assert_eq!(db.list_guild_activities("g1").unwrap().len(), 2);
        assert_eq!(db.list_guild_activities("g2").unwrap().len(), 1);
    }

    #[test]
    fn test_unparseable_timestamp_row_skipped() {
        let db = seeded();
        db.insert_connection(&connection("m1", "c1", Some(1000))).unwrap();
        db.connection_for_tests()
            .execute(
                "INSERT INTO connections (guild_member_id, voice_channel_id, start_time, end_time) VALUES ('m1', 'c1', 'yesterday', NULL)",
                [],
            )
            .unwrap();

        assert_eq!(db.list_connections(Some("g1")).unwrap().len(), 1);
    }

    #[test]
    fn test_guilds_for_username() {
        let db = seeded();
        let names: Vec<String> = db
            .list_guilds_for_username("alice")
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
        assert!(db.list_guilds_for_username("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_get_users() {
        let db = seeded();
        assert!(db.get_users(&[]).unwrap().is_empty());
        let users = db
            .get_users(&["u2".to_string(), "ghost".to_string()])
            .unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "bob");
    }

    #[test]
    fn test_load_snapshot() {
        let db = seeded();
        db.insert_connection(&connection("m1", "c1", Some(1000))).unwrap();

        let snapshot = db.load_snapshot("g1").unwrap();
        assert_eq!(snapshot.members.len(), 2);
        assert_eq!(snapshot.users.len(), 2);
        assert_eq!(snapshot.connections.len(), 1);
        assert_eq!(snapshot.channels.len(), 1);

        assert!(matches!(
            db.load_snapshot("nope"),
            Err(Error::GuildNotFound(id)) if id == "nope"
        ));
    }

    impl Database {
        fn connection_for_tests(&self) -> MutexGuard<'_, Connection> {
            self.conn().unwrap()
        }
    }
}
