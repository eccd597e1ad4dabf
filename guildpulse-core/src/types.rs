//! Core domain types for guildpulse
//!
//! These types mirror the rows the tracking bot records. They are owned
//! by the external store; this crate only reads them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Guild** | A community server tracked by the bot |
//! | **User** | A platform account, independent of any guild |
//! | **GuildMember** | A user's membership in one guild |
//! | **VoiceChannel** | A voice channel belonging to a guild |
//! | **ConnectionSession** | A span a member spent connected to a voice channel |
//! | **ActivitySession** | A span a user spent in a named activity (game, app, status) |
//! | **Open interval** | A session with no end yet; it runs until "now" |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds in one hour, the unit the leveling curve is built on.
pub const HOUR_MS: i64 = 60 * 60 * 1000;

// ============================================
// Intervals
// ============================================

/// A time span with a required start and an optional end.
///
/// An absent end means the span is still open and is resolved against
/// whatever `now` the caller supplies.
pub trait Interval {
    /// When the span started
    fn start(&self) -> DateTime<Utc>;
    /// When the span ended, if it has
    fn end(&self) -> Option<DateTime<Utc>>;

    /// Whether the span is still ongoing.
    fn is_open(&self) -> bool {
        self.end().is_none()
    }
}

impl Interval for (DateTime<Utc>, Option<DateTime<Utc>>) {
    fn start(&self) -> DateTime<Utc> {
        self.0
    }

    fn end(&self) -> Option<DateTime<Utc>> {
        self.1
    }
}

impl<T: Interval + ?Sized> Interval for &T {
    fn start(&self) -> DateTime<Utc> {
        (**self).start()
    }

    fn end(&self) -> Option<DateTime<Utc>> {
        (**self).end()
    }
}

// ============================================
// Guilds and users
// ============================================

/// A community server tracked by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    /// Platform guild ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Icon image reference (passed through to presentation)
    pub icon_url: Option<String>,
    /// When the guild was created
    pub created_at: DateTime<Utc>,
}

/// A platform account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Platform user ID
    pub id: String,
    /// Account username
    pub username: String,
    /// Avatar image reference (passed through to presentation)
    pub avatar_url: Option<String>,
}

/// A user's membership in a specific guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildMember {
    /// Membership ID
    pub id: String,
    /// Guild this membership belongs to
    pub guild_id: String,
    /// The member's user account
    pub user_id: String,
    /// Display nickname within the guild
    pub nickname: String,
    /// When the user joined the guild
    pub joined_at: DateTime<Utc>,
}

/// A voice channel within a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceChannel {
    /// Platform channel ID
    pub id: String,
    /// Guild the channel belongs to
    pub guild_id: String,
    /// Channel name
    pub name: String,
}

// ============================================
// Sessions
// ============================================

/// A span a guild member spent connected to a voice channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSession {
    /// Row ID assigned by the store
    pub id: i64,
    /// Member who connected
    pub guild_member_id: String,
    /// Channel connected to
    pub voice_channel_id: String,
    /// When the connection started
    pub start_time: DateTime<Utc>,
    /// When the connection ended (None = still connected)
    pub end_time: Option<DateTime<Utc>>,
}

impl Interval for ConnectionSession {
    fn start(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn end(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }
}

/// A span a user spent in a named activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySession {
    /// Row ID assigned by the store
    pub id: i64,
    /// User doing the activity
    pub user_id: String,
    /// Activity name as reported by the platform
    pub name: String,
    /// When the activity started
    pub start_time: DateTime<Utc>,
    /// When the activity ended (None = still running)
    pub end_time: Option<DateTime<Utc>>,
}

impl Interval for ActivitySession {
    fn start(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn end(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }
}
