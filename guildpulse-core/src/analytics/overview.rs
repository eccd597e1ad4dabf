//! Guild overview - the numbers behind a server's dashboard page.
//!
//! Every figure in one overview is computed against the same `now`, so
//! a member's leaderboard position and their displayed level agree.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::activities::{aggregate_activities, ActivityTotal, CUSTOM_STATUS_ACTIVITY};
use super::channels::{rank_channels, ChannelPopularity};
use super::leveling::LevelInfo;
use super::members::{rank_members, MemberQuery, MemberTotal};
use crate::config::AnalyticsConfig;
use crate::types::{ActivitySession, ConnectionSession, Guild, GuildMember, User, VoiceChannel};

/// Raw rows for one guild, as fetched from the store.
#[derive(Debug, Clone)]
pub struct GuildSnapshot {
    /// The guild itself
    pub guild: Guild,
    /// Members of the guild
    pub members: Vec<GuildMember>,
    /// User accounts behind `members` (for avatars)
    pub users: Vec<User>,
    /// Connection sessions of the guild's members
    pub connections: Vec<ConnectionSession>,
    /// Activity sessions of users who are members of the guild
    pub activities: Vec<ActivitySession>,
    /// Voice channels of the guild
    pub channels: Vec<VoiceChannel>,
}

/// Sizes and filters for overview generation.
#[derive(Debug, Clone)]
pub struct OverviewSettings {
    /// Number of leaderboard rows
    pub leaderboard_size: usize,
    /// Number of top activities
    pub top_activities: usize,
    /// Number of top voice channels
    pub top_channels: usize,
    /// Activity name excluded from aggregation
    pub sentinel_activity: String,
}

impl Default for OverviewSettings {
    fn default() -> Self {
        Self {
            leaderboard_size: 5,
            top_activities: 5,
            top_channels: 5,
            sentinel_activity: CUSTOM_STATUS_ACTIVITY.to_string(),
        }
    }
}

impl From<&AnalyticsConfig> for OverviewSettings {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            leaderboard_size: config.leaderboard_size,
            top_activities: config.top_activities,
            top_channels: config.top_channels,
            sentinel_activity: config.sentinel_activity.clone(),
        }
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based rank
    pub rank: usize,
    /// The member and their total
    pub member: MemberTotal,
    /// Avatar reference from the member's user account
    pub avatar_url: Option<String>,
    /// Level derived from the member's total
    pub level: LevelInfo,
}

/// Engagement figures for one guild.
#[derive(Debug, Clone, Serialize)]
pub struct GuildOverview {
    /// The guild
    pub guild: Guild,
    /// The instant every duration was resolved against
    pub computed_at: DateTime<Utc>,
    /// Number of members
    pub member_count: usize,
    /// Connected time summed over all members (ms)
    pub total_connected_ms: i64,
    /// Number of voice connections by members
    pub connection_count: usize,
    /// Time spent on all included activities (ms)
    pub activity_time_ms: i64,
    /// Most recently joined member
    pub newest_member: Option<MemberTotal>,
    /// Highest-ranked members with their levels
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Activities with the most time
    pub top_activities: Vec<ActivityTotal>,
    /// Voice channels with the most connections
    pub top_channels: Vec<ChannelPopularity>,
    /// Sessions skipped because they end before they start
    pub malformed_sessions: usize,
}

impl GuildOverview {
    /// Pretty-printed JSON export of the overview.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Build the overview for a snapshot against a single `now`.
pub fn build_overview(
    snapshot: &GuildSnapshot,
    settings: &OverviewSettings,
    now: DateTime<Utc>,
) -> GuildOverview {
    let guild_id = snapshot.guild.id.as_str();

    let ranking = rank_members(
        &snapshot.members,
        &snapshot.connections,
        &MemberQuery::guild(guild_id),
        now,
    );
    let activities = aggregate_activities(&snapshot.activities, &settings.sentinel_activity, now);
    let top_channels = rank_channels(
        &snapshot.channels,
        &snapshot.connections,
        guild_id,
        settings.top_channels,
    );

    let member_ids: HashSet<&str> = ranking
        .entries
        .iter()
        .map(|m| m.member_id.as_str())
        .collect();
    let connection_count = snapshot
        .connections
        .iter()
        .filter(|c| member_ids.contains(c.guild_member_id.as_str()))
        .count();

    let total_connected_ms = ranking
        .entries
        .iter()
        .fold(0i64, |sum, m| sum.saturating_add(m.total_time_ms));

    // Latest join wins; ties go to the member ranked higher.
    let newest_member = ranking
        .entries
        .iter()
        .min_by(|a, b| b.joined_at.cmp(&a.joined_at))
        .cloned();

    let avatars: HashMap<&str, Option<&String>> = snapshot
        .users
        .iter()
        .map(|u| (u.id.as_str(), u.avatar_url.as_ref()))
        .collect();
    let leaderboard = ranking
        .entries
        .iter()
        .take(settings.leaderboard_size)
        .enumerate()
        .map(|(i, member)| LeaderboardEntry {
            rank: i + 1,
            avatar_url: avatars
                .get(member.user_id.as_str())
                .copied()
                .flatten()
                .cloned(),
            level: LevelInfo::for_time(member.total_time_ms),
            member: member.clone(),
        })
        .collect();

    let malformed_sessions = ranking.malformed + activities.malformed;
    if malformed_sessions > 0 {
        tracing::warn!(
            guild_id,
            malformed_sessions,
            "Guild has sessions that end before they start"
        );
    }

    tracing::info!(
        guild_id,
        members = ranking.total_members,
        connections = connection_count,
        activities = activities.len(),
        "Built guild overview"
    );

    GuildOverview {
        guild: snapshot.guild.clone(),
        computed_at: now,
        member_count: ranking.total_members,
        total_connected_ms,
        connection_count,
        activity_time_ms: activities.total_time_ms,
        newest_member,
        leaderboard,
        top_activities: activities.top(settings.top_activities).to_vec(),
        top_channels,
        malformed_sessions,
    }
}
