//! Analytics module for guildpulse
//!
//! Turns raw session intervals into ordered, bounded leaderboards:
//! - Interval accumulation (open spans resolve against a supplied `now`)
//! - Member ranking by connected time
//! - Activity breakdown by name
//! - Voice channel popularity
//! - Leveling derived from member totals
//! - Guild overview combining all of the above
//!
//! Everything here is synchronous and side-effect free apart from
//! `tracing` events. Callers fetch rows, capture `now` once per request
//! and pass both in.

pub mod activities;
pub mod channels;
pub mod interval;
pub mod leveling;
pub mod members;
pub mod overview;

pub use activities::{
    aggregate_activities, ActivityBreakdown, ActivityTotal, CUSTOM_STATUS_ACTIVITY,
};
pub use channels::{rank_channels, ChannelPopularity};
pub use interval::{accumulate, Accumulated};
pub use leveling::{
    level_to_color, level_to_time, progress_percent, time_to_level, LevelInfo, LEVEL_COLORS,
};
pub use members::{rank_members, MemberQuery, MemberRanking, MemberTotal, Page};
pub use overview::{
    build_overview, GuildOverview, GuildSnapshot, LeaderboardEntry,
    OverviewSettings,
};
