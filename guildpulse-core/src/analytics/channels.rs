//! Voice channel popularity.
//!
//! Orders a guild's voice channels by how many connection sessions they
//! have seen. Session duration and open/closed state do not matter.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{ConnectionSession, VoiceChannel};

/// A voice channel with its connection count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelPopularity {
    /// Channel ID
    pub channel_id: String,
    /// Channel name
    pub name: String,
    /// Number of connection sessions recorded in the channel
    pub connection_count: usize,
}

/// The `top_n` channels of `guild_id` by connection count, descending.
///
/// Channels without sessions count as zero and remain eligible. Equal
/// counts are ordered by ascending channel ID.
pub fn rank_channels(
    channels: &[VoiceChannel],
    sessions: &[ConnectionSession],
    guild_id: &str,
    top_n: usize,
) -> Vec<ChannelPopularity> {
    let mut counts: HashMap<&str, usize> = channels
        .iter()
        .filter(|c| c.guild_id == guild_id)
        .map(|c| (c.id.as_str(), 0))
        .collect();
    for session in sessions {
        if let Some(count) = counts.get_mut(session.voice_channel_id.as_str()) {
            *count += 1;
        }
    }

    let mut ranked: Vec<ChannelPopularity> = channels
        .iter()
        .filter(|c| c.guild_id == guild_id)
        .map(|c| ChannelPopularity {
            channel_id: c.id.clone(),
            name: c.name.clone(),
            connection_count: counts.get(c.id.as_str()).copied().unwrap_or(0),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.connection_count
            .cmp(&a.connection_count)
            .then_with(|| a.channel_id.cmp(&b.channel_id))
    });
    ranked.truncate(top_n);

    tracing::debug!(guild_id, returned = ranked.len(), "Ranked voice channels");

    ranked
}
