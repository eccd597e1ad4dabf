//! Member time ranking.
//!
//! Totals connected time per guild member and orders members by that
//! total, descending. Members with no sessions rank with a zero total.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::interval::accumulate;
use crate::types::{ConnectionSession, GuildMember};

/// Offset/limit window over a ranked sequence.
///
/// Built from raw caller input with [`Page::new`], which normalizes
/// out-of-range values instead of rejecting them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    /// Items to skip from the front
    pub skip: usize,
    /// Maximum items to return (None = unbounded)
    pub take: Option<usize>,
}

impl Page {
    /// Normalize raw pagination input.
    ///
    /// A negative `skip` becomes 0. A `take` of zero or less yields an
    /// empty page. `None` leaves the page unbounded.
    pub fn new(skip: i64, take: Option<i64>) -> Self {
        Self {
            skip: usize::try_from(skip).unwrap_or(0),
            take: take.map(|t| usize::try_from(t).unwrap_or(0)),
        }
    }

    /// Every item, no offset.
    pub fn all() -> Self {
        Self::default()
    }

    /// Apply this window to an already-ordered vector.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.skip);
        match self.take {
            Some(take) => iter.take(take).collect(),
            None => iter.collect(),
        }
    }
}

/// Filter and window for a member ranking query.
#[derive(Debug, Clone, Default)]
pub struct MemberQuery {
    /// Restrict to members of this guild (None = every guild)
    pub guild_id: Option<String>,
    /// Pagination window
    pub page: Page,
}

impl MemberQuery {
    /// All members of one guild.
    pub fn guild(guild_id: impl Into<String>) -> Self {
        Self {
            guild_id: Some(guild_id.into()),
            page: Page::all(),
        }
    }

    /// Set the pagination window.
    pub fn with_page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }
}

/// A member with their accumulated connected time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberTotal {
    /// Membership ID
    pub member_id: String,
    /// Display nickname
    pub nickname: String,
    /// User account ID
    pub user_id: String,
    /// Guild ID
    pub guild_id: String,
    /// When the member joined
    pub joined_at: DateTime<Utc>,
    /// Total connected time in milliseconds
    pub total_time_ms: i64,
}

/// Ordered, paginated member totals.
#[derive(Debug, Clone, Default)]
pub struct MemberRanking {
    /// Members in rank order, after pagination
    pub entries: Vec<MemberTotal>,
    /// Members matching the guild filter before pagination
    pub total_members: usize,
    /// Connection sessions skipped as malformed
    pub malformed: usize,
}

/// Rank members by total connected time, descending.
///
/// Sessions for members outside the filtered set are ignored. Equal
/// totals are ordered by ascending member ID so pages are stable.
pub fn rank_members(
    members: &[GuildMember],
    sessions: &[ConnectionSession],
    query: &MemberQuery,
    now: DateTime<Utc>,
) -> MemberRanking {
    let selected: Vec<&GuildMember> = members
        .iter()
        .filter(|m| {
            query
                .guild_id
                .as_deref()
                .map_or(true, |guild_id| m.guild_id == guild_id)
        })
        .collect();

    let mut by_member: HashMap<&str, Vec<&ConnectionSession>> = selected
        .iter()
        .map(|m| (m.id.as_str(), Vec::new()))
        .collect();
    for session in sessions {
        if let Some(bucket) = by_member.get_mut(session.guild_member_id.as_str()) {
            bucket.push(session);
        }
    }

    let mut malformed = 0;
    let mut totals: Vec<MemberTotal> = selected
        .iter()
        .map(|m| {
            let acc = by_member
                .get(m.id.as_str())
                .map(|bucket| accumulate(bucket.iter().copied(), now))
                .unwrap_or_default();
            malformed += acc.malformed;
            MemberTotal {
                member_id: m.id.clone(),
                nickname: m.nickname.clone(),
                user_id: m.user_id.clone(),
                guild_id: m.guild_id.clone(),
                joined_at: m.joined_at,
                total_time_ms: acc.total_ms,
            }
        })
        .collect();

    totals.sort_by(|a, b| {
        b.total_time_ms
            .cmp(&a.total_time_ms)
            .then_with(|| a.member_id.cmp(&b.member_id))
    });

    let total_members = totals.len();
    let entries = query.page.apply(totals);

    tracing::debug!(
        guild_id = ?query.guild_id,
        total_members,
        returned = entries.len(),
        "Ranked members by connected time"
    );

    MemberRanking {
        entries,
        total_members,
        malformed,
    }
}
