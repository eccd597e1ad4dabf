//! Integration tests for the guildpulse store and analytics pipeline
//!
//! These tests seed a file-backed SQLite database, load a guild snapshot
//! and verify the derived overview end to end.

use chrono::{DateTime, Utc};
use guildpulse_core::analytics::{
    aggregate_activities, build_overview, level_to_color, rank_members, LevelInfo, MemberQuery,
    OverviewSettings, Page, CUSTOM_STATUS_ACTIVITY,
};
use guildpulse_core::{
    ActivitySession, ConnectionSession, Database, Guild, GuildMember, User, VoiceChannel, HOUR_MS,
};
use tempfile::TempDir;

fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

/// Seed one guild with three members, three channels and some activity.
fn seed(db: &Database) {
    db.upsert_guild(&Guild {
        id: "g1".to_string(),
        name: "Night Owls".to_string(),
        icon_url: Some("https://cdn.example/g1.png".to_string()),
        created_at: at(0),
    })
    .unwrap();

    let people = [
        ("u1", "alice", "m1", 0),
        ("u2", "bob", "m2", HOUR_MS),
        ("u3", "carol", "m3", 2 * HOUR_MS),
    ];
    for (user_id, name, member_id, joined) in people {
        db.upsert_user(&User {
            id: user_id.to_string(),
            username: name.to_string(),
            avatar_url: Some(format!("https://cdn.example/{}.png", name)),
        })
        .unwrap();
        db.upsert_guild_member(&GuildMember {
            id: member_id.to_string(),
            guild_id: "g1".to_string(),
            user_id: user_id.to_string(),
            nickname: name.to_string(),
            joined_at: at(joined),
        })
        .unwrap();
    }

    for (id, name) in [("c1", "Lounge"), ("c2", "Games"), ("c3", "AFK")] {
        db.upsert_voice_channel(&VoiceChannel {
            id: id.to_string(),
            guild_id: "g1".to_string(),
            name: name.to_string(),
        })
        .unwrap();
    }

    // alice: 9h closed, bob: 3h closed + open since 10h, carol: nothing
    let connections = [
        ("m1", "c1", 0, Some(5 * HOUR_MS)),
        ("m1", "c1", 6 * HOUR_MS, Some(10 * HOUR_MS)),
        ("m2", "c2", 0, Some(3 * HOUR_MS)),
        ("m2", "c1", 10 * HOUR_MS, None),
    ];
    for (member, channel, start, end) in connections {
        db.insert_connection(&ConnectionSession {
            id: 0,
            guild_member_id: member.to_string(),
            voice_channel_id: channel.to_string(),
            start_time: at(start),
            end_time: end.map(at),
        })
        .unwrap();
    }

    let activities = [
        ("u1", "Chess", 0, Some(2 * HOUR_MS)),
        ("u2", "Chess", 0, Some(HOUR_MS)),
        ("u2", "Factorio", 0, Some(4 * HOUR_MS)),
        ("u3", CUSTOM_STATUS_ACTIVITY, 0, None),
        ("u3", "Tetris", 0, Some(HOUR_MS / 2)),
    ];
    for (user, name, start, end) in activities {
        db.insert_activity(&ActivitySession {
            id: 0,
            user_id: user.to_string(),
            name: name.to_string(),
            start_time: at(start),
            end_time: end.map(at),
        })
        .unwrap();
    }
}

fn open_seeded(dir: &TempDir) -> Database {
    let db = Database::open(&dir.path().join("guildpulse.db")).unwrap();
    db.migrate().unwrap();
    seed(&db);
    db
}

#[test]
fn test_overview_from_store() {
    let dir = TempDir::new().unwrap();
    let db = open_seeded(&dir);
    let snapshot = db.load_snapshot("g1").unwrap();

    let now = at(12 * HOUR_MS);
    let overview = build_overview(&snapshot, &OverviewSettings::default(), now);

    assert_eq!(overview.member_count, 3);
    assert_eq!(overview.connection_count, 4);
    // alice 9h, bob 3h + 2h open = 5h, carol 0
    assert_eq!(overview.total_connected_ms, 14 * HOUR_MS);
    let order: Vec<&str> = overview
        .leaderboard
        .iter()
        .map(|e| e.member.nickname.as_str())
        .collect();
    assert_eq!(order, vec!["alice", "bob", "carol"]);

    let alice = &overview.leaderboard[0];
    assert_eq!(alice.level, LevelInfo::for_time(9 * HOUR_MS));
    assert_eq!(alice.level.level, 4);
    assert_eq!(alice.level.color, level_to_color(4));
    assert_eq!(
        alice.avatar_url.as_deref(),
        Some("https://cdn.example/alice.png")
    );

    // Custom status excluded; Chess 3h, Factorio 4h, Tetris 0.5h
    let names: Vec<&str> = overview
        .top_activities
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["Factorio", "Chess", "Tetris"]);
    assert_eq!(overview.activity_time_ms, 7 * HOUR_MS + HOUR_MS / 2);

    let channels: Vec<(&str, usize)> = overview
        .top_channels
        .iter()
        .map(|c| (c.name.as_str(), c.connection_count))
        .collect();
    assert_eq!(channels, vec![("Lounge", 3), ("Games", 1), ("AFK", 0)]);

    assert_eq!(overview.newest_member.unwrap().nickname, "carol");
}

#[test]
fn test_single_now_keeps_rank_and_level_consistent() {
    let dir = TempDir::new().unwrap();
    let db = open_seeded(&dir);
    let snapshot = db.load_snapshot("g1").unwrap();

    // Far enough in the future that bob's open session overtakes alice.
    let now = at(20 * HOUR_MS);
    let overview = build_overview(&snapshot, &OverviewSettings::default(), now);

    let leader = &overview.leaderboard[0];
    assert_eq!(leader.member.nickname, "bob");
    assert_eq!(leader.member.total_time_ms, 13 * HOUR_MS);
    assert_eq!(leader.level, LevelInfo::for_time(leader.member.total_time_ms));
}

#[test]
fn test_paginated_ranking_from_store() {
    let dir = TempDir::new().unwrap();
    let db = open_seeded(&dir);
    let members = db.list_guild_members(Some("g1")).unwrap();
    let sessions = db.list_connections(Some("g1")).unwrap();

    let query = MemberQuery::guild("g1").with_page(Page::new(1, Some(5)));
    let ranking = rank_members(&members, &sessions, &query, at(12 * HOUR_MS));
    assert_eq!(ranking.total_members, 3);
    assert_eq!(ranking.entries.len(), 2);
    assert_eq!(ranking.entries[0].nickname, "bob");
    assert_eq!(ranking.entries[1].total_time_ms, 0);
}

#[test]
fn test_closed_aggregates_are_repeatable() {
    let dir = TempDir::new().unwrap();
    let db = open_seeded(&dir);
    let closed: Vec<ActivitySession> = db
        .list_guild_activities("g1")
        .unwrap()
        .into_iter()
        .filter(|a| a.end_time.is_some())
        .collect();

    let first = aggregate_activities(&closed, CUSTOM_STATUS_ACTIVITY, Utc::now());
    let second = aggregate_activities(&closed, CUSTOM_STATUS_ACTIVITY, Utc::now());
    assert_eq!(first.totals, second.totals);
    assert_eq!(first.total_time_ms, second.total_time_ms);
}

#[test]
fn test_reopen_keeps_data() {
    let dir = TempDir::new().unwrap();
    {
        open_seeded(&dir);
    }
    let db = Database::open(&dir.path().join("guildpulse.db")).unwrap();
    db.migrate().unwrap();
    assert_eq!(db.list_guild_members(None).unwrap().len(), 3);
}
