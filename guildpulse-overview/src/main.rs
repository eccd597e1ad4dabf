//! guildpulse-overview - engagement overview for one guild
//!
//! Prints the dashboard numbers for a guild: totals, the member
//! leaderboard with levels, top activities and favourite voice channels.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use guildpulse_core::analytics::{
    build_overview, rank_members, GuildOverview, LevelInfo, MemberQuery, MemberTotal,
    OverviewSettings, Page,
};
use guildpulse_core::format::{format_date, format_duration, format_hours, rank_label};
use guildpulse_core::{Config, Database};

#[derive(Parser, Debug)]
#[command(name = "guildpulse-overview")]
#[command(about = "Guild engagement overview")]
#[command(version)]
struct Args {
    /// Guild ID to report on
    #[arg(long, required_unless_present = "user")]
    guild: Option<String>,

    /// List the guilds this username belongs to instead
    #[arg(long, conflicts_with = "guild")]
    user: Option<String>,

    /// Print the full member ranking instead of the overview
    #[arg(long)]
    members: bool,

    /// Members to skip in the ranking (with --members)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    skip: i64,

    /// Maximum members to show in the ranking (with --members)
    #[arg(long, allow_negative_numbers = true)]
    take: Option<i64>,

    /// Export format (md = markdown, json = JSON)
    #[arg(long)]
    export: Option<String>,

    /// Plain output without medals
    #[arg(long)]
    plain: bool,

    /// Database path (default: from config)
    #[arg(long)]
    db: Option<PathBuf>,
}

/// Output format selected by `--export`.
#[derive(Debug, Clone, Copy)]
enum Output {
    Terminal,
    Markdown,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let output = match args.export.as_deref() {
        None => Output::Terminal,
        Some("md") => Output::Markdown,
        Some("json") => Output::Json,
        Some(other) => anyhow::bail!("Unknown export format: {}. Use 'md' or 'json'", other),
    };

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = guildpulse_core::logging::init(&config.logging).ok();

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| config.resolved_database_path());
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to migrate database")?;

    if let Some(username) = &args.user {
        return print_guilds(&db, username, output);
    }

    let guild_id = args
        .guild
        .as_deref()
        .context("--guild is required unless --user is given")?;

    // One instant for every duration in this run.
    let now = Utc::now();
    tracing::info!(guild_id, members = args.members, %now, "Generating guild report");

    if args.members {
        let page = Page::new(args.skip, args.take);
        return print_members(&db, guild_id, page, now, output);
    }

    let snapshot = db
        .load_snapshot(guild_id)
        .with_context(|| format!("failed to load guild {}", guild_id))?;
    let settings = OverviewSettings::from(&config.analytics);
    let overview = build_overview(&snapshot, &settings, now);

    match output {
        Output::Json => println!("{}", overview.to_json()?),
        Output::Markdown => print_markdown(&overview, !args.plain),
        Output::Terminal => print_terminal(&overview, !args.plain),
    }

    Ok(())
}

fn print_guilds(db: &Database, username: &str, output: Output) -> Result<()> {
    let guilds = db
        .list_guilds_for_username(username)
        .context("failed to list guilds")?;

    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(&guilds)?),
        Output::Markdown | Output::Terminal => {
            if guilds.is_empty() {
                println!("None of the servers {} is part of has the bot.", username);
            }
            for guild in &guilds {
                println!("{}  {}", guild.id, guild.name);
            }
        }
    }
    Ok(())
}

fn print_members(
    db: &Database,
    guild_id: &str,
    page: Page,
    now: DateTime<Utc>,
    output: Output,
) -> Result<()> {
    if db.get_guild(guild_id)?.is_none() {
        anyhow::bail!("guild not found: {}", guild_id);
    }

    let members = db.list_guild_members(Some(guild_id))?;
    let sessions = db.list_connections(Some(guild_id))?;
    let ranking = rank_members(
        &members,
        &sessions,
        &MemberQuery::guild(guild_id).with_page(page),
        now,
    );

    let rows: Vec<(usize, &MemberTotal, LevelInfo)> = ranking
        .entries
        .iter()
        .enumerate()
        .map(|(i, m)| (page.skip + i + 1, m, LevelInfo::for_time(m.total_time_ms)))
        .collect();

    match output {
        Output::Json => {
            let json = serde_json::json!({
                "guild_id": guild_id,
                "computed_at": now,
                "total_members": ranking.total_members,
                "skip": page.skip,
                "members": rows.iter().map(|(rank, m, level)| serde_json::json!({
                    "rank": rank,
                    "member": m,
                    "level": level,
                })).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Output::Markdown => {
            println!("| Rank | Member | Time | Level | Progress |");
            println!("|------|--------|------|-------|----------|");
            for (rank, m, level) in &rows {
                println!(
                    "| {} | {} | {} | {} | {}% |",
                    rank,
                    m.nickname,
                    format_duration(m.total_time_ms),
                    level.level,
                    level.progress_percent
                );
            }
        }
        Output::Terminal => {
            for (rank, m, level) in &rows {
                println!(
                    "   {:>4} {:<24} {:>10}  lvl {:>3} ({:>2}%)",
                    format!("{}.", rank),
                    m.nickname,
                    format_duration(m.total_time_ms),
                    level.level,
                    level.progress_percent
                );
            }
            println!();
            println!("   {} of {} members", rows.len(), ranking.total_members);
        }
    }
    Ok(())
}

fn print_terminal(overview: &GuildOverview, medals: bool) {
    let title = format!("{} OVERVIEW", overview.guild.name.to_uppercase());

    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", title);
    println!("╰{}╯", "─".repeat(60));
    println!();

    println!("SUMMARY");
    println!(
        "   Members:     {:<12} Connections: {}",
        overview.member_count, overview.connection_count
    );
    println!(
        "   Time spent:  {:<12} Activities:  {}",
        format_hours(overview.total_connected_ms),
        format_hours(overview.activity_time_ms)
    );
    println!(
        "   Created at:  {}",
        format_date(overview.guild.created_at)
    );
    if let Some(newest) = &overview.newest_member {
        println!(
            "   Newest:      {} (joined {})",
            newest.nickname,
            format_date(newest.joined_at)
        );
    }
    println!();

    if overview.member_count == 0 {
        println!("  No members found for this guild.");
        println!();
        return;
    }

    println!("LEADERBOARD");
    for entry in &overview.leaderboard {
        println!(
            "   {:<4} {:<24} lvl {:>3}  {:>3}%  {}",
            rank_label(entry.rank, medals),
            entry.member.nickname,
            entry.level.level,
            entry.level.progress_percent,
            entry.level.color
        );
    }
    println!();

    if !overview.top_activities.is_empty() {
        println!("MOST COMMON ACTIVITIES");
        for (i, activity) in overview.top_activities.iter().enumerate() {
            println!(
                "   {:<4} {:<24} {:>8}",
                rank_label(i + 1, medals),
                activity.name,
                format_hours(activity.total_time_ms)
            );
        }
        println!();
    }

    if !overview.top_channels.is_empty() {
        println!("FAVOURITE VOICE CHANNELS");
        for (i, channel) in overview.top_channels.iter().enumerate() {
            println!(
                "   {:<4} {:<24} {:>6} connections",
                rank_label(i + 1, medals),
                channel.name,
                channel.connection_count
            );
        }
        println!();
    }

    if overview.malformed_sessions > 0 {
        println!(
            "   Note: {} session(s) end before they start and were ignored.",
            overview.malformed_sessions
        );
        println!();
    }
}

fn print_markdown(overview: &GuildOverview, medals: bool) {
    println!("# {} Overview", overview.guild.name);
    println!();

    println!("## Summary");
    println!();
    println!("| Metric | Value |");
    println!("|--------|-------|");
    println!("| Members | {} |", overview.member_count);
    println!("| Connections | {} |", overview.connection_count);
    println!(
        "| Total time spent | {} |",
        format_hours(overview.total_connected_ms)
    );
    println!(
        "| Time spent on activities | {} |",
        format_hours(overview.activity_time_ms)
    );
    println!("| Created at | {} |", format_date(overview.guild.created_at));
    if let Some(newest) = &overview.newest_member {
        println!("| Newest member | {} |", newest.nickname);
    }
    println!();

    if !overview.leaderboard.is_empty() {
        println!("## Leaderboard");
        println!();
        for entry in &overview.leaderboard {
            println!(
                "{} **{}** - level {} ({}% to next)",
                rank_label(entry.rank, medals),
                entry.member.nickname,
                entry.level.level,
                entry.level.progress_percent
            );
        }
        println!();
    }

    if !overview.top_activities.is_empty() {
        println!("## Most Common Activities");
        println!();
        for (i, activity) in overview.top_activities.iter().enumerate() {
            println!(
                "{} **{}** - {}",
                rank_label(i + 1, medals),
                activity.name,
                format_hours(activity.total_time_ms)
            );
        }
        println!();
    }

    if !overview.top_channels.is_empty() {
        println!("## Favourite Voice Channels");
        println!();
        for (i, channel) in overview.top_channels.iter().enumerate() {
            println!(
                "{} **{}** - {} connections",
                rank_label(i + 1, medals),
                channel.name,
                channel.connection_count
            );
        }
        println!();
    }

    println!("---");
    println!(
        "*Generated by guildpulse-overview at {}*",
        overview.computed_at.to_rfc3339()
    );
}
