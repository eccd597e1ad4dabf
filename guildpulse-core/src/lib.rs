//! # guildpulse-core
//!
//! Core library for guildpulse - engagement analytics for communities
//! tracked by a voice/activity bot.
//!
//! This library provides:
//! - Domain types for guilds, members, voice channels and sessions
//! - Aggregation, ranking and leveling over raw session intervals
//! - A SQLite store adapter
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows one way:
//! - **Raw:** connection and activity sessions (start, optional end)
//! - **Totals:** per-member, per-activity and per-channel aggregates
//! - **Derived:** levels, progress and colors for member totals
//!
//! Nothing derived is persisted. Every query recomputes from raw rows
//! against a single `now` captured by the caller.
//!
//! ## Example
//!
//! ```rust,no_run
//! use guildpulse_core::analytics::{build_overview, OverviewSettings};
//! use guildpulse_core::{Config, Database};
//!
//! let config = Config::load().expect("failed to load config");
//! let db = Database::open(&config.resolved_database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let snapshot = db.load_snapshot("1234").expect("failed to load guild");
//! let settings = OverviewSettings::from(&config.analytics);
//! let overview = build_overview(&snapshot, &settings, chrono::Utc::now());
//! println!("{} members", overview.member_count);
//! ```

// Re-export commonly used items at the crate root
pub use analytics::GuildSnapshot;
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod types;
