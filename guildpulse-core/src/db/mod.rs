//! Database layer for guildpulse
//!
//! The bot owns and writes these tables; this crate reads them to feed
//! the analytics. Provides:
//! - Schema migrations
//! - Repository pattern for queries

pub mod repo;
pub mod schema;

pub use repo::Database;
