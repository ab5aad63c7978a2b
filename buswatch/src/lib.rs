//! buswatch - Bus position tracking from rendered operation boards
//!
//! This library scrapes a bus operator's live operation board, infers which
//! stop each running bus is at, persists a timestamped snapshot, and watches
//! that snapshot to notify a chat channel when a bus reaches a target stop.
//!
//! # Architecture
//!
//! ```text
//! StopRegistry ──┐
//!                ▼
//! LineScraper ──► match_positions ──► PollScheduler ──► snapshot file
//!  (per line)                                               │
//!                                                           ▼
//!                                  Notifier ◄── ChangeWatcher
//! ```
//!
//! The scheduler and the watcher are independent loops. They share nothing
//! in-process; the snapshot file is their only point of contact.

pub mod app;
pub mod browser;
pub mod config;
pub mod http;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod notify;
pub mod registry;
pub mod scheduler;
pub mod scraper;
pub mod snapshot;
pub mod watcher;

/// Crate version, used in the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
