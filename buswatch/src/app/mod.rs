//! Application bootstrap and lifecycle management.
//!
//! [`BusWatchApp`] turns an [`AppConfig`] into running loops:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        BusWatchApp                       │
//! │                                                          │
//! │  1. StopRegistry::load (fatal on error)                  │
//! │  2. PollScheduler<LineScraper<WebDriverBrowser>> ──┐     │
//! │                                                   spawn  │
//! │  3. ChangeWatcher<SnapshotStore, DiscordNotifier> ─┘     │
//! │                                                          │
//! │  shared CancellationToken ──► both loops                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use buswatch::app::{AppConfig, AppMode, BusWatchApp};
//!
//! let app = BusWatchApp::start(config, AppMode::Run, credential).await?;
//! let token = app.shutdown_token();
//! // ... on Ctrl+C: token.cancel()
//! app.wait().await;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::{build_scheduler, build_watcher, load_registry, BusWatchApp};
pub use config::{AppConfig, AppMode};
pub use error::AppError;

/// Environment variable holding the notification bot token.
pub const CREDENTIAL_ENV_VAR: &str = "DISCORD_BOT_TOKEN";

/// Read the bot token from the environment. Empty counts as unset.
pub fn credential_from_env() -> Option<String> {
    std::env::var(CREDENTIAL_ENV_VAR)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
