//! Rendering/automation abstraction used by the line scraper.
//!
//! The scraper only needs a handful of capabilities from a browser: open a
//! page, wait for a selector, scroll, and read element geometry, text and
//! attributes. These traits capture exactly that, so the scraper can be
//! driven by a real WebDriver session or by an in-memory fake in tests.
//!
//! # Session ownership
//!
//! A [`BoardSession`] is owned by a single scrape task. It is acquired via
//! [`BoardBrowser::open_session`] before navigation and must be released
//! with [`BoardSession::close`] on every exit path.
//!
//! # Dyn Compatibility
//!
//! Methods return [`BoxFuture`] rather than using `async fn` so that the
//! futures are `Send` and can be driven from spawned tasks.

mod webdriver;

pub use webdriver::{WebDriverBrowser, WebDriverElement, WebDriverSession, DEFAULT_WEBDRIVER_URL};

use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

/// Errors raised by a browser session or element.
#[derive(Debug, Clone, Error)]
pub enum BrowserError {
    /// Transport failure talking to the automation backend.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The backend rejected a command.
    #[error("{error}: {message}")]
    Command { error: String, message: String },

    /// The backend answered with something we could not interpret.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Factory for browser sessions.
pub trait BoardBrowser: Send + Sync {
    type Session: BoardSession;

    /// Start a new, independent session.
    fn open_session(&self) -> BoxFuture<'_, Result<Self::Session, BrowserError>>;
}

/// A live browser session owned by one scrape task.
pub trait BoardSession: Send + Sync {
    type Element: BoardElement;

    /// Navigate to `url`.
    fn open<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), BrowserError>>;

    /// Wait until at least one element matches `selector`.
    ///
    /// Returns `Ok(false)` if nothing matched before `timeout` elapsed.
    fn wait_for_selector<'a>(
        &'a self,
        selector: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<bool, BrowserError>>;

    /// Scroll the document to its bottom so lazily rendered content appears.
    fn scroll_to_bottom(&self) -> BoxFuture<'_, Result<(), BrowserError>>;

    /// All elements in the document matching a CSS selector.
    fn find_all<'a>(
        &'a self,
        selector: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Self::Element>, BrowserError>>;

    /// End the session and release its backend resources.
    fn close(self) -> BoxFuture<'static, Result<(), BrowserError>>
    where
        Self: Sized;
}

/// An element handle inside a session.
pub trait BoardElement: Send + Sync + Sized {
    /// Vertical page offset of the element.
    fn vertical_position(&self) -> BoxFuture<'_, Result<f64, BrowserError>>;

    /// Rendered text content.
    fn text(&self) -> BoxFuture<'_, Result<String, BrowserError>>;

    /// Attribute value, or `None` if the attribute is absent.
    fn attribute<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, BrowserError>>;

    /// Descendants of this element matching a CSS selector.
    fn find_all<'a>(
        &'a self,
        selector: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Self>, BrowserError>>;
}
