use thiserror::Error;

use crate::browser::BrowserError;

/// Errors raised while reading a board. They never leave the scraper.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("stop marker has no name label")]
    MissingStopName,
}
