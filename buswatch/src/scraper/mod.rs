//! Line scraper: renders one line's operation board and reads its markers.
//!
//! # Flow
//!
//! ```text
//! open session ─► navigate ─► wait for .busArea ──(timeout)──► empty result
//!                                   │
//!                                   ▼
//!                     scroll to bottom + settle delay
//!                                   │
//!                                   ▼
//!               read .busArea markers + .pointArea markers
//!                                   │
//!                                   ▼
//!                             close session
//! ```
//!
//! A failure on a single marker skips that marker only. A failure of the
//! session itself (cannot open, cannot navigate) yields empty observations
//! for the line. The session is closed on every path.

mod config;
mod error;

pub use config::{
    ScraperConfig, DEFAULT_BOARD_URL_TEMPLATE, DEFAULT_RENDER_TIMEOUT, DEFAULT_SETTLE_DELAY,
};
pub use error::ScrapeError;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::browser::{BoardBrowser, BoardElement, BoardSession};
use crate::model::{BoardLine, LineObservations, MarkerObservation};

/// Container of a bus slot on the board.
pub const BUS_AREA_SELECTOR: &str = ".busArea";

/// Container of a stop row on the board.
pub const POINT_AREA_SELECTOR: &str = ".pointArea";

/// Images inside a bus slot.
pub const BUS_IMAGE_SELECTOR: &str = "div.image > img";

/// Stop name label inside a stop row.
pub const STOP_NAME_SELECTOR: &str = ".busstopName";

/// Image source fragment shown when a bus occupies the slot.
pub const BUS_IMAGE_MARKER: &str = "busOperation.png";

/// Source of per-line observations for the poll scheduler.
///
/// Implementations must never fail: anything that goes wrong for a line is
/// reported as empty observations for that line.
pub trait LineSource: Send + Sync + 'static {
    fn observe<'a>(&'a self, line: &'a BoardLine) -> BoxFuture<'a, LineObservations>;
}

/// Scrapes operation boards through a [`BoardBrowser`].
pub struct LineScraper<B: BoardBrowser> {
    browser: B,
    config: ScraperConfig,
}

impl<B: BoardBrowser> LineScraper<B> {
    pub fn new(browser: B, config: ScraperConfig) -> Self {
        Self { browser, config }
    }

    /// Scrape one line. Never fails; problems are logged and produce empty
    /// observations.
    pub async fn scrape(&self, line: &BoardLine) -> LineObservations {
        let url = self.config.board_url(line);
        info!(line = %line.name, url = %url, "Scanning operation board");

        let session = match self.browser.open_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(line = %line.name, error = %e, "Failed to open browser session");
                return LineObservations::empty(&line.name);
            }
        };

        let result = self.read_board(&session, line, &url).await;

        if let Err(e) = session.close().await {
            warn!(line = %line.name, error = %e, "Failed to close browser session");
        }

        match result {
            Ok(observations) => observations,
            Err(e) => {
                warn!(line = %line.name, error = %e, "Line scrape failed");
                LineObservations::empty(&line.name)
            }
        }
    }

    async fn read_board(
        &self,
        session: &B::Session,
        line: &BoardLine,
        url: &str,
    ) -> Result<LineObservations, ScrapeError> {
        session.open(url).await?;

        let rendered = session
            .wait_for_selector(BUS_AREA_SELECTOR, self.config.render_timeout)
            .await?;
        if !rendered {
            warn!(
                line = %line.name,
                timeout_secs = self.config.render_timeout.as_secs(),
                "Bus area did not render before timeout"
            );
            return Ok(LineObservations::empty(&line.name));
        }

        session.scroll_to_bottom().await?;
        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }

        let bus_areas = session.find_all(BUS_AREA_SELECTOR).await?;
        let point_areas = session.find_all(POINT_AREA_SELECTOR).await?;
        debug!(
            line = %line.name,
            bus_areas = bus_areas.len(),
            point_areas = point_areas.len(),
            "Board rendered"
        );

        let mut observations = LineObservations::empty(&line.name);

        for (index, element) in bus_areas.iter().enumerate() {
            match read_bus_marker(&line.name, element).await {
                Ok(marker) => observations.bus_markers.push(marker),
                Err(e) => warn!(
                    line = %line.name,
                    index,
                    error = %e,
                    "Skipping unreadable bus marker"
                ),
            }
        }

        for (index, element) in point_areas.iter().enumerate() {
            match read_stop_marker(&line.name, element).await {
                Ok(marker) => observations.stop_markers.push(marker),
                Err(e) => warn!(
                    line = %line.name,
                    index,
                    error = %e,
                    "Skipping unreadable stop marker"
                ),
            }
        }

        Ok(observations)
    }
}

impl<B: BoardBrowser + 'static> LineSource for LineScraper<B> {
    fn observe<'a>(&'a self, line: &'a BoardLine) -> BoxFuture<'a, LineObservations> {
        Box::pin(self.scrape(line))
    }
}

async fn read_bus_marker<E: BoardElement>(
    line: &str,
    element: &E,
) -> Result<MarkerObservation, ScrapeError> {
    let vertical_position = element.vertical_position().await?;

    let mut has_bus_image = false;
    for image in element.find_all(BUS_IMAGE_SELECTOR).await? {
        if let Some(src) = image.attribute("src").await? {
            if src.contains(BUS_IMAGE_MARKER) {
                has_bus_image = true;
                break;
            }
        }
    }

    Ok(MarkerObservation::bus(line, vertical_position, has_bus_image))
}

async fn read_stop_marker<E: BoardElement>(
    line: &str,
    element: &E,
) -> Result<MarkerObservation, ScrapeError> {
    let vertical_position = element.vertical_position().await?;

    let label = element
        .find_all(STOP_NAME_SELECTOR)
        .await?
        .into_iter()
        .next()
        .ok_or(ScrapeError::MissingStopName)?;
    let stop_name = label.text().await?.trim().to_string();

    Ok(MarkerObservation::stop(line, vertical_position, stop_name))
}
