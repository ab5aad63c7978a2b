//! Raw observations produced by the line scraper.
//!
//! These types are ephemeral: a [`LineObservations`] is built by one scrape
//! call, handed to the position matcher, and dropped.

/// A configured bus line and the board identifier used to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLine {
    /// Line name as it appears in the stop registry (e.g. "系統01").
    pub name: String,

    /// Course identifier substituted into the board URL template.
    pub course_id: String,
}

impl BoardLine {
    pub fn new(name: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            course_id: course_id.into(),
        }
    }
}

/// What a marker on the board represents.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind {
    /// A bus slot. Only slots showing the "bus present" image hold a bus.
    Bus { has_bus_image: bool },

    /// A stop row with its printed name.
    Stop { stop_name: String },
}

/// A positioned element read from a rendered operation board.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerObservation {
    pub line: String,

    /// Vertical page offset of the element, in CSS pixels.
    pub vertical_position: f64,

    pub kind: MarkerKind,
}

impl MarkerObservation {
    pub fn bus(line: impl Into<String>, vertical_position: f64, has_bus_image: bool) -> Self {
        Self {
            line: line.into(),
            vertical_position,
            kind: MarkerKind::Bus { has_bus_image },
        }
    }

    pub fn stop(
        line: impl Into<String>,
        vertical_position: f64,
        stop_name: impl Into<String>,
    ) -> Self {
        Self {
            line: line.into(),
            vertical_position,
            kind: MarkerKind::Stop {
                stop_name: stop_name.into(),
            },
        }
    }

    /// True for a bus marker showing the "bus present" image.
    pub fn has_bus_image(&self) -> bool {
        matches!(
            self.kind,
            MarkerKind::Bus {
                has_bus_image: true
            }
        )
    }

    /// The stop name, for stop markers.
    pub fn stop_name(&self) -> Option<&str> {
        match &self.kind {
            MarkerKind::Stop { stop_name } => Some(stop_name),
            MarkerKind::Bus { .. } => None,
        }
    }
}

/// Everything one scrape of one line produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineObservations {
    pub line: String,
    pub bus_markers: Vec<MarkerObservation>,
    pub stop_markers: Vec<MarkerObservation>,
}

impl LineObservations {
    /// Observations for a line that yielded nothing this cycle.
    pub fn empty(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bus_markers.is_empty() && self.stop_markers.is_empty()
    }
}
