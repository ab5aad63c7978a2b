//! Position matcher: assigns each running bus to its nearest known stop.
//!
//! The board lays out bus slots and stop rows along one vertical axis, so a
//! bus is "at" whichever stop row is vertically closest to its slot.
//!
//! For every bus marker showing the bus image:
//!
//! 1. measure `|bus.y - stop.y|` to every stop marker of the same line
//! 2. pick the minimum; on a tie the first stop in scan order wins
//! 3. look up `(line, stop name)` in the registry; unknown stops are dropped
//!
//! Markers without the bus image never produce output.

use tracing::debug;

use crate::model::{LineObservations, MarkerObservation};
use crate::registry::StopRegistry;
use crate::snapshot::MatchedBusPosition;

/// Match every running bus of a line to a registered stop.
///
/// Output order follows the bus markers' scan order.
pub fn match_positions(
    observations: &LineObservations,
    registry: &StopRegistry,
) -> Vec<MatchedBusPosition> {
    let mut matched = Vec::new();

    for bus in observations
        .bus_markers
        .iter()
        .filter(|marker| marker.has_bus_image())
    {
        let Some(stop_name) = nearest_stop(bus, &observations.stop_markers)
            .and_then(MarkerObservation::stop_name)
        else {
            debug!(line = %bus.line, y = bus.vertical_position, "No stop markers to match against");
            continue;
        };

        match registry.lookup(&bus.line, stop_name) {
            Some(record) => {
                debug!(
                    line = %bus.line,
                    stop = %record.stop_name,
                    lat = record.latitude,
                    lon = record.longitude,
                    "Running bus located"
                );
                matched.push(MatchedBusPosition::from(record));
            }
            None => debug!(
                line = %bus.line,
                stop = %stop_name,
                "No stop match in registry"
            ),
        }
    }

    matched
}

/// The stop marker vertically closest to `bus`, restricted to the bus's line.
///
/// Ties resolve to the earliest stop marker in `stops`.
pub fn nearest_stop<'a>(
    bus: &MarkerObservation,
    stops: &'a [MarkerObservation],
) -> Option<&'a MarkerObservation> {
    let mut best: Option<(&MarkerObservation, f64)> = None;

    for stop in stops
        .iter()
        .filter(|stop| stop.line == bus.line && stop.stop_name().is_some())
    {
        let distance = (bus.vertical_position - stop.vertical_position).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ if distance.is_nan() => {}
            _ => best = Some((stop, distance)),
        }
    }

    best.map(|(stop, _)| stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StopRecord;
    use proptest::prelude::*;

    fn registry() -> StopRegistry {
        StopRegistry::from_records(vec![
            StopRecord::new("L1", "A", 1.0, 1.0),
            StopRecord::new("L1", "B", 2.0, 2.0),
        ])
    }

    fn observations(
        bus: Vec<MarkerObservation>,
        stops: Vec<MarkerObservation>,
    ) -> LineObservations {
        LineObservations {
            line: "L1".to_string(),
            bus_markers: bus,
            stop_markers: stops,
        }
    }

    #[test]
    fn test_bus_matches_closest_stop() {
        let obs = observations(
            vec![MarkerObservation::bus("L1", 100.0, true)],
            vec![
                MarkerObservation::stop("L1", 98.0, "A"),
                MarkerObservation::stop("L1", 150.0, "B"),
            ],
        );

        let matched = match_positions(&obs, &registry());

        assert_eq!(
            matched,
            vec![MatchedBusPosition {
                line: "L1".to_string(),
                stop_name: "A".to_string(),
                latitude: 1.0,
                longitude: 1.0,
            }]
        );
    }

    #[test]
    fn test_marker_without_bus_image_is_excluded() {
        let obs = observations(
            vec![MarkerObservation::bus("L1", 98.0, false)],
            vec![MarkerObservation::stop("L1", 98.0, "A")],
        );

        assert!(match_positions(&obs, &registry()).is_empty());
    }

    #[test]
    fn test_unregistered_stop_is_dropped() {
        let obs = observations(
            vec![
                MarkerObservation::bus("L1", 10.0, true),
                MarkerObservation::bus("L1", 150.0, true),
            ],
            vec![
                MarkerObservation::stop("L1", 12.0, "Depot"),
                MarkerObservation::stop("L1", 150.0, "B"),
            ],
        );

        let matched = match_positions(&obs, &registry());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].stop_name, "B");
    }

    #[test]
    fn test_unregistered_nearest_does_not_fall_back_to_farther_stop() {
        // "A" is registered but farther; the nearest stop wins even when unknown.
        let obs = observations(
            vec![MarkerObservation::bus("L1", 100.0, true)],
            vec![
                MarkerObservation::stop("L1", 90.0, "A"),
                MarkerObservation::stop("L1", 101.0, "Depot"),
            ],
        );

        assert!(match_positions(&obs, &registry()).is_empty());
    }

    #[test]
    fn test_registry_lookup_is_per_line() {
        let registry = StopRegistry::from_records(vec![StopRecord::new("L2", "A", 5.0, 5.0)]);
        let obs = observations(
            vec![MarkerObservation::bus("L1", 0.0, true)],
            vec![MarkerObservation::stop("L1", 0.0, "A")],
        );

        assert!(match_positions(&obs, &registry).is_empty());
    }

    #[test]
    fn test_no_stop_markers_yields_nothing() {
        let obs = observations(vec![MarkerObservation::bus("L1", 0.0, true)], vec![]);
        assert!(match_positions(&obs, &registry()).is_empty());
    }

    #[test]
    fn test_no_bus_markers_yields_nothing() {
        let obs = observations(vec![], vec![MarkerObservation::stop("L1", 0.0, "A")]);
        assert!(match_positions(&obs, &registry()).is_empty());
    }

    #[test]
    fn test_tie_goes_to_first_stop_in_scan_order() {
        let bus = MarkerObservation::bus("L1", 100.0, true);
        let stops = vec![
            MarkerObservation::stop("L1", 110.0, "B"),
            MarkerObservation::stop("L1", 90.0, "A"),
        ];

        assert_eq!(nearest_stop(&bus, &stops).unwrap().stop_name(), Some("B"));
    }

    #[test]
    fn test_several_buses_keep_scan_order() {
        let obs = observations(
            vec![
                MarkerObservation::bus("L1", 150.0, true),
                MarkerObservation::bus("L1", 99.0, true),
            ],
            vec![
                MarkerObservation::stop("L1", 98.0, "A"),
                MarkerObservation::stop("L1", 150.0, "B"),
            ],
        );

        let names: Vec<_> = match_positions(&obs, &registry())
            .into_iter()
            .map(|p| p.stop_name)
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_nan_position_is_never_nearest() {
        let bus = MarkerObservation::bus("L1", 100.0, true);
        let stops = vec![
            MarkerObservation::stop("L1", f64::NAN, "A"),
            MarkerObservation::stop("L1", 500.0, "B"),
        ];

        assert_eq!(nearest_stop(&bus, &stops).unwrap().stop_name(), Some("B"));
    }

    proptest! {
        #[test]
        fn prop_nearest_stop_minimizes_distance(
            bus_y in -10_000.0f64..10_000.0,
            stop_ys in prop::collection::hash_set(-10_000i32..10_000, 1..20),
        ) {
            let bus = MarkerObservation::bus("L1", bus_y, true);
            let stops: Vec<_> = stop_ys
                .iter()
                .enumerate()
                .map(|(i, y)| MarkerObservation::stop("L1", f64::from(*y), format!("S{}", i)))
                .collect();

            let chosen = nearest_stop(&bus, &stops).unwrap();
            let chosen_distance = (bus_y - chosen.vertical_position).abs();

            for stop in &stops {
                prop_assert!(chosen_distance <= (bus_y - stop.vertical_position).abs());
            }
        }
    }
}
