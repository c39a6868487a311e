//! Great-circle distance and geofence proximity evaluation.
//!
//! Everything here is pure: no I/O, no clock, no shared state. The watcher
//! calls [`evaluate`] once per accepted position with the registry contents
//! it holds at that moment.

use crate::types::{Coordinate, GeofenceRegion, Position};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two coordinates.
///
/// ```rust
/// use lunexis_geo_core::proximity::haversine_distance;
/// use lunexis_geo_core::Coordinate;
///
/// let sf = Coordinate::new(37.7749, -122.4194);
/// assert_eq!(haversine_distance(sf, sf), 0.0);
/// ```
#[must_use]
pub fn haversine_distance(from: Coordinate, to: Coordinate) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let delta_phi = (to.latitude - from.latitude).to_radians();
    let delta_lambda = (to.longitude - from.longitude).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

    // Rounding can push `a` a hair outside [0, 1] for antipodal points.
    let a = a.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Distance in meters from a position to a region's center.
#[must_use]
pub fn distance_to_region(position: &Position, region: &GeofenceRegion) -> f64 {
    haversine_distance(position.coordinate(), region.center())
}

/// Whether the position lies inside the region. The boundary counts as inside.
#[must_use]
pub fn is_inside(position: &Position, region: &GeofenceRegion) -> bool {
    distance_to_region(position, region) <= region.radius
}

/// Returns the regions triggered by `position`, preserving the input order.
#[must_use]
pub fn evaluate(position: &Position, regions: &[GeofenceRegion]) -> Vec<GeofenceRegion> {
    regions
        .iter()
        .filter(|region| is_inside(position, region))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    const SF_LAT: f64 = 37.7749;
    const SF_LON: f64 = -122.4194;

    fn position_at(latitude: f64, longitude: f64) -> Position {
        Position {
            latitude,
            longitude,
            accuracy: 5.0,
            altitude: None,
            heading: None,
            speed: None,
            timestamp: Utc::now(),
        }
    }

    fn home() -> GeofenceRegion {
        GeofenceRegion::new("home", SF_LAT, SF_LON, 100.0)
    }

    /// Latitude offset in degrees that corresponds to `meters` due north.
    fn north_by(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_METERS).to_degrees()
    }

    #[test]
    fn test_same_point_triggers_home() {
        let triggered = evaluate(&position_at(SF_LAT, SF_LON), &[home()]);
        let ids: Vec<&str> = triggered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["home"]);
    }

    #[test]
    fn test_five_km_away_triggers_nothing() {
        let position = position_at(SF_LAT + north_by(5000.0), SF_LON);
        let distance = distance_to_region(&position, &home());
        assert!((distance - 5000.0).abs() < 1.0, "distance was {distance}");
        assert!(evaluate(&position, &[home()]).is_empty());
    }

    #[test]
    fn test_known_distance_sf_to_la() {
        let sf = Coordinate::new(SF_LAT, SF_LON);
        let la = Coordinate::new(34.0522, -118.2437);
        let d = haversine_distance(sf, la);
        // ~559 km
        assert!((d - 559_120.0).abs() < 1_000.0, "distance was {d}");
    }

    #[test]
    fn test_antipodal_points_are_half_circumference() {
        let d = haversine_distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        let half = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half).abs() < 1e-3);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let position = position_at(SF_LAT + north_by(250.0), SF_LON);
        let exact = distance_to_region(&position, &home());
        let region = GeofenceRegion::new("edge", SF_LAT, SF_LON, exact);
        assert!(is_inside(&position, &region));

        let shrunk = GeofenceRegion::new("edge", SF_LAT, SF_LON, exact * 0.999);
        assert!(!is_inside(&position, &shrunk));
    }

    #[test]
    fn test_evaluate_preserves_order() {
        let regions = vec![
            GeofenceRegion::new("c", SF_LAT, SF_LON, 10.0),
            GeofenceRegion::new("far", 0.0, 0.0, 10.0),
            GeofenceRegion::new("a", SF_LAT, SF_LON, 20.0),
            GeofenceRegion::new("b", SF_LAT, SF_LON, 30.0),
        ];
        let triggered = evaluate(&position_at(SF_LAT, SF_LON), &regions);
        let ids: Vec<&str> = triggered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_evaluate_empty_registry() {
        assert!(evaluate(&position_at(SF_LAT, SF_LON), &[]).is_empty());
    }

    fn coordinate_strategy() -> impl Strategy<Value = Coordinate> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| Coordinate::new(lat, lon))
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric(a in coordinate_strategy(), b in coordinate_strategy()) {
            let ab = haversine_distance(a, b);
            let ba = haversine_distance(b, a);
            prop_assert!((ab - ba).abs() < 1e-6, "ab={} ba={}", ab, ba);
        }

        #[test]
        fn prop_self_distance_is_zero(a in coordinate_strategy()) {
            prop_assert_eq!(haversine_distance(a, a), 0.0);
        }

        #[test]
        fn prop_distance_is_bounded(a in coordinate_strategy(), b in coordinate_strategy()) {
            let d = haversine_distance(a, b);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_METERS + 1e-6);
        }

        #[test]
        fn prop_triggered_iff_within_radius(
            p in coordinate_strategy(),
            c in coordinate_strategy(),
            radius in 1.0f64..20_000_000.0,
        ) {
            let position = position_at(p.latitude, p.longitude);
            let region = GeofenceRegion::new("r", c.latitude, c.longitude, radius);
            let triggered = evaluate(&position, std::slice::from_ref(&region));
            let within = haversine_distance(p, c) <= radius;
            prop_assert_eq!(triggered.len() == 1, within);
        }
    }
}
