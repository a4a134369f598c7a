//! Geo distance.

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle (haversine) distance in meters between two
/// `(lat, lon)` points given in degrees.
pub fn haversine_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat_a, lon_a) = a;
    let (lat_b, lon_b) = b;

    let d_lat = (lat_b - lat_a).to_radians();
    let d_lon = (lon_b - lon_a).to_radians();
    let lat1 = lat_a.to_radians();
    let lat2 = lat_b.to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_for_same_point() {
        assert_eq!(0.0, haversine_m((52.0, 13.0), (52.0, 13.0)));
    }

    #[test]
    fn nearby_points() {
        // roughly 5.6m north, 2.1m east
        let d = haversine_m((52.0, 13.0), (52.00005, 13.00003));
        assert!(d > 5.0 && d < 7.0, "got {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_m((0.0, 0.0), (1.0, 0.0));
        assert!((d - 111_195.0).abs() < 1.0, "got {d}");
    }

    #[test]
    fn symmetric() {
        let a = (48.8566, 2.3522);
        let b = (51.5074, -0.1278);
        assert_eq!(haversine_m(a, b), haversine_m(b, a));
    }
}
