use crate::constants::EARTH_RADIUS_M;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!(
                "Invalid latitude: {} (must be between -90 and 90)",
                lat
            ));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(format!(
                "Invalid longitude: {} (must be between -180 and 180)",
                lon
            ));
        }
        Ok(Coordinate {
            lat,
            lon,
            elevation_m: None,
        })
    }

    pub fn with_elevation(mut self, elevation_m: f64) -> Self {
        self.elevation_m = Some(elevation_m);
        self
    }

    /// Great-circle distance to another coordinate (Haversine), in meters.
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Arrival check: within `epsilon_m` of `other`.
    pub fn is_near(&self, other: &Coordinate, epsilon_m: f64) -> bool {
        self.distance_m(other) <= epsilon_m
    }

    /// Round to decimal places for cache-key bucketing.
    pub fn round(&self, decimal_places: u32) -> Self {
        let multiplier = 10_f64.powi(decimal_places as i32);
        Coordinate {
            lat: (self.lat * multiplier).round() / multiplier,
            lon: (self.lon * multiplier).round() / multiplier,
            elevation_m: self.elevation_m,
        }
    }

    /// Perpendicular distance from this point to a segment, plus the
    /// projection parameter t in [0, 1] along the segment.
    pub fn distance_to_segment(&self, p1: &Coordinate, p2: &Coordinate) -> (f64, f64) {
        let segment_length_sq = p1.distance_m(p2).powi(2);

        if segment_length_sq < 1e-6 {
            return (self.distance_m(p1), 0.0);
        }

        // Projection in lat/lon space; good enough for short segments.
        let dx = p2.lon - p1.lon;
        let dy = p2.lat - p1.lat;
        let t = ((self.lon - p1.lon) * dx + (self.lat - p1.lat) * dy) / (dx * dx + dy * dy);
        let t_clamped = t.clamp(0.0, 1.0);

        let closest = Coordinate {
            lat: p1.lat + t_clamped * dy,
            lon: p1.lon + t_clamped * dx,
            elevation_m: None,
        };

        (self.distance_m(&closest), t_clamped)
    }

    /// Minimum distance from this point to a polyline, in meters.
    pub fn distance_to_path(&self, path: &[Coordinate]) -> Option<f64> {
        if path.len() < 2 {
            return path.first().map(|p| self.distance_m(p));
        }

        let mut min_distance = f64::INFINITY;
        for window in path.windows(2) {
            let (dist, _) = self.distance_to_segment(&window[0], &window[1]);
            if dist < min_distance {
                min_distance = dist;
            }
        }
        Some(min_distance)
    }
}

/// Total length of a polyline, in meters.
pub fn path_length_m(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| w[0].distance_m(&w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(40.0219, -105.3046).is_ok());
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, 181.0).is_err());
    }

    #[test]
    fn test_distance_calculation() {
        let boulder = Coordinate::new(40.0150, -105.2705).unwrap();
        let denver = Coordinate::new(39.7392, -104.9903).unwrap();

        let distance = boulder.distance_m(&denver);
        // Boulder to Denver is roughly 38.5 km
        assert!((distance - 38_500.0).abs() < 2_000.0);
    }

    #[test]
    fn test_arrival_epsilon() {
        let a = Coordinate::new(40.0219, -105.3046).unwrap();
        let b = Coordinate::new(40.02191, -105.30461).unwrap(); // ~1.4 m away
        assert!(a.is_near(&b, 25.0));

        let far = Coordinate::new(40.03, -105.31).unwrap();
        assert!(!a.is_near(&far, 25.0));
    }

    #[test]
    fn test_rounding() {
        let coord = Coordinate::new(40.021934, -105.304617).unwrap();
        let rounded = coord.round(3);
        assert_eq!(rounded.lat, 40.022);
        assert_eq!(rounded.lon, -105.305);
    }

    #[test]
    fn test_distance_to_segment() {
        let p1 = Coordinate::new(40.0200, -105.3000).unwrap();
        let p2 = Coordinate::new(40.0240, -105.3000).unwrap();

        let midpoint = Coordinate::new(40.0220, -105.3000).unwrap();
        let (dist, t) = midpoint.distance_to_segment(&p1, &p2);
        assert!(dist < 10.0, "Midpoint should be on segment");
        assert!((t - 0.5).abs() < 0.05, "Midpoint t should be around 0.5");
    }

    #[test]
    fn test_path_length() {
        let path = vec![
            Coordinate::new(40.0200, -105.3000).unwrap(),
            Coordinate::new(40.0220, -105.3000).unwrap(),
            Coordinate::new(40.0240, -105.3000).unwrap(),
        ];
        let total = path_length_m(&path);
        let direct = path[0].distance_m(&path[2]);
        assert!((total - direct).abs() < 1.0, "Collinear path length equals direct distance");
    }
}
