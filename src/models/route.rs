use crate::constants::MAX_WAYPOINTS;
use crate::models::activity::{Activity, Surface};
use crate::models::coordinates::Coordinate;
use crate::models::terrain::ConditionsSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// The single objective a request optimizes against. Multi-objective
/// blending is deliberately unsupported; callers pick one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    #[default]
    Distance,
    Time,
    Elevation,
    Scenic,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::Distance => write!(f, "distance"),
            Objective::Time => write!(f, "time"),
            Objective::Elevation => write!(f, "elevation"),
            Objective::Scenic => write!(f, "scenic"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutePreferences {
    #[serde(default)]
    pub objective: Objective,
    /// Elevation objective: soft cap on total climb (meters).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_gain_m: Option<f64>,
    /// Multi-modal: modes the caller is willing to use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_modes: Option<Vec<Activity>>,
    /// Multi-modal: require wheelchair-accessible connections.
    #[serde(default)]
    pub accessible_only: bool,
}

impl Default for RoutePreferences {
    fn default() -> Self {
        RoutePreferences {
            objective: Objective::Distance,
            preferred_gain_m: None,
            allowed_modes: None,
            accessible_only: false,
        }
    }
}

/// How trustworthy the returned data is, given provider health during
/// computation. Anything other than `Fresh` means some input was served
/// from a failover tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResultQuality {
    #[default]
    Fresh,
    Cached,
    Fallback,
    Degraded,
}

impl ResultQuality {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, ResultQuality::Fresh)
    }

    /// The worse of two qualities; used when aggregating across provider calls.
    pub fn worst(self, other: ResultQuality) -> ResultQuality {
        fn rank(q: ResultQuality) -> u8 {
            match q {
                ResultQuality::Fresh => 0,
                ResultQuality::Cached => 1,
                ResultQuality::Fallback => 2,
                ResultQuality::Degraded => 3,
            }
        }
        if rank(self) >= rank(other) {
            self
        } else {
            other
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Hard,
    Expert,
}

/// A finalized, single-activity slice of a route. Never mutated after
/// assembly; the chain invariant (end == next start) is checked when
/// `RouteMetrics` is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteSegment {
    pub start: Coordinate,
    pub end: Coordinate,
    pub activity: Activity,
    pub distance_m: f64,
    pub duration_s: f64,
    pub ascent_m: f64,
    pub descent_m: f64,
    /// Geometry of the segment, start to end inclusive.
    pub path: Vec<Coordinate>,
    /// Surface -> meters traveled on it.
    pub surfaces: Vec<(Surface, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ConditionsSnapshot>,
    /// Nearby escape points (network nodes touching paved ground).
    #[serde(default)]
    pub bailouts: Vec<Coordinate>,
}

impl RouteSegment {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_s.max(0.0))
    }
}

/// Aggregate output of the engine. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteMetrics {
    pub id: Uuid,
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub ascent_m: f64,
    pub descent_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_elevation_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_elevation_m: Option<f64>,
    /// Surface -> percentage of total distance (0..100).
    pub surface_breakdown: Vec<(Surface, f64)>,
    pub difficulty: Difficulty,
    /// Confidence in the optimization transform's refinement (0..1).
    pub confidence: f64,
    pub quality: ResultQuality,
    pub segments: Vec<RouteSegment>,
}

impl RouteMetrics {
    /// Assemble metrics from a contiguous segment chain. Validates the
    /// chain invariant and derives all aggregates from the segments.
    pub fn from_segments(
        segments: Vec<RouteSegment>,
        difficulty: Difficulty,
        confidence: f64,
        quality: ResultQuality,
        epsilon_m: f64,
    ) -> Result<Self, String> {
        if segments.is_empty() {
            return Err("route has no segments".to_string());
        }
        for pair in segments.windows(2) {
            if !pair[0].end.is_near(&pair[1].start, epsilon_m) {
                return Err(format!(
                    "segment chain broken: ({:.5}, {:.5}) -> ({:.5}, {:.5})",
                    pair[0].end.lat, pair[0].end.lon, pair[1].start.lat, pair[1].start.lon
                ));
            }
        }

        let total_distance_m = segments.iter().map(|s| s.distance_m).sum();
        let total_duration_s = segments.iter().map(|s| s.duration_s).sum();
        let ascent_m = segments.iter().map(|s| s.ascent_m).sum();
        let descent_m = segments.iter().map(|s| s.descent_m).sum();

        let elevations: Vec<f64> = segments
            .iter()
            .flat_map(|s| s.path.iter().filter_map(|c| c.elevation_m))
            .collect();
        let max_elevation_m = elevations.iter().copied().fold(None, |acc: Option<f64>, e| {
            Some(acc.map_or(e, |a| a.max(e)))
        });
        let min_elevation_m = elevations.iter().copied().fold(None, |acc: Option<f64>, e| {
            Some(acc.map_or(e, |a| a.min(e)))
        });

        let surface_breakdown = surface_percentages(&segments, total_distance_m);

        Ok(RouteMetrics {
            id: Uuid::new_v4(),
            total_distance_m,
            total_duration_s,
            ascent_m,
            descent_m,
            max_elevation_m,
            min_elevation_m,
            surface_breakdown,
            difficulty,
            confidence,
            quality,
            segments,
        })
    }
}

fn surface_percentages(segments: &[RouteSegment], total_m: f64) -> Vec<(Surface, f64)> {
    use std::collections::BTreeMap;

    if total_m <= 0.0 {
        return Vec::new();
    }
    let mut by_surface: BTreeMap<Surface, f64> = BTreeMap::new();
    for segment in segments {
        for (surface, meters) in &segment.surfaces {
            *by_surface.entry(*surface).or_insert(0.0) += meters;
        }
    }
    by_surface
        .into_iter()
        .map(|(s, m)| (s, m / total_m * 100.0))
        .collect()
}

// Request/Response types for API endpoints

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    pub activity: Activity,
    #[serde(default)]
    pub preferences: RoutePreferences,
    #[serde(default)]
    pub waypoints: Vec<Coordinate>,
}

impl RouteRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.waypoints.len() > MAX_WAYPOINTS {
            return Err(format!("At most {} waypoints allowed", MAX_WAYPOINTS));
        }
        if self.start.distance_m(&self.end) < 1.0 && self.waypoints.is_empty() {
            return Err("start and end are the same point".to_string());
        }
        if let Some(gain) = self.preferences.preferred_gain_m {
            if gain < 0.0 {
                return Err("preferred_gain_m must be non-negative".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct MultiModalRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    #[serde(default)]
    pub preferences: RoutePreferences,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub route: RouteMetrics,
}

#[derive(Debug, Serialize)]
pub struct MultiModalResponse {
    pub segments: Vec<RouteSegment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: (f64, f64), end: (f64, f64), distance_m: f64) -> RouteSegment {
        let start = Coordinate::new(start.0, start.1).unwrap();
        let end = Coordinate::new(end.0, end.1).unwrap();
        RouteSegment {
            start,
            end,
            activity: Activity::Walk,
            distance_m,
            duration_s: distance_m / 1.4,
            ascent_m: 10.0,
            descent_m: 5.0,
            path: vec![start, end],
            surfaces: vec![(Surface::Trail, distance_m)],
            conditions: None,
            bailouts: vec![],
        }
    }

    #[test]
    fn test_metrics_totals_match_segment_sums() {
        let segments = vec![
            seg((40.0200, -105.3000), (40.0220, -105.3000), 222.0),
            seg((40.0220, -105.3000), (40.0240, -105.3000), 222.0),
        ];
        let metrics = RouteMetrics::from_segments(
            segments,
            Difficulty::Easy,
            1.0,
            ResultQuality::Fresh,
            25.0,
        )
        .unwrap();

        assert!((metrics.total_distance_m - 444.0).abs() < 1e-9);
        assert!((metrics.ascent_m - 20.0).abs() < 1e-9);
        assert_eq!(metrics.surface_breakdown.len(), 1);
        assert!((metrics.surface_breakdown[0].1 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_broken_chain_rejected() {
        let segments = vec![
            seg((40.0200, -105.3000), (40.0220, -105.3000), 222.0),
            // Gap of ~1.1 km to the next start
            seg((40.0320, -105.3000), (40.0340, -105.3000), 222.0),
        ];
        let result = RouteMetrics::from_segments(
            segments,
            Difficulty::Easy,
            1.0,
            ResultQuality::Fresh,
            25.0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_quality_worst() {
        assert_eq!(
            ResultQuality::Fresh.worst(ResultQuality::Degraded),
            ResultQuality::Degraded
        );
        assert_eq!(
            ResultQuality::Cached.worst(ResultQuality::Fresh),
            ResultQuality::Cached
        );
        assert!(!ResultQuality::Fresh.is_degraded());
        assert!(ResultQuality::Fallback.is_degraded());
    }

    #[test]
    fn test_request_validation() {
        let start = Coordinate::new(40.0219, -105.3046).unwrap();
        let end = Coordinate::new(40.0243, -105.3070).unwrap();

        let req = RouteRequest {
            start,
            end,
            activity: Activity::Walk,
            preferences: RoutePreferences::default(),
            waypoints: vec![],
        };
        assert!(req.validate().is_ok());

        let degenerate = RouteRequest {
            start,
            end: start,
            activity: Activity::Walk,
            preferences: RoutePreferences::default(),
            waypoints: vec![],
        };
        assert!(degenerate.validate().is_err());
    }
}
