//! Pure transform from terrain and weather data into per-activity traversal
//! costs and hard constraints. No I/O, no shared state; safe to reuse across
//! simultaneous searches.

use crate::constants::{
    GRADE_PENALTY_WEIGHT, WET_SURFACE_PRECIP_THRESHOLD_MM, WET_UNPAVED_MULTIPLIER,
};
use crate::models::activity::{Activity, ActivityConstraints, Surface};
use crate::models::terrain::{TrafficSnapshot, WeatherSnapshot};
use crate::network::GraphEdge;

#[derive(Debug, Clone, Copy, Default)]
pub struct TerrainCostModel;

impl TerrainCostModel {
    pub fn constraints_for(activity: Activity) -> ActivityConstraints {
        activity.constraints()
    }

    /// Traversal cost of one edge under the given constraints and weather.
    ///
    /// Base distance, scaled by a superlinear grade penalty and a weather
    /// multiplier. Edges with a disallowed surface, a grade beyond
    /// `max_grade`, or footing more technical than the activity's ceiling
    /// cost `f64::INFINITY`, pruning them from any search.
    pub fn edge_cost(
        edge: &GraphEdge,
        constraints: &ActivityConstraints,
        weather: Option<&WeatherSnapshot>,
    ) -> f64 {
        if !constraints.allows_surface(edge.surface)
            || !constraints.allows_grade(edge.grade)
            || edge.surface.technicality() > constraints.technical_difficulty
        {
            return f64::INFINITY;
        }

        let grade_ratio = if constraints.max_grade > 0.0 {
            edge.grade.abs() / constraints.max_grade
        } else {
            0.0
        };
        let grade_factor = 1.0 + GRADE_PENALTY_WEIGHT * grade_ratio * grade_ratio;

        let weather_factor = weather
            .map(|w| Self::weather_multiplier(edge.surface, w))
            .unwrap_or(1.0);

        edge.distance_m * grade_factor * weather_factor
    }

    /// Precipitation makes unpaved surfaces slower and riskier; wind adds a
    /// mild uniform penalty as it approaches the activity-agnostic ceiling.
    fn weather_multiplier(surface: Surface, weather: &WeatherSnapshot) -> f64 {
        let mut factor = 1.0;
        if weather.precip_mm > WET_SURFACE_PRECIP_THRESHOLD_MM && surface != Surface::Paved {
            factor *= WET_UNPAVED_MULTIPLIER;
        }
        if weather.wind_kmh > 30.0 {
            factor *= 1.0 + (weather.wind_kmh - 30.0) / 100.0;
        }
        factor
    }

    /// Hard weather gate: requests are rejected up front when conditions
    /// exceed the activity's limits.
    pub fn weather_within_limits(
        constraints: &ActivityConstraints,
        weather: &WeatherSnapshot,
    ) -> Result<(), String> {
        let limits = &constraints.weather_limits;
        if weather.wind_kmh > limits.max_wind_kmh {
            return Err(format!(
                "wind {:.0} km/h exceeds limit {:.0} km/h",
                weather.wind_kmh, limits.max_wind_kmh
            ));
        }
        if weather.temp_c < limits.min_temp_c {
            return Err(format!(
                "temperature {:.0}C below limit {:.0}C",
                weather.temp_c, limits.min_temp_c
            ));
        }
        if weather.temp_c > limits.max_temp_c {
            return Err(format!(
                "temperature {:.0}C above limit {:.0}C",
                weather.temp_c, limits.max_temp_c
            ));
        }
        Ok(())
    }

    /// Seconds to traverse an edge: base speed adjusted for grade (climbing
    /// slows every self-propelled mode) and, for driving, congestion.
    pub fn edge_duration_s(
        edge: &GraphEdge,
        activity: Activity,
        traffic: Option<&TrafficSnapshot>,
    ) -> f64 {
        let base_speed_ms = activity.base_speed_kmh() / 3.6;

        let grade_slowdown = match activity {
            Activity::Walk | Activity::Ski => 1.0 + 5.0 * edge.grade.max(0.0),
            Activity::Bike => 1.0 + 8.0 * edge.grade.max(0.0),
            Activity::Drive | Activity::Transit => 1.0 + edge.grade.abs(),
        };

        let traffic_slowdown = match (activity, traffic) {
            (Activity::Drive, Some(t)) => 1.0 + 2.0 * t.congestion,
            _ => 1.0,
        };

        edge.distance_m / base_speed_ms * grade_slowdown * traffic_slowdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn edge(distance_m: f64, surface: Surface, grade: f64) -> GraphEdge {
        GraphEdge {
            to: 0,
            distance_m,
            surface,
            grade,
        }
    }

    fn wet_weather() -> WeatherSnapshot {
        WeatherSnapshot {
            temp_c: 10.0,
            wind_kmh: 10.0,
            precip_mm: 3.0,
            visibility_km: 8.0,
            sampled_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn test_disallowed_surface_is_infinite() {
        let bike = Activity::Bike.constraints();
        let rocky = edge(100.0, Surface::Rock, 0.05);
        assert!(TerrainCostModel::edge_cost(&rocky, &bike, None).is_infinite());
    }

    #[test]
    fn test_excessive_grade_is_infinite() {
        let drive = Activity::Drive.constraints();
        let steep = edge(100.0, Surface::Paved, 0.25);
        assert!(TerrainCostModel::edge_cost(&steep, &drive, None).is_infinite());
    }

    #[test]
    fn test_technicality_ceiling_prunes_beyond_skill() {
        // Rock stays in the allowed-surface set but exceeds the lowered
        // technical ceiling; trail does not.
        let mut constraints = Activity::Walk.constraints();
        constraints.technical_difficulty = 2;

        let rocky = edge(100.0, Surface::Rock, 0.05);
        assert!(TerrainCostModel::edge_cost(&rocky, &constraints, None).is_infinite());

        let trail = edge(100.0, Surface::Trail, 0.05);
        assert!(TerrainCostModel::edge_cost(&trail, &constraints, None).is_finite());
    }

    #[test]
    fn test_grade_penalty_is_superlinear() {
        let walk = Activity::Walk.constraints();
        let flat = TerrainCostModel::edge_cost(&edge(100.0, Surface::Trail, 0.0), &walk, None);
        let mild = TerrainCostModel::edge_cost(&edge(100.0, Surface::Trail, 0.10), &walk, None);
        let steep = TerrainCostModel::edge_cost(&edge(100.0, Surface::Trail, 0.20), &walk, None);

        assert!(mild > flat);
        // Doubling the grade more than doubles the added penalty.
        assert!((steep - flat) > 2.0 * (mild - flat));
    }

    #[test]
    fn test_rain_penalizes_unpaved_only() {
        let walk = Activity::Walk.constraints();
        let weather = wet_weather();

        let trail_dry = TerrainCostModel::edge_cost(&edge(100.0, Surface::Trail, 0.0), &walk, None);
        let trail_wet =
            TerrainCostModel::edge_cost(&edge(100.0, Surface::Trail, 0.0), &walk, Some(&weather));
        assert!(trail_wet > trail_dry);

        let paved_dry = TerrainCostModel::edge_cost(&edge(100.0, Surface::Paved, 0.0), &walk, None);
        let paved_wet =
            TerrainCostModel::edge_cost(&edge(100.0, Surface::Paved, 0.0), &walk, Some(&weather));
        assert!((paved_wet - paved_dry).abs() < 1e-9);
    }

    #[test]
    fn test_cost_at_least_distance() {
        // The Haversine heuristic stays admissible because no finite cost
        // is ever below the edge's distance.
        let walk = Activity::Walk.constraints();
        for grade in [0.0, 0.05, 0.15, 0.30] {
            let c = TerrainCostModel::edge_cost(&edge(250.0, Surface::Trail, grade), &walk, None);
            assert!(c >= 250.0);
        }
    }

    #[test]
    fn test_weather_gate() {
        let ski = Activity::Ski.constraints();
        let mut weather = wet_weather();
        assert!(TerrainCostModel::weather_within_limits(&ski, &weather).is_err()); // 10C > 5C max

        weather.temp_c = -5.0;
        assert!(TerrainCostModel::weather_within_limits(&ski, &weather).is_ok());
    }

    #[test]
    fn test_climb_slows_duration() {
        let flat = TerrainCostModel::edge_duration_s(
            &edge(1000.0, Surface::Trail, 0.0),
            Activity::Walk,
            None,
        );
        let climb = TerrainCostModel::edge_duration_s(
            &edge(1000.0, Surface::Trail, 0.15),
            Activity::Walk,
            None,
        );
        assert!(climb > flat);
    }

    #[test]
    fn test_congestion_slows_driving_only() {
        let jam = TrafficSnapshot {
            congestion: 0.8,
            incident_delay_min: 5.0,
            sampled_at: OffsetDateTime::now_utc(),
        };
        let road = edge(1000.0, Surface::Paved, 0.0);
        let free = TerrainCostModel::edge_duration_s(&road, Activity::Drive, None);
        let jammed = TerrainCostModel::edge_duration_s(&road, Activity::Drive, Some(&jam));
        assert!(jammed > free);

        let walk_free = TerrainCostModel::edge_duration_s(&road, Activity::Walk, None);
        let walk_jam = TerrainCostModel::edge_duration_s(&road, Activity::Walk, Some(&jam));
        assert!((walk_free - walk_jam).abs() < 1e-9);
    }
}
