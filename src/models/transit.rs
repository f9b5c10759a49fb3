use crate::models::activity::Activity;
use crate::models::coordinates::Coordinate;
use serde::{Deserialize, Serialize};
use time::Time;

/// A scheduled single-mode link between two stops. Read-only reference data;
/// the catalog is reloaded on its own cadence, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitConnection {
    pub name: String,
    pub from: Coordinate,
    pub to: Coordinate,
    pub mode: Activity,
    /// Minutes between departures.
    pub frequency_min: f64,
    pub first_departure: Time,
    pub last_departure: Time,
    pub capacity: u32,
    pub wheelchair_accessible: bool,
}

impl TransitConnection {
    pub fn distance_m(&self) -> f64 {
        self.from.distance_m(&self.to)
    }

    /// Expected wait plus ride time, in seconds. Wait is half the headway.
    pub fn expected_duration_s(&self) -> f64 {
        let ride_s = self.distance_m() / (self.mode.base_speed_kmh() / 3.6);
        let wait_s = self.frequency_min * 60.0 / 2.0;
        wait_s + ride_s
    }

    pub fn operates_at(&self, t: Time) -> bool {
        if self.first_departure <= self.last_departure {
            t >= self.first_departure && t <= self.last_departure
        } else {
            // Overnight service wraps midnight
            t >= self.first_departure || t <= self.last_departure
        }
    }
}

/// All known transit connections, loaded once and shared by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitCatalog {
    pub connections: Vec<TransitConnection>,
}

impl TransitCatalog {
    pub fn new(connections: Vec<TransitConnection>) -> Self {
        TransitCatalog { connections }
    }

    /// Connections boardable within `radius_m` of `point`.
    pub fn reachable_from<'a>(
        &'a self,
        point: &'a Coordinate,
        radius_m: f64,
    ) -> impl Iterator<Item = &'a TransitConnection> {
        self.connections
            .iter()
            .filter(move |c| c.from.distance_m(point) <= radius_m)
    }
}
