pub mod activity;
pub mod coordinates;
pub mod route;
pub mod terrain;
pub mod transit;

pub use activity::{Activity, ActivityConstraints, Surface, WeatherLimits};
pub use coordinates::{path_length_m, Coordinate};
pub use route::{
    Difficulty, MultiModalRequest, MultiModalResponse, Objective, ResultQuality, RouteMetrics,
    RoutePreferences, RouteRequest, RouteResponse, RouteSegment,
};
pub use terrain::{ConditionsSnapshot, Hazard, TerrainSample, TrafficSnapshot, WeatherSnapshot};
pub use transit::{TransitCatalog, TransitConnection};
