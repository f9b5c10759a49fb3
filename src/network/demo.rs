//! Compiled-in demo dataset: a small Boulder foothills network used when no
//! `NETWORK_PATH` is configured, and by the integration tests.

use crate::models::activity::{Activity, Surface};
use crate::models::coordinates::Coordinate;
use crate::models::transit::{TransitCatalog, TransitConnection};
use crate::network::{NetworkBuilder, RouteNetwork};
use time::macros::time;

fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).expect("demo coordinates are valid")
}

/// Trailhead used by examples and tests.
pub const TRAILHEAD: (f64, f64) = (40.0219, -105.3046);
/// Overlook used by examples and tests.
pub const OVERLOOK: (f64, f64) = (40.0243, -105.3070);

/// A foothills trail network west of Boulder: a main singletrack between the
/// trailhead and the overlook, a gravel service-road alternative, a steep
/// shortcut, a rock spur to a viewpoint, and paved road access on both ends.
pub fn network() -> RouteNetwork {
    let mut b = NetworkBuilder::new();

    // Main singletrack, trailhead to overlook
    let trailhead = b.add_node(coord(TRAILHEAD.0, TRAILHEAD.1));
    let switchback = b.add_node(coord(40.0230, -105.3040));
    let saddle = b.add_node(coord(40.0236, -105.3058));
    let overlook = b.add_node(coord(OVERLOOK.0, OVERLOOK.1));

    b.connect(trailhead, switchback, Surface::Trail, 0.08);
    b.connect(switchback, saddle, Surface::Trail, 0.10);
    b.connect(saddle, overlook, Surface::Trail, 0.06);

    // Steep direct shortcut; fine on foot, too steep for bikes
    b.connect(switchback, overlook, Surface::Trail, 0.30);

    // Gravel service road looping north, gentler but longer
    let road_fork = b.add_node(coord(40.0224, -105.3020));
    let road_bend = b.add_node(coord(40.0248, -105.3035));
    b.connect(trailhead, road_fork, Surface::Gravel, 0.03);
    b.connect(road_fork, road_bend, Surface::Gravel, 0.04);
    b.connect(road_bend, overlook, Surface::Gravel, 0.05);

    // Rock spur to the crag viewpoint
    let crag = b.add_node(coord(40.0240, -105.3063));
    b.connect(saddle, crag, Surface::Rock, 0.15);
    b.connect(crag, overlook, Surface::Rock, 0.12);

    // Paved access: parking lot at the trailhead, canyon road near the overlook
    let parking = b.add_node(coord(40.0212, -105.3040));
    let canyon_road = b.add_node(coord(40.0250, -105.3078));
    b.connect(parking, trailhead, Surface::Paved, 0.02);
    b.connect(canyon_road, overlook, Surface::Paved, 0.03);
    b.connect(parking, road_fork, Surface::Paved, 0.01);

    b.add_viewpoint("Crag Overlook", coord(40.0241, -105.3062), 0.9);
    b.add_viewpoint("Meadow View", coord(40.0247, -105.3036), 0.6);

    b.build()
}

/// Transit reference data matching [`network`]: a shuttle between the
/// parking lot and the canyon road.
pub fn transit_catalog() -> TransitCatalog {
    TransitCatalog::new(vec![TransitConnection {
        name: "Canyon Shuttle".to_string(),
        from: coord(40.0212, -105.3040),
        to: coord(40.0250, -105.3078),
        mode: Activity::Transit,
        frequency_min: 20.0,
        first_departure: time!(06:00),
        last_departure: time!(21:00),
        capacity: 30,
        wheelchair_accessible: true,
    }])
}
