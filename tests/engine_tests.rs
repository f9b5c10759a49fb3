use std::sync::atomic::Ordering;
use std::sync::Arc;
use wayfinder::config::ResilienceConfig;
use wayfinder::error::RouteError;
use wayfinder::models::activity::{Activity, Surface};
use wayfinder::models::route::{
    MultiModalRequest, ResultQuality, RoutePreferences, RouteRequest,
};
use wayfinder::models::TransitCatalog;
use wayfinder::network::demo;
use wayfinder::network::NetworkBuilder;

mod common;
use common::{coord, demo_engine, demo_engine_with_terrain, FailingTerrain};

fn hike_request() -> RouteRequest {
    RouteRequest {
        start: coord(demo::TRAILHEAD.0, demo::TRAILHEAD.1),
        end: coord(demo::OVERLOOK.0, demo::OVERLOOK.1),
        activity: Activity::Walk,
        preferences: RoutePreferences::default(),
        waypoints: vec![],
    }
}

/// The foothills scenario: a hike from the trailhead to the overlook should
/// follow the main singletrack, whose length is the crow-flight distance
/// scaled by the terrain's tortuosity (about 1.3 here).
#[tokio::test]
async fn test_foothills_hike_follows_the_main_trail() {
    let engine = demo_engine();
    let request = hike_request();
    let metrics = engine.calculate_route(&request).await.unwrap();

    let crow_m = request.start.distance_m(&request.end);
    let expected_m = crow_m * 1.3;
    let deviation = (metrics.total_distance_m - expected_m).abs() / expected_m;
    assert!(
        deviation < 0.05,
        "distance {:.0} m should be within 5% of {:.0} m",
        metrics.total_distance_m,
        expected_m
    );

    for (surface, _) in &metrics.surface_breakdown {
        assert!(
            matches!(surface, Surface::Trail | Surface::Gravel | Surface::Rock),
            "hike stays off paved roads, got {surface}"
        );
    }
    assert!(metrics.ascent_m > 0.0);
    assert!(metrics.total_duration_s > 0.0);
    assert_eq!(metrics.quality, ResultQuality::Fresh);
}

/// A terrain outage must not fail the route: the breaker opens after the
/// configured threshold, later lookups short-circuit without an upstream
/// call, and the result is served at degraded quality.
#[tokio::test]
async fn test_terrain_outage_degrades_quality_and_trips_breaker() {
    let terrain = Arc::new(FailingTerrain::default());
    let resilience = ResilienceConfig {
        failure_threshold: 2,
        max_retries: 0,
        ..Default::default()
    };
    let engine = demo_engine_with_terrain(terrain.clone(), resilience);

    let metrics = engine.calculate_route(&hike_request()).await.unwrap();
    assert_eq!(metrics.quality, ResultQuality::Degraded);

    // Elevation enrichment samples more than two points, but only the first
    // two reach the provider before the breaker opens.
    assert_eq!(terrain.calls.load(Ordering::SeqCst), 2);

    let open = engine
        .providers()
        .circuit_snapshots()
        .into_iter()
        .find(|c| c.dependency == "terrain")
        .unwrap();
    assert_eq!(open.state, wayfinder::resilience::CircuitState::Open);
}

#[tokio::test]
async fn test_transit_activity_stitches_a_journey() {
    let engine = demo_engine();
    let request = RouteRequest {
        start: coord(40.0212, -105.3040),
        end: coord(40.0250, -105.3078),
        activity: Activity::Transit,
        preferences: RoutePreferences::default(),
        waypoints: vec![],
    };
    let metrics = engine.calculate_route(&request).await.unwrap();
    assert!(!metrics.segments.is_empty());
    let last = metrics.segments.last().unwrap();
    assert!(last.end.is_near(&request.end, 25.0));
}

#[tokio::test]
async fn test_multimodal_dead_end_between_unbridged_regions() {
    // Two islands with no edges or transit between them.
    let mut b = NetworkBuilder::new();
    let a = b.add_node(coord(40.0000, -105.3000));
    let a2 = b.add_node(coord(40.0010, -105.3000));
    b.connect(a, a2, Surface::Paved, 0.0);
    let c = b.add_node(coord(40.0000, -105.2500));
    let c2 = b.add_node(coord(40.0010, -105.2500));
    b.connect(c, c2, Surface::Paved, 0.0);
    let network = b.build();

    let providers = wayfinder::providers::ProviderHub::new(
        Arc::new(wayfinder::providers::synthetic::SyntheticTerrain),
        Arc::new(wayfinder::providers::synthetic::SyntheticWeather),
        Arc::new(wayfinder::providers::synthetic::SyntheticTraffic),
        ResilienceConfig::default(),
    );
    let engine = wayfinder::engine::RouteEngine::new(
        Arc::new(network),
        Arc::new(TransitCatalog::default()),
        Arc::new(providers),
        wayfinder::config::EngineConfig::default(),
    );

    let err = engine
        .optimize_multi_modal(&MultiModalRequest {
            start: coord(40.0000, -105.3000),
            end: coord(40.0000, -105.2500),
            preferences: RoutePreferences::default(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RouteError::NoViableContinuation(_)));
}

#[tokio::test]
async fn test_repeated_requests_are_deterministic() {
    let engine = demo_engine();
    let request = hike_request();
    let first = engine.calculate_route(&request).await.unwrap();
    for _ in 0..3 {
        let again = engine.calculate_route(&request).await.unwrap();
        assert_eq!(first.segments[0].path, again.segments[0].path);
        assert!((first.total_distance_m - again.total_distance_m).abs() < 1e-9);
    }
}
