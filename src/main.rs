use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfinder::cache::RouteCacheService;
use wayfinder::config::Config;
use wayfinder::constants::DEFAULT_CACHE_MAX_ENTRIES;
use wayfinder::engine::RouteEngine;
use wayfinder::network::{demo, RouteNetwork};
use wayfinder::providers::http::{TerrainApiClient, TrafficApiClient, WeatherApiClient};
use wayfinder::providers::synthetic::{SyntheticTerrain, SyntheticTraffic, SyntheticWeather};
use wayfinder::providers::{ProviderHub, TerrainProvider, TrafficProvider, WeatherProvider};
use wayfinder::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfinder=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting Wayfinder route engine");

    // Load the routable network: a serialized region if configured, the
    // compiled-in demo region otherwise.
    let network = match &config.network_path {
        Some(path) => {
            tracing::info!("Loading network from {}", path);
            Arc::new(RouteNetwork::from_json_file(path)?)
        }
        None => {
            tracing::info!("NETWORK_PATH not configured. Using the demo network.");
            Arc::new(demo::network())
        }
    };
    tracing::info!(nodes = network.nodes().len(), "Network loaded");
    let transit = Arc::new(demo::transit_catalog());

    // External providers: real HTTP clients where configured, synthetic
    // stand-ins otherwise.
    let api_key = config.provider_api_key.clone().unwrap_or_default();
    let terrain: Arc<dyn TerrainProvider> = match &config.terrain_api_url {
        Some(url) => Arc::new(TerrainApiClient::new(url.clone(), api_key.clone())),
        None => {
            tracing::info!("TERRAIN_API_URL not configured. Using synthetic terrain.");
            Arc::new(SyntheticTerrain)
        }
    };
    let weather: Arc<dyn WeatherProvider> = match &config.weather_api_url {
        Some(url) => Arc::new(WeatherApiClient::new(url.clone(), api_key.clone())),
        None => {
            tracing::info!("WEATHER_API_URL not configured. Using synthetic weather.");
            Arc::new(SyntheticWeather)
        }
    };
    let traffic: Arc<dyn TrafficProvider> = match &config.traffic_api_url {
        Some(url) => Arc::new(TrafficApiClient::new(url.clone(), api_key)),
        None => {
            tracing::info!("TRAFFIC_API_URL not configured. Using synthetic traffic.");
            Arc::new(SyntheticTraffic)
        }
    };

    let providers = Arc::new(
        ProviderHub::new(terrain, weather, traffic, config.resilience.clone())
            .with_terrain_alternate(Arc::new(SyntheticTerrain)),
    );

    let engine = Arc::new(RouteEngine::new(
        network,
        transit,
        providers,
        config.engine.clone(),
    ));

    let state = Arc::new(AppState {
        engine,
        route_cache: RouteCacheService::new(config.route_cache_ttl, DEFAULT_CACHE_MAX_ENTRIES),
    });

    // Build router with CORS and tracing
    let app = Router::new()
        .nest("/api/v1", wayfinder::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
