use crate::{
    climate::Climate, db::ClimateData, index_handler, precipitation, stations,
    temperature_between, temperature_from, tobs, ClimateAccess,
};
use anyhow::anyhow;
use axum::{
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
    Router,
};
use hyper::{header::ACCEPT, Method};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub remote_url: String,
    pub climate: Arc<Climate>,
}

/// Opens the climate database and resolves the derived values served by the API.
///
/// Any failure here means the database is unusable and the server must not start.
pub async fn build_app_state(remote_url: String, database: String) -> Result<AppState, anyhow::Error> {
    let climate_db = ClimateAccess::new(&database)
        .await
        .map_err(|e| anyhow!("error setting up climate database: {}", e))?;

    let measurements = climate_db.measurement_count().await?;
    let station_count = climate_db.station_count().await?;
    info!(
        "Climate database holds {} measurements from {} stations",
        measurements, station_count
    );

    build_state_from_data(remote_url, Arc::new(climate_db)).await
}

pub async fn build_state_from_data(
    remote_url: String,
    climate_data: Arc<dyn ClimateData>,
) -> Result<AppState, anyhow::Error> {
    let climate = Climate::load(climate_data)
        .await
        .map_err(|e| anyhow!("error loading climate summary: {}", e))?;

    Ok(AppState {
        remote_url,
        climate: Arc::new(climate),
    })
}

pub fn app(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([ACCEPT])
        .allow_origin(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/precipitation", get(precipitation))
        .route("/stations", get(stations))
        .route("/tobs", get(tobs))
        .route("/{start}", get(temperature_from))
        .route("/{start}/{end}", get(temperature_between))
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default()
        .to_owned();
    info!(target: "http_request", "new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, code: {}, path: {}, time: {}", response.status().as_str(), path, response_time);

    response
}
